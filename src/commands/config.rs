use anyhow::bail;
use artifactory_client::config::settings::Config;
use std::io::{self, Write};
use std::path::Path;

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        bail!(
            "Configuration file already exists at `{}`\nDelete or rename it before creating a new one.",
            config_path.display()
        );
    }

    println!("\nArtifactory client configuration setup:");
    println!("Press ENTER to use the default value (shown in brackets)\n");

    let server_url = prompt("Server URL", "https://artifactory.example.com")?;
    let base_path = prompt_optional("Base path (e.g. artifactory)")?;

    let mut config = Config {
        server_url,
        base_path,
        ..Config::default()
    };

    loop {
        match prompt("Authentication [none/basic/apikey/token]", "none")?.as_str() {
            "none" => break,
            "basic" => {
                config.user = Some(prompt_required("User")?);
                config.apikey = Some(prompt_required("API key")?);
                break;
            }
            "apikey" => {
                config.apikey = Some(prompt_required("API key")?);
                break;
            }
            "token" => {
                config.token = Some(prompt_required("Access token")?);
                break;
            }
            _ => println!("Invalid input, please try again."),
        }
    }

    config.validate()?;
    config.save_to_file(config_path)?;

    println!(
        "\nConfiguration file created at `{}`",
        config_path.display()
    );
    Ok(())
}

fn read_line(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(input.trim().to_string())
}

fn prompt(field: &str, default: &str) -> io::Result<String> {
    let input = read_line(&format!("{} [{}]", field, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_optional(field: &str) -> io::Result<Option<String>> {
    let input = read_line(&format!("{} []", field))?;
    Ok(Some(input).filter(|value| !value.is_empty()))
}

fn prompt_required(field: &str) -> io::Result<String> {
    loop {
        let input = read_line(field)?;
        if !input.is_empty() {
            return Ok(input);
        }
        println!("A value is required.");
    }
}
