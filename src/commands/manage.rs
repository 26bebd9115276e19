use super::connect;
use std::path::Path;

pub async fn mkdir(config_path: &Path, path: &str, exist_ok: bool) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    client.make_directory(path, exist_ok).await?;

    log::info!("[MKDIR] {}", path);
    Ok(())
}

pub async fn rmdir(config_path: &Path, path: &str) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    client.remove_directory(path).await?;

    log::info!("[RMDIR] {}", path);
    Ok(())
}

pub async fn rm(config_path: &Path, path: &str) -> anyhow::Result<()> {
    let client = connect(config_path)?;
    client.remove_file(path).await?;

    log::info!("[RM] {}", path);
    Ok(())
}

// exit status follows the answer, like `test -e`
pub async fn exists(config_path: &Path, path: &str) -> anyhow::Result<()> {
    let client = connect(config_path)?;

    if client.path_exists(path).await {
        println!("{} exists", path);
        Ok(())
    } else {
        println!("{} does not exist", path);
        std::process::exit(1);
    }
}
