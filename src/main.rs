use clap::{Parser, Subcommand};
use std::path::PathBuf;
mod commands;

#[derive(Parser)]
#[command(name = "artifactory")]
#[command(
    about = "A client for Artifactory-style binary repositories",
    long_about = r#"
        Browse, inspect, download and upload artifacts on an Artifactory-style server.
        Connection settings are read from a toml file (see `artifactory config`) and
        can be overridden with ARTIFACTORY_URL, ARTIFACTORY_USER, ARTIFACTORY_APIKEY
        and ARTIFACTORY_TOKEN.
    "#
)]
struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logs
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a configuration file interactively
    Config,
    /// Show the server version
    Version,
    /// List all repositories
    Repos,
    /// List a directory
    Ls {
        path: String,
        #[arg(long, short = 'r')]
        recursive: bool,
        /// Fetch file and download statistics for every entry
        #[arg(long)]
        stat: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the storage metadata of a path
    Stat {
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the download statistics of a path
    Downloads {
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Search files with a `<repo>/<pattern>` glob
    Search { pattern: String },
    /// Print a remote file as text
    Cat { path: String },
    /// Download a single file
    Get {
        path: String,
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,
        /// Download even if the local file exists
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Download a folder recursively
    GetFolder {
        path: String,
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,
    },
    /// Upload files (or every file below a directory) into a remote directory
    Put {
        remote_dir: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Upload even if the remote checksum matches
        #[arg(long)]
        no_hash: bool,
    },
    /// Create a remote directory
    Mkdir {
        path: String,
        #[arg(long, short = 'p')]
        exist_ok: bool,
    },
    /// Remove a remote directory
    Rmdir { path: String },
    /// Remove a remote file
    Rm { path: String },
    /// Check whether a remote path exists
    Exists { path: String },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let config_path = cli
        .config
        .unwrap_or_else(artifactory_client::config::settings::Config::locate);

    let result = rt.block_on(async {
        match cli.command {
            Commands::Config => commands::config::run(&config_path).await,
            Commands::Version => commands::browse::version(&config_path).await,
            Commands::Repos => commands::browse::repos(&config_path).await,
            Commands::Ls {
                path,
                recursive,
                stat,
                json,
            } => commands::browse::ls(&config_path, &path, recursive, stat, json).await,
            Commands::Stat { path, json } => commands::browse::stat(&config_path, &path, json).await,
            Commands::Downloads { path, json } => {
                commands::browse::downloads(&config_path, &path, json).await
            }
            Commands::Search { pattern } => commands::browse::search(&config_path, &pattern).await,
            Commands::Cat { path } => commands::browse::cat(&config_path, &path).await,
            Commands::Get {
                path,
                output,
                force,
            } => commands::transfer::get(&config_path, &path, &output, force).await,
            Commands::GetFolder { path, output } => {
                commands::transfer::get_folder(&config_path, &path, &output).await
            }
            Commands::Put {
                remote_dir,
                files,
                no_hash,
            } => commands::transfer::put(&config_path, &remote_dir, &files, !no_hash).await,
            Commands::Mkdir { path, exist_ok } => {
                commands::manage::mkdir(&config_path, &path, exist_ok).await
            }
            Commands::Rmdir { path } => commands::manage::rmdir(&config_path, &path).await,
            Commands::Rm { path } => commands::manage::rm(&config_path, &path).await,
            Commands::Exists { path } => commands::manage::exists(&config_path, &path).await,
        }
    });

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
