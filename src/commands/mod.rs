pub mod browse;
pub mod config;
pub mod manage;
pub mod transfer;

use anyhow::Context;
use artifactory_client::api::client::RepositoryClient;
use artifactory_client::config::settings::{Config, ConfigError, ENV_URL};
use std::path::Path;

/// Builds a client from the configuration file, with environment overrides applied.
/// Without a file the environment alone is enough when it names the server.
pub fn connect(config_path: &Path) -> anyhow::Result<RepositoryClient> {
    let config = match Config::from_file(config_path) {
        Ok(config) => config,
        Err(ConfigError::NotFound(_)) if std::env::var_os(ENV_URL).is_some() => Config::default(),
        Err(e) => return Err(e.into()),
    }
    .with_env_overrides();
    let client_config = config.client_config()?;

    log::debug!("[CONFIG] Server: {}", config.server_url);

    RepositoryClient::new(&client_config)
        .with_context(|| format!("Failed to create client for {}", config.server_url))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
