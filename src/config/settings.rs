use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_URL: &str = "ARTIFACTORY_URL";
pub const ENV_USER: &str = "ARTIFACTORY_USER";
pub const ENV_APIKEY: &str = "ARTIFACTORY_APIKEY";
pub const ENV_TOKEN: &str = "ARTIFACTORY_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("\nNo configuration file found at `{}`.\nRun `artifactory config` to create one.", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to write config file: {0}")]
    FileWrite(std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// How the client authenticates. Exactly one mode is active at a time.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    Anonymous,
    Basic {
        user: String,
        apikey: String,
    },
    ApiKey(String),
    Bearer(String),
}

// never print secrets
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("apikey", &"<hidden>")
                .finish(),
            Credentials::ApiKey(_) => f.write_str("ApiKey(<hidden>)"),
            Credentials::Bearer(_) => f.write_str("Bearer(<hidden>)"),
        }
    }
}

/// Construction input of `RepositoryClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme-qualified server URL, e.g. `https://artifacts.example.com`.
    pub base_url: String,
    /// Optional path prefix appended to `base_url`, e.g. `artifactory`.
    pub base_path: Option<String>,
    pub credentials: Credentials,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            base_path: None,
            credentials: Credentials::Anonymous,
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// On-disk configuration of the command line tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub server_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apikey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Config {
    pub fn default_path() -> &'static Path {
        Path::new("artifactory.toml")
    }

    /// `<user config dir>/artifactory/artifactory.toml`
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("artifactory").join(Self::default_path()))
    }

    /// The file in the working directory wins over the per-user one.
    /// Falls back to the working directory path when neither exists.
    pub fn locate() -> PathBuf {
        let local = Self::default_path();
        if local.exists() {
            return local.to_path_buf();
        }

        Self::user_path()
            .filter(|path| path.exists())
            .unwrap_or_else(|| local.to_path_buf())
    }

    // load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    // save actual configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ConfigError::FileWrite)?;
        }
        fs::write(path, content).map_err(ConfigError::FileWrite)?;

        Ok(())
    }

    /// Overrides file values with the `ARTIFACTORY_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            self.server_url = url;
        }
        if let Some(user) = lookup(ENV_USER) {
            self.user = Some(user);
        }
        if let Some(apikey) = lookup(ENV_APIKEY) {
            self.apikey = Some(apikey);
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.is_empty() {
            return Err(ConfigError::Validation(
                "Server URL cannot be empty".to_string(),
            ));
        }

        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "Server URL must start with http:// or https://: {}",
                self.server_url
            )));
        }

        if self.apikey.is_some() && self.token.is_some() {
            return Err(ConfigError::Validation(
                "Set either `apikey` or `token`, not both".to_string(),
            ));
        }

        if self.user.is_some() && self.apikey.is_none() {
            return Err(ConfigError::Validation(
                "`user` is only used together with `apikey`".to_string(),
            ));
        }

        Ok(())
    }

    /// `user`+`apikey` is Basic auth, `apikey` alone the API key header, `token` a bearer token.
    pub fn credentials(&self) -> Credentials {
        match (&self.user, &self.apikey, &self.token) {
            (Some(user), Some(apikey), _) => Credentials::Basic {
                user: user.clone(),
                apikey: apikey.clone(),
            },
            (_, Some(apikey), _) => Credentials::ApiKey(apikey.clone()),
            (_, None, Some(token)) => Credentials::Bearer(token.clone()),
            _ => Credentials::Anonymous,
        }
    }

    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        self.validate()?;

        Ok(ClientConfig {
            base_url: self.server_url.clone(),
            base_path: self.base_path.clone(),
            credentials: self.credentials(),
        })
    }
}
