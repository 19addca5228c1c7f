use log::{info, warn};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_ENVIRONMENT: &str = "dev";
pub const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "*";
pub const DEFAULT_RATE_LIMIT_REQUESTS: usize = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

#[derive(Debug)]
pub enum ConfigError {
    Read(String, std::io::Error),
    Parse(String, serde_json::Error),
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(path, err) => write!(f, "error reading config file {}: {}", path, err),
            ConfigError::Parse(path, err) => write!(f, "error parsing config file {}: {}", path, err),
            ConfigError::Missing(key) => write!(f, "{} is required but not set", key),
            ConfigError::Invalid { key, value } => write!(f, "invalid value for {}: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Values read from the JSON config file. Every key is optional; the
/// environment overrides whatever is set here.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server_address: Option<String>,
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub sentry_dsn: Option<String>,
    pub environment: Option<String>,
    pub auth_private_key: Option<String>,
    pub auth_private_key_file: Option<String>,
    pub auth_salt: Option<String>,
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests: Option<usize>,
    pub rate_limit_window_seconds: Option<u64>,
}

impl FileConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(display.clone(), e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(display, e))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub log_level: String,
    pub sentry_dsn: Option<String>,
    pub environment: String,
    pub auth_private_key: Option<String>,
    pub auth_private_key_file: Option<String>,
    pub auth_salt: Option<String>,
    pub cors_allowed_origins: String,
    pub rate_limit_requests: usize,
    pub rate_limit_window_seconds: u64,
}

impl Config {
    /// Loads `.env`, then the config file, then the process environment.
    ///
    /// An explicitly requested file must exist; the default `config.json`
    /// may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(dotenv_path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", dotenv_path.display());
        }

        let file = match path {
            Some(path) => FileConfig::load_from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    FileConfig::load_from_file(default_path)?
                } else {
                    warn!("Config file not found. Using environment variables and defaults.");
                    FileConfig::default()
                }
            }
        };

        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Merges file values with `lookup` (normally the process environment).
    /// Non-empty lookup values win.
    pub fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL")
            .or(file.database_url)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Config {
            server_address: var("SERVER_ADDRESS")
                .or(file.server_address)
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            database_url,
            log_level: var("LOG_LEVEL")
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            sentry_dsn: var("SENTRY_DSN").or(file.sentry_dsn),
            environment: var("ENVIRONMENT")
                .or(file.environment)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            auth_private_key: var("AUTH_PRIVATE_KEY").or(file.auth_private_key),
            auth_private_key_file: var("AUTH_PRIVATE_KEY_FILE").or(file.auth_private_key_file),
            auth_salt: var("AUTH_SALT").or(file.auth_salt),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .or(file.cors_allowed_origins)
                .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGINS.to_string()),
            rate_limit_requests: parse_var(var("RATE_LIMIT_REQUESTS"), "RATE_LIMIT_REQUESTS")?
                .or(file.rate_limit_requests)
                .unwrap_or(DEFAULT_RATE_LIMIT_REQUESTS),
            rate_limit_window_seconds: parse_var(
                var("RATE_LIMIT_WINDOW_SECONDS"),
                "RATE_LIMIT_WINDOW_SECONDS",
            )?
            .or(file.rate_limit_window_seconds)
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
        })
    }

    /// Defaults for everything except the database URL.
    pub fn for_database(database_url: &str) -> Self {
        Config {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            database_url: database_url.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            sentry_dsn: None,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            auth_private_key: None,
            auth_private_key_file: None,
            auth_salt: None,
            cors_allowed_origins: DEFAULT_CORS_ALLOWED_ORIGINS.to_string(),
            rate_limit_requests: DEFAULT_RATE_LIMIT_REQUESTS,
            rate_limit_window_seconds: DEFAULT_RATE_LIMIT_WINDOW_SECONDS,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "dev" | "development")
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

fn parse_var<T: FromStr>(value: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| v.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value: v }))
        .transpose()
}
