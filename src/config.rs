use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Base URL used when `DEBUGATTOR_API_URL` is not provided.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
/// Request timeout used when `DEBUGATTOR_TIMEOUT_SECS` is not provided.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configuration was already installed in the global cache.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration shared by every SDK call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Debugattor API, including the `/api` prefix.
    pub api_url: String,
    /// Timeout applied to each outbound request, in seconds.
    pub timeout_secs: u64,
    /// Optional file that receives a copy of the SDK's log output.
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: load_env_optional("DEBUGATTOR_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout_secs: load_env_optional("DEBUGATTOR_TIMEOUT_SECS")
                .map(|value| parse_timeout(&value))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            log_file: load_env_optional("DEBUGATTOR_LOG_FILE"),
        })
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue(
            "DEBUGATTOR_TIMEOUT_SECS".to_string(),
        )),
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the process configuration.
///
/// Falls back to [`Config::default`] when [`init_config`] never ran, so library
/// consumers that skip initialization still talk to the default local server.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        api_url = %config.api_url,
        timeout_secs = config.timeout_secs,
        log_file = ?config.log_file,
        "Loaded configuration"
    );
    install_config(config)
}

/// Install an explicit configuration, failing when one is already present.
pub fn install_config(config: Config) -> Result<&'static Config, ConfigError> {
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}
