use crate::collector::ChainOptions;
use crate::domain::Severity;
use crate::normalizer::{NormalizerError, PathNormalizer};
use crate::sender::{AuthParams, ClientConfig, DEFAULT_ORIGIN};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Verbosity of the agent's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Collector store endpoint URL
    #[arg(
        long,
        env = "RASK_MONITOR_ENDPOINT",
        default_value = "http://localhost:9000/api/1/store/"
    )]
    pub endpoint: String,

    /// Auth query parameters as key=value (repeatable or comma separated)
    #[arg(long = "auth", env = "RASK_MONITOR_AUTH", value_delimiter = ',')]
    pub auth: Vec<String>,

    /// Log severities to intercept
    #[arg(
        long,
        env = "RASK_MONITOR_LEVELS",
        value_enum,
        value_delimiter = ',',
        default_values_t = Severity::default_levels()
    )]
    pub levels: Vec<Severity>,

    /// Regex removed from culprits and frame filenames (defaults to the mobile bundle prefix)
    #[arg(long, env = "RASK_MONITOR_PATH_STRIP")]
    pub path_strip: Option<String>,

    /// Do not call the previously installed exception handler
    #[arg(long, env = "RASK_MONITOR_NO_RETHROW")]
    pub no_rethrow: bool,

    /// Origin header sent with every delivery
    #[arg(long, env = "RASK_MONITOR_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Connection timeout in seconds
    #[arg(long, env = "RASK_MONITOR_CONNECTION_TIMEOUT_SECS", default_value = "10")]
    pub connection_timeout_secs: u64,

    /// Message of the probe event
    #[arg(
        long,
        env = "RASK_MONITOR_MESSAGE",
        default_value = "rask-monitor-agent probe"
    )]
    pub message: String,

    /// Culprit of the probe event (normalized before delivery)
    #[arg(long, env = "RASK_MONITOR_CULPRIT")]
    pub culprit: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub auth_params: AuthParams,

    #[serde(skip)]
    #[arg(skip)]
    pub connection_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000/api/1/store/".to_string(),
            auth: Vec::new(),
            levels: Severity::default_levels(),
            path_strip: None,
            no_rethrow: false,
            origin: DEFAULT_ORIGIN.to_string(),
            connection_timeout_secs: 10,
            message: "rask-monitor-agent probe".to_string(),
            culprit: None,
            log_level: LogLevel::Info,
            config_file: None,
            auth_params: AuthParams::new(),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// CLI arguments (with env fallbacks); a `--config-file` replaces them wholesale.
    pub fn from_args_and_env<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::parse_from(args);
        if let Some(config_file) = &config.config_file {
            return Self::from_file(config_file);
        }

        let mut config = config;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.connection_timeout = Duration::from_secs(self.connection_timeout_secs);

        self.auth_params.clear();
        for pair in &self.auth {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ConfigError::InvalidConfig(format!(
                    "Auth parameter '{pair}' must be key=value"
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::InvalidConfig(format!(
                    "Auth parameter '{pair}' has an empty key"
                )));
            }
            self.auth_params
                .insert(key.to_string(), value.trim().to_string());
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        if self.levels.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "At least one log level must be intercepted".to_string(),
            ));
        }

        if self.origin.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Origin must not be empty".to_string(),
            ));
        }

        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        self.path_normalizer()
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        Ok(())
    }

    pub fn path_normalizer(&self) -> Result<PathNormalizer, NormalizerError> {
        match &self.path_strip {
            Some(pattern) => PathNormalizer::with_pattern(pattern),
            None => Ok(PathNormalizer::new()),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            origin: self.origin.clone(),
            connection_timeout: self.connection_timeout,
            ..ClientConfig::default()
        }
    }

    pub fn chain_options(&self) -> ChainOptions {
        ChainOptions {
            no_rethrow: self.no_rethrow,
        }
    }
}
