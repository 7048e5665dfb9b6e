use pp_api::config::{Config as PpApiConfig, ValidationError};
use sentry::types::Dsn;
use serde::Deserialize;
use std::fs::File;

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "lets".into()
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Unknown errors are reported to Sentry only when set.
    pub sentry_dsn: Option<String>,
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl LoggingConfig {
    /// Parsed Sentry DSN, `None` when reporting is off.
    pub fn dsn(&self) -> Result<Option<Dsn>, ConfigError> {
        self.sentry_dsn
            .as_deref()
            .map(|dsn| dsn.parse::<Dsn>())
            .transpose()
            .map_err(|e| ConfigError::InvalidSentryDsn(e.to_string()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sentry_dsn: None,
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub pp_api: PpApiConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.common.logging.dsn()?;
        config.pp_api.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] ValidationError),
    #[error("invalid sentry DSN: {0}")]
    InvalidSentryDsn(String),
}
