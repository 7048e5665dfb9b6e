use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener cannot share an address")]
    ListenerConflict,

    #[error("osu! API key cannot be empty")]
    EmptyApiKey,

    #[error("{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("Cache capacity cannot be 0")]
    ZeroCacheCapacity,
}

/// pp API configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the public API
    pub listener: Listener,
    /// Listener for `/health`, `/ready` and `/version`
    pub admin_listener: Listener,
    /// Upstream osu! API
    pub osu_api: OsuApiConfig,
    /// Directory keeping downloaded `.osu` files. Files are always fetched upstream when unset.
    #[serde(default)]
    pub beatmaps_dir: Option<PathBuf>,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upper bound of a single pp calculation, file download included
    #[serde(default = "default_calculation_timeout")]
    pub calculation_timeout_secs: u64,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        if self.listener == self.admin_listener {
            return Err(ValidationError::ListenerConflict);
        }

        self.osu_api.validate()?;

        if self.calculation_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("calculation_timeout_secs"));
        }
        if self.cache.max_capacity == 0 {
            return Err(ValidationError::ZeroCacheCapacity);
        }

        Ok(())
    }
}

fn default_calculation_timeout() -> u64 {
    30
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OsuApiConfig {
    /// Base URL, e.g. `https://osu.ppy.sh`
    pub url: Url,
    pub key: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl OsuApiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("osu_api.timeout_secs"));
        }
        Ok(())
    }
}

fn default_upstream_timeout() -> u64 {
    10
}

/// Sizing of the in-memory beatmap and pp stores
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CacheConfig {
    pub max_capacity: u64,
    /// Entries expire this long after insertion. Never expire when unset.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_capacity: 100_000,
            ttl_secs: Some(24 * 60 * 60),
        }
    }
}
