//! Handles settings for the application. Configuration is read from
//! `config/settings.toml` (optional) and `TALLY_*` environment variables,
//! e.g. `TALLY_RATES__CACHE_TTL_SECS=30`.
//!
//! See `config/settings.toml` for the configuration.
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Store {
    pub directory: PathBuf,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(engine::DEFAULT_DIRECTORY),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub base_url: String,
    pub reference_currency: String,
    pub timeout_secs: u64,
    /// `0` disables the rate cache.
    pub cache_ttl_secs: u64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            base_url: engine::rates::DEFAULT_BASE_URL.to_string(),
            reference_currency: engine::ReferenceCurrency::default().code().to_string(),
            timeout_secs: engine::rates::DEFAULT_TIMEOUT.as_secs(),
            cache_ttl_secs: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub store: Store,
    pub rates: Rates,
}

impl Settings {
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(
                Environment::with_prefix("TALLY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::new(Some("does/not/exist")).unwrap();
        assert_eq!(settings.store.directory, PathBuf::from("user_files"));
        assert_eq!(settings.rates.reference_currency, "EUR");
        assert_eq!(settings.rates.timeout_secs, 10);
    }
}
