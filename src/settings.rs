use config::{Config, ConfigError, File};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CACHE_LIMIT: usize = 1024;
pub const DEFAULT_CACHE_UPDATE_PERIOD: Duration = Duration::from_secs(60);

/// How the `Crypter` caches registry lookups.
///
/// ```toml
/// [crypter]
/// cache_limit = 1024
/// # seconds
/// cache_update_period = 60
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrypterSettings {
    pub cache_limit: usize,
    pub cache_update_period: Duration,
}

impl Default for CrypterSettings {
    fn default() -> Self {
        CrypterSettings {
            cache_limit: DEFAULT_CACHE_LIMIT,
            cache_update_period: DEFAULT_CACHE_UPDATE_PERIOD,
        }
    }
}

impl CrypterSettings {
    /// Read the `crypter` section of `settings`. Missing keys keep their
    /// defaults; negative or wrongly typed values are errors.
    pub fn from_config(settings: &Config) -> Result<Self, ConfigError> {
        let cache_limit = match non_negative(settings, "crypter.cache_limit")? {
            Some(cache_limit) => usize::try_from(cache_limit).map_err(|_| {
                ConfigError::Message(format!("crypter.cache_limit {} is too large", cache_limit))
            })?,
            None => DEFAULT_CACHE_LIMIT,
        };
        let cache_update_period = match non_negative(settings, "crypter.cache_update_period")? {
            Some(seconds) => Duration::from_secs(seconds),
            None => DEFAULT_CACHE_UPDATE_PERIOD,
        };
        Ok(CrypterSettings {
            cache_limit,
            cache_update_period,
        })
    }

    /// Load the settings from the config file `config_name`, with or without
    /// its extension. A missing file gives the defaults, a malformed one is an
    /// error.
    pub fn load(config_name: &str) -> Result<Self, ConfigError> {
        let mut settings = Config::default();
        settings.merge(File::with_name(config_name).required(false))?;
        let crypter_settings = CrypterSettings::from_config(&settings)?;
        debug!("crypter settings from {}: {:?}", config_name, crypter_settings);
        Ok(crypter_settings)
    }
}

// integers are read signed so a negative value is reported instead of wrapping
fn non_negative(settings: &Config, key: &str) -> Result<Option<u64>, ConfigError> {
    match settings.get::<i64>(key) {
        Ok(value) if value < 0 => Err(ConfigError::Message(format!(
            "{} must not be negative, got {}",
            key, value
        ))),
        Ok(value) => Ok(Some(value as u64)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}
