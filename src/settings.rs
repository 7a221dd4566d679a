//! Runtime settings.
//!
//! Settings come from built-in defaults, then optional files (later files
//! override earlier ones), then environment variables:
//!
//! ```text
//! CATALOG_SYNC_REDIS_URL=redis://cache:6379
//! CATALOG_SYNC_STORE_TIMEOUT_MS=30
//! CATALOG_SYNC_CONCURRENT_CHECK=wait
//! ```

use crate::catalog::Validate;
use crate::error::{Result, SyncError, ValidationError};
use crate::notify::ConcurrentCheckPolicy;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "CATALOG_SYNC";

/// Settings for one replica.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Catalog directory on the shared file store
    pub catalog_dir: PathBuf,
    /// Locale consulted when a message is missing; empty disables it
    pub fallback_locale: String,
    /// Key holding the version token
    pub version_key: String,
    /// Redis URL; the in-process store is used when unset
    pub redis_url: Option<String>,
    /// Timeout for each version store command
    pub store_timeout_ms: u64,
    /// Extra attempts for a failed version write
    pub write_retries: u32,
    /// Base delay between write attempts
    pub retry_backoff_ms: u64,
    /// Background check interval; checks are request-triggered only when unset
    pub poll_interval_ms: Option<u64>,
    /// What concurrent checks do while a reload is running
    pub concurrent_check: ConcurrentCheckPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("locale"),
            fallback_locale: "en".to_string(),
            version_key: "i18n:catalog_version".to_string(),
            redis_url: None,
            store_timeout_ms: 50,
            write_retries: 3,
            retry_backoff_ms: 20,
            poll_interval_ms: None,
            concurrent_check: ConcurrentCheckPolicy::Skip,
        }
    }
}

impl Settings {
    /// Load settings from files and environment variables on top of the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or malformed, or a value has the
    /// wrong type.
    pub fn load<P: AsRef<Path>>(files: &[P], env_prefix: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        for path in files {
            builder = builder.add_source(File::from(path.as_ref()).required(true));
        }
        if let Some(prefix) = env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings: Settings = builder
            .build()
            .map_err(|e| SyncError::SettingsError(format!("Failed to load settings: {}", e)))?
            .try_deserialize()
            .map_err(|e| SyncError::SettingsError(format!("Failed to deserialize settings: {}", e)))?;

        settings
            .validate()
            .map_err(|e| SyncError::SettingsError(e.to_string()))?;
        Ok(settings)
    }

    /// Load settings from environment variables with the default prefix.
    pub fn from_env() -> Result<Self> {
        Self::load::<&Path>(&[], Some(DEFAULT_ENV_PREFIX))
    }

    /// The fallback locale, if enabled.
    pub fn fallback(&self) -> Option<&str> {
        let locale = self.fallback_locale.trim();
        (!locale.is_empty()).then_some(locale)
    }

    /// Timeout for each version store command.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Base delay between version write attempts.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Background check interval, if polling is enabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }
}

impl Validate for Settings {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut errors = Vec::new();
        if self.version_key.trim().is_empty() {
            errors.push(ValidationError::custom("version_key must not be empty"));
        }
        if self.store_timeout_ms == 0 {
            errors.push(ValidationError::custom("store_timeout_ms must be greater than 0"));
        }
        if self.poll_interval_ms == Some(0) {
            errors.push(ValidationError::custom("poll_interval_ms must be greater than 0"));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}
