//! Builder for constructing TranslationSync instances.

use crate::catalog::{CatalogReloader, CatalogSource, CatalogValidator, DirectorySource, TranslationCatalog};
use crate::core::TranslationSync;
use crate::error::{Result, SyncError, ValidationError};
use crate::notify::{VersionWatcher, WriteSideNotifier};
use crate::settings::Settings;
use crate::store::{MemoryVersionStore, VersionStore};
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::SyncMetrics;

/// Builder for constructing a [`TranslationSync`] instance.
///
/// Settings come from an explicit [`Settings`] value, or from files and
/// environment variables. The version store defaults to Redis when
/// `redis_url` is set (requires the `redis-store` feature) and to an
/// in-process store otherwise; the catalog source defaults to
/// `settings.catalog_dir`.
///
/// # Examples
///
/// ```rust,no_run
/// use catalog_sync::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let sync = TranslationSync::builder()
///     .with_settings_file("config/i18n.yaml")
///     .with_env_overrides("CATALOG_SYNC")
///     .with_validation(|catalog: &TranslationCatalog| {
///         if !catalog.has_locale("de") {
///             return Err(ValidationError::MissingLocale("de".into()));
///         }
///         Ok(())
///     })
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct TranslationSyncBuilder {
    settings: Option<Settings>,
    settings_files: Vec<PathBuf>,
    env_prefix: Option<String>,
    store: Option<Arc<dyn VersionStore>>,
    source: Option<Arc<dyn CatalogSource>>,
    validators: Vec<CatalogValidator>,
    #[cfg(feature = "metrics")]
    metrics: Option<SyncMetrics>,
}

impl TranslationSyncBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: None,
            settings_files: Vec::new(),
            env_prefix: None,
            store: None,
            source: None,
            validators: Vec::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Use these settings instead of loading files or environment variables.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Add a settings file. Later files override earlier ones.
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_files.push(path.into());
        self
    }

    /// Read settings overrides from environment variables with this prefix
    /// (e.g. `CATALOG_SYNC_REDIS_URL`).
    pub fn with_env_overrides(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Use a specific version store.
    pub fn with_store<S: VersionStore + 'static>(self, store: S) -> Self {
        self.with_shared_store(Arc::new(store))
    }

    /// Use a version store that is shared with other code.
    pub fn with_shared_store(mut self, store: Arc<dyn VersionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a specific catalog source instead of `settings.catalog_dir`.
    pub fn with_source<S: CatalogSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Add a validation function every loaded catalog must pass.
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&TranslationCatalog) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Record OpenTelemetry metrics with this meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(SyncMetrics::new(meter));
        self
    }

    /// Build the service.
    ///
    /// Reads the current version, performs the initial catalog load and
    /// starts the background poller when `poll_interval_ms` is set. The
    /// version is read before the catalogs so that a save racing with startup
    /// causes one extra reload rather than a missed one.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded, the store cannot be
    /// created, or the initial catalog load fails.
    pub async fn build(self) -> Result<TranslationSync> {
        let settings = match self.settings {
            Some(settings) => {
                crate::catalog::Validate::validate(&settings)
                    .map_err(|e| SyncError::SettingsError(e.to_string()))?;
                settings
            }
            None => Settings::load(&self.settings_files, self.env_prefix.as_deref())?,
        };

        let store = match self.store {
            Some(store) => store,
            None => default_store(&settings)?,
        };
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(DirectorySource::new(&settings.catalog_dir)) as Arc<dyn CatalogSource>);

        let initial_version = store.get_version().await;

        let reloader = CatalogReloader::new(Arc::clone(&source))
            .with_fallback_locale(settings.fallback())
            .with_validators(self.validators);
        #[cfg(feature = "metrics")]
        let reloader = match &self.metrics {
            Some(metrics) => reloader.with_metrics(metrics.clone()),
            None => reloader,
        };
        reloader.reload_for(initial_version).await?;
        let reloader = Arc::new(reloader);

        let watcher = VersionWatcher::new(Arc::clone(&store), reloader.clone())
            .with_policy(settings.concurrent_check);
        #[cfg(feature = "metrics")]
        let watcher = match &self.metrics {
            Some(metrics) => watcher.with_metrics(metrics.clone()),
            None => watcher,
        };
        let watcher = Arc::new(watcher);

        let notifier = WriteSideNotifier::new(store, source);
        #[cfg(feature = "metrics")]
        let notifier = match self.metrics {
            Some(metrics) => notifier.with_metrics(metrics),
            None => notifier,
        };

        let poller = settings
            .poll_interval()
            .map(|interval| watcher.spawn_poller(interval));

        tracing::info!(
            catalog_dir = %settings.catalog_dir.display(),
            version = ?initial_version.map(|v| v.value()),
            polling = poller.is_some(),
            "translation sync started"
        );

        Ok(TranslationSync::from_parts(reloader, watcher, notifier, poller))
    }
}

impl Default for TranslationSyncBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationSync {
    /// Create a new builder for constructing the service.
    pub fn builder() -> TranslationSyncBuilder {
        TranslationSyncBuilder::new()
    }
}

fn default_store(settings: &Settings) -> Result<Arc<dyn VersionStore>> {
    match &settings.redis_url {
        #[cfg(feature = "redis-store")]
        Some(url) => {
            let store = crate::store::RedisVersionStore::connect(url, settings.version_key.clone())?
                .with_timeout(settings.store_timeout())
                .with_write_retries(settings.write_retries, settings.retry_backoff());
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis-store"))]
        Some(_) => Err(SyncError::SettingsError(
            "redis_url is set but the redis-store feature is not enabled".to_string(),
        )),
        None => {
            tracing::info!("no redis_url configured, using in-process version store");
            Ok(Arc::new(MemoryVersionStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VersionToken;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn catalog_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("en.json"), r#"{"checkout": "Checkout"}"#).unwrap();
        temp_dir
    }

    fn settings(dir: &TempDir) -> Settings {
        Settings {
            catalog_dir: dir.path().to_path_buf(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_builder_accumulates_files() {
        let builder = TranslationSyncBuilder::new()
            .with_settings_file("base.yaml")
            .with_settings_file("prod.yaml")
            .with_env_overrides("APP");

        assert_eq!(builder.settings_files.len(), 2);
        assert_eq!(builder.env_prefix.as_deref(), Some("APP"));
    }

    #[tokio::test]
    async fn test_build_loads_catalogs_and_initial_version() {
        let dir = catalog_dir();
        let store = MemoryVersionStore::with_version(VersionToken::new(100));

        let sync = TranslationSync::builder()
            .with_settings(settings(&dir))
            .with_store(store)
            .build()
            .await
            .unwrap();

        assert_eq!(sync.lookup("en", "checkout"), "Checkout");
        assert_eq!(sync.catalog_version(), Some(VersionToken::new(100)));
        assert_eq!(sync.catalog().version(), Some(VersionToken::new(100)));
        assert!(!sync.is_polling());
    }

    #[tokio::test]
    async fn test_build_fails_without_catalogs() {
        let dir = TempDir::new().unwrap();
        let result = TranslationSync::builder()
            .with_settings(settings(&dir))
            .build()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_settings() {
        let dir = catalog_dir();
        let result = TranslationSync::builder()
            .with_settings(Settings {
                store_timeout_ms: 0,
                ..settings(&dir)
            })
            .build()
            .await;
        assert!(matches!(result, Err(SyncError::SettingsError(_))));
    }

    #[cfg(not(feature = "redis-store"))]
    #[tokio::test]
    async fn test_redis_url_requires_feature() {
        let dir = catalog_dir();
        let result = TranslationSync::builder()
            .with_settings(Settings {
                redis_url: Some("redis://127.0.0.1:6379".into()),
                ..settings(&dir)
            })
            .build()
            .await;
        assert!(matches!(result, Err(SyncError::SettingsError(_))));
    }

    #[tokio::test]
    async fn test_builder_validators_apply() {
        let dir = catalog_dir();
        let result = TranslationSync::builder()
            .with_settings(settings(&dir))
            .with_validation(|catalog: &TranslationCatalog| {
                if !catalog.has_locale("de") {
                    return Err(ValidationError::MissingLocale("de".into()));
                }
                Ok(())
            })
            .build()
            .await;
        assert!(matches!(result, Err(SyncError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_poller_started_from_settings() {
        let dir = catalog_dir();
        let sync = TranslationSync::builder()
            .with_settings(Settings {
                poll_interval_ms: Some(60_000),
                ..settings(&dir)
            })
            .build()
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sync.is_polling());
        sync.shutdown().await;
        assert!(!sync.is_polling());
    }
}
