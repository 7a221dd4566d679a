//! The process-local catalog holder with lock-free reads and atomic reloads.

use super::messages::{CatalogStats, TranslationCatalog};
use super::source::CatalogSource;
use super::validation::{CatalogValidator, validate_catalog};
use crate::error::{Result, SyncError, ValidationError};
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use crate::store::VersionToken;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::SyncMetrics;

/// Something that can refresh the in-memory catalogs.
///
/// [`VersionWatcher`](crate::notify::VersionWatcher) drives reloads through
/// this trait, so tests can count or fail reloads without touching files.
/// The version label lives with the catalogs, so it can never describe files
/// other than the ones being served.
#[async_trait]
pub trait CatalogReload: Send + Sync {
    /// Re-read the catalogs and swap them in, labelled with `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the new catalogs could not be loaded; the
    /// previously active catalogs and their label must stay in place.
    async fn reload_for(&self, version: Option<VersionToken>) -> Result<CatalogStats>;

    /// The version the active catalogs were loaded for.
    fn loaded_version(&self) -> Option<VersionToken>;

    /// Relabel the active catalogs without reloading them.
    fn set_loaded_version(&self, version: Option<VersionToken>);
}

/// Owner of the active [`TranslationCatalog`].
///
/// Reads go through `arc-swap`: a lookup that started before a reload finishes
/// against the old snapshot, and every lookup after the swap sees the new one.
/// A failed reload never replaces the active catalog. Reloads are serialized:
/// a reload that starts while another one runs waits for it and then reads
/// the files afresh, so an older read can never be swapped in last.
///
/// # Examples
///
/// ```rust,no_run
/// use catalog_sync::catalog::{CatalogReloader, DirectorySource};
/// use std::sync::Arc;
///
/// # async fn example() -> catalog_sync::error::Result<()> {
/// let reloader = CatalogReloader::new(Arc::new(DirectorySource::new("locale")))
///     .with_fallback_locale(Some("en"));
/// reloader.reload().await?;
///
/// assert_eq!(reloader.lookup("en", "checkout"), "Checkout");
/// # Ok(())
/// # }
/// ```
pub struct CatalogReloader {
    current: ArcSwap<TranslationCatalog>,
    reload_gate: tokio::sync::Mutex<()>,
    source: Arc<dyn CatalogSource>,
    fallback_locale: Option<String>,
    validators: Vec<CatalogValidator>,
    subscribers: SubscriberRegistry,
    #[cfg(feature = "metrics")]
    metrics: Option<SyncMetrics>,
}

impl CatalogReloader {
    /// Create a reloader with an empty active catalog.
    ///
    /// Lookups return the message key until the first successful reload.
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            current: ArcSwap::from_pointee(TranslationCatalog::empty()),
            reload_gate: tokio::sync::Mutex::new(()),
            source,
            fallback_locale: None,
            validators: Vec::new(),
            subscribers: SubscriberRegistry::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Create a reloader and perform the initial load.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails.
    pub async fn load(source: Arc<dyn CatalogSource>, fallback_locale: Option<&str>) -> Result<Self> {
        let reloader = Self::new(source).with_fallback_locale(fallback_locale);
        reloader.reload().await?;
        Ok(reloader)
    }

    /// Set the locale consulted when a message is missing, and required to be
    /// present in every loaded catalog.
    pub fn with_fallback_locale(mut self, locale: Option<&str>) -> Self {
        self.fallback_locale = locale.map(str::to_string);
        self
    }

    /// Add a validation function that every new catalog must pass.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use catalog_sync::catalog::{CatalogReloader, DirectorySource};
    /// use catalog_sync::error::ValidationError;
    /// use std::sync::Arc;
    ///
    /// let reloader = CatalogReloader::new(Arc::new(DirectorySource::new("locale")))
    ///     .with_validation(|catalog| {
    ///         if !catalog.has_locale("de") {
    ///             return Err(ValidationError::MissingLocale("de".into()));
    ///         }
    ///         Ok(())
    ///     });
    /// ```
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&TranslationCatalog) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    pub(crate) fn with_validators(mut self, validators: Vec<CatalogValidator>) -> Self {
        self.validators.extend(validators);
        self
    }

    /// Record reload metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: SyncMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Snapshot of the active catalog.
    pub fn current(&self) -> Arc<TranslationCatalog> {
        self.current.load_full()
    }

    /// Counts for the active catalog.
    pub fn stats(&self) -> CatalogStats {
        self.current.load().stats()
    }

    /// The version the active catalog was loaded for.
    pub fn loaded_version(&self) -> Option<VersionToken> {
        self.current.load().version()
    }

    /// The configured fallback locale.
    pub fn fallback_locale(&self) -> Option<&str> {
        self.fallback_locale.as_deref()
    }

    /// Look up a localized string, returning the message key itself when no
    /// locale in the fallback chain has it.
    pub fn lookup(&self, locale: &str, key: &str) -> String {
        self.try_lookup(locale, key)
            .unwrap_or_else(|| key.to_string())
    }

    /// Look up a localized string through the fallback chain.
    pub fn try_lookup(&self, locale: &str, key: &str) -> Option<String> {
        self.current
            .load()
            .resolve(locale, key, self.fallback_locale.as_deref())
            .map(str::to_string)
    }

    /// Register a callback invoked after every successful reload.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&TranslationCatalog) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Re-read every locale from the source and atomically swap the catalog,
    /// keeping the current version label.
    ///
    /// Files read after the label was set are at least as new as that
    /// version, so keeping it can only cause an extra reload later.
    ///
    /// # Errors
    ///
    /// Returns an error if any file is missing or malformed, or if validation
    /// fails. The previously active catalog stays in place.
    pub async fn reload(&self) -> Result<CatalogStats> {
        let _gate = self.reload_gate.lock().await;
        let version = self.loaded_version();
        self.swap_in(version)
    }

    /// Re-read every locale and swap the catalog in labelled with `version`.
    ///
    /// # Errors
    ///
    /// Same as [`reload`](Self::reload); the previous label is kept on failure.
    pub async fn reload_for(&self, version: Option<VersionToken>) -> Result<CatalogStats> {
        let _gate = self.reload_gate.lock().await;
        self.swap_in(version)
    }

    /// Relabel the active catalog without reloading it.
    pub fn set_loaded_version(&self, version: Option<VersionToken>) {
        self.current
            .rcu(|catalog| TranslationCatalog::clone(catalog).with_version(version));
    }

    // Callers hold `reload_gate`.
    fn swap_in(&self, version: Option<VersionToken>) -> Result<CatalogStats> {
        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_reload());

        let result = self.load_validated();

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &result {
                Ok(_) => metrics.record_reload_success(timer),
                Err(_) => metrics.record_reload_failure(timer),
            }
        }

        match result {
            Ok(catalog) => {
                let catalog = Arc::new(catalog.with_version(version));
                let stats = catalog.stats();
                self.current.store(Arc::clone(&catalog));
                tracing::info!(
                    source = %self.source.name(),
                    version = ?version.map(|v| v.value()),
                    locales = stats.locales,
                    messages = stats.messages,
                    "translation catalogs swapped in"
                );
                self.subscribers.notify_all(&catalog);
                Ok(stats)
            }
            Err(e) => {
                tracing::warn!(
                    source = %self.source.name(),
                    error = %e,
                    "catalog reload failed, keeping previous catalogs"
                );
                Err(e)
            }
        }
    }

    fn load_validated(&self) -> Result<TranslationCatalog> {
        let catalog = TranslationCatalog::new(self.source.load()?);

        validate_catalog(&catalog, self.fallback_locale.as_deref())?;
        for validator in &self.validators {
            validator(&catalog).map_err(|e| SyncError::ValidationError(e.to_string()))?;
        }
        Ok(catalog)
    }
}

#[async_trait]
impl CatalogReload for CatalogReloader {
    async fn reload_for(&self, version: Option<VersionToken>) -> Result<CatalogStats> {
        CatalogReloader::reload_for(self, version).await
    }

    fn loaded_version(&self) -> Option<VersionToken> {
        CatalogReloader::loaded_version(self)
    }

    fn set_loaded_version(&self, version: Option<VersionToken>) {
        CatalogReloader::set_loaded_version(self, version)
    }
}
