//! The write side: bumping the shared version after catalogs are saved.

use crate::catalog::{CatalogFile, CatalogSource};
use crate::error::{Result, SyncError};
use crate::store::{VersionStore, VersionToken};
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::SyncMetrics;

/// Signals every replica that the translation catalogs changed.
///
/// The version must only be bumped once the new catalog files are durable on
/// the shared file store; otherwise a replica could reload the old files and
/// then consider itself current. [`publish_translations`](Self::publish_translations)
/// enforces that ordering; [`notify_translation_saved`](Self::notify_translation_saved)
/// leaves it to the caller.
///
/// # Examples
///
/// ```rust,no_run
/// use catalog_sync::catalog::{CatalogFile, DirectorySource};
/// use catalog_sync::notify::WriteSideNotifier;
/// use catalog_sync::store::MemoryVersionStore;
/// use std::sync::Arc;
///
/// # async fn example() -> catalog_sync::error::Result<()> {
/// let notifier = WriteSideNotifier::new(
///     Arc::new(MemoryVersionStore::new()),
///     Arc::new(DirectorySource::new("/srv/shared/locale")),
/// );
///
/// let version = notifier
///     .publish_translations(&[CatalogFile::json("de", r#"{"checkout": "Zur Kasse"}"#)])
///     .await?;
/// println!("published catalogs as version {}", version);
/// # Ok(())
/// # }
/// ```
pub struct WriteSideNotifier {
    store: Arc<dyn VersionStore>,
    source: Arc<dyn CatalogSource>,
    #[cfg(feature = "metrics")]
    metrics: Option<SyncMetrics>,
}

impl WriteSideNotifier {
    /// Create a notifier writing catalogs to `source` and tokens to `store`.
    pub fn new(store: Arc<dyn VersionStore>, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            store,
            source,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Record version bumps.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: SyncMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Write a new version token, strictly greater than the stored one when it
    /// can be read.
    ///
    /// Call only after the catalog files are durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write after retries. Other
    /// replicas will not refresh until a later bump succeeds, so the editing
    /// tool should retry the save.
    pub async fn notify_translation_saved(&self) -> Result<VersionToken> {
        let previous = match self.store.try_get_version().await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(error = %e, "could not read current version, minting from clock");
                None
            }
        };

        let token = VersionToken::next_after(previous);
        let result = self.store.set_version(token).await;

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_version_bump(result.is_ok());
        }

        match result {
            Ok(()) => {
                tracing::info!(
                    store = %self.store.name(),
                    version = %token,
                    "translation catalog version bumped"
                );
                Ok(token)
            }
            Err(e) => {
                tracing::error!(
                    store = %self.store.name(),
                    error = %e,
                    "failed to bump translation catalog version, replicas will not refresh"
                );
                Err(e)
            }
        }
    }

    /// Durably write catalog files, then bump the version.
    ///
    /// Every file is decoded first; if any is malformed nothing is written.
    /// The version is bumped only after all files were written.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is malformed, a write fails (the version is
    /// then left untouched), or the version bump fails.
    pub async fn publish_translations(&self, files: &[CatalogFile]) -> Result<VersionToken> {
        if files.is_empty() {
            return Err(SyncError::Other("no catalog files to publish".to_string()));
        }

        for file in files {
            file.parse()?;
        }

        for file in files {
            self.source.write(file).inspect_err(|e| {
                tracing::error!(
                    locale = %file.locale,
                    error = %e,
                    "catalog write failed, version not bumped"
                );
            })?;
        }

        self.notify_translation_saved().await
    }
}
