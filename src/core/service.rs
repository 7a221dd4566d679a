//! The per-process translation sync service.

use crate::catalog::{CatalogFile, CatalogReloader, CatalogStats, TranslationCatalog};
use crate::error::Result;
use crate::notify::{CheckOutcome, PollerHandle, SubscriptionHandle, VersionWatcher, WriteSideNotifier};
use crate::store::VersionToken;
use std::sync::Arc;

/// One long-lived instance per process, owning the catalogs, the local version
/// state and the write-side notifier.
///
/// Construct it once at startup with [`TranslationSync::builder`], share it
/// with request handlers (it is cheap to clone), and call
/// [`check`](Self::check) once per request unless background polling is
/// enabled.
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
///     .build()
///     .await?;
///
/// // Per request:
/// sync.check().await;
/// let label = sync.lookup("pt-BR", "cart.empty");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TranslationSync {
    inner: Arc<Inner>,
}

struct Inner {
    reloader: Arc<CatalogReloader>,
    watcher: Arc<VersionWatcher>,
    notifier: WriteSideNotifier,
    poller: parking_lot::Mutex<Option<PollerHandle>>,
}

impl TranslationSync {
    pub(crate) fn from_parts(
        reloader: Arc<CatalogReloader>,
        watcher: Arc<VersionWatcher>,
        notifier: WriteSideNotifier,
        poller: Option<PollerHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                reloader,
                watcher,
                notifier,
                poller: parking_lot::Mutex::new(poller),
            }),
        }
    }

    /// Look up a localized string, falling back to the message key.
    pub fn lookup(&self, locale: &str, key: &str) -> String {
        self.inner.reloader.lookup(locale, key)
    }

    /// Look up a localized string without the message key fallback.
    pub fn try_lookup(&self, locale: &str, key: &str) -> Option<String> {
        self.inner.reloader.try_lookup(locale, key)
    }

    /// Snapshot of the active catalog.
    pub fn catalog(&self) -> Arc<TranslationCatalog> {
        self.inner.reloader.current()
    }

    /// Counts for the active catalog.
    pub fn stats(&self) -> CatalogStats {
        self.inner.reloader.stats()
    }

    /// The version the active catalogs were loaded for.
    pub fn catalog_version(&self) -> Option<VersionToken> {
        self.inner.reloader.loaded_version()
    }

    /// Run one version check. Never fails; see [`CheckOutcome`].
    pub async fn check(&self) -> CheckOutcome {
        self.inner.watcher.check().await
    }

    /// Force a reload without consulting the version store.
    ///
    /// Waits for any reload already running. The local version is not
    /// advanced, so the next check still reloads if the store holds a newer
    /// token.
    pub async fn reload(&self) -> Result<CatalogStats> {
        self.inner.reloader.reload().await
    }

    /// Bump the shared version after catalog files were saved elsewhere.
    pub async fn notify_translation_saved(&self) -> Result<VersionToken> {
        self.inner.notifier.notify_translation_saved().await
    }

    /// Write catalog files to the shared file store, then bump the version.
    pub async fn publish_translations(&self, files: &[CatalogFile]) -> Result<VersionToken> {
        self.inner.notifier.publish_translations(files).await
    }

    /// Register a callback invoked after every successful reload.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&TranslationCatalog) + Send + Sync + 'static,
    {
        self.inner.reloader.subscribe(callback)
    }

    /// The catalog reloader.
    pub fn reloader(&self) -> &Arc<CatalogReloader> {
        &self.inner.reloader
    }

    /// The version watcher.
    pub fn watcher(&self) -> &Arc<VersionWatcher> {
        &self.inner.watcher
    }

    /// The write-side notifier.
    pub fn notifier(&self) -> &WriteSideNotifier {
        &self.inner.notifier
    }

    /// Whether a background poller is running.
    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .as_ref()
            .is_some_and(PollerHandle::is_running)
    }

    /// Stop background polling, if any. Request-triggered checks keep working.
    pub async fn shutdown(&self) {
        let poller = self.inner.poller.lock().take();
        if let Some(poller) = poller {
            poller.shutdown().await;
            tracing::debug!("translation sync poller shut down");
        }
    }
}
