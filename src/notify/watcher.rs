//! Version checks that keep a replica's catalogs in step with the shared token.

use crate::catalog::CatalogReload;
use crate::error::SyncError;
use crate::store::{VersionStore, VersionToken};
use serde::Deserialize;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[cfg(feature = "metrics")]
use crate::metrics::SyncMetrics;

/// What a check does when another check is already reloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrentCheckPolicy {
    /// Return immediately with [`CheckOutcome::InProgress`].
    #[default]
    Skip,
    /// Wait for the running reload, then re-read the shared version and
    /// re-evaluate.
    Wait,
}

/// Result of one [`VersionWatcher::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The store holds no usable token; nothing to do.
    NoRemoteVersion,
    /// The store could not be reached; the current catalogs stay active.
    StoreUnavailable,
    /// The local version already matches the store.
    UpToDate(VersionToken),
    /// The catalogs were reloaded and the local version advanced.
    Reloaded {
        /// Local version before the reload
        from: Option<VersionToken>,
        /// Local version after the reload
        to: VersionToken,
    },
    /// The reload failed; the local version was not advanced and the next
    /// check will retry.
    ReloadFailed {
        /// The version that could not be loaded
        remote: VersionToken,
        /// Why the reload failed
        error: String,
    },
    /// Another check is reloading right now.
    InProgress,
}

impl CheckOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoRemoteVersion => "no_remote_version",
            Self::StoreUnavailable => "store_unavailable",
            Self::UpToDate(_) => "up_to_date",
            Self::Reloaded { .. } => "reloaded",
            Self::ReloadFailed { .. } => "reload_failed",
            Self::InProgress => "in_progress",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-process watcher comparing the last loaded version with the shared one.
///
/// Call [`check`](Self::check) once per inbound request (or let
/// [`spawn_poller`](Self::spawn_poller) call it on a timer). A check never
/// fails: store outages and reload errors are logged and retried on the next
/// check. Reloads are single-flight, so concurrent checks never run two
/// reloads at once.
///
/// The local version is the label on the reloader's active catalogs; the
/// watcher sets it only together with a successful swap.
///
/// # Examples
///
/// ```rust,no_run
/// use catalog_sync::catalog::{CatalogReloader, DirectorySource};
/// use catalog_sync::notify::VersionWatcher;
/// use catalog_sync::store::MemoryVersionStore;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let reloader = Arc::new(CatalogReloader::new(Arc::new(DirectorySource::new("locale"))));
/// let watcher = VersionWatcher::new(Arc::new(MemoryVersionStore::new()), reloader);
///
/// // In request middleware:
/// let outcome = watcher.check().await;
/// println!("version check: {}", outcome);
/// # }
/// ```
pub struct VersionWatcher {
    store: Arc<dyn VersionStore>,
    reloader: Arc<dyn CatalogReload>,
    reload_gate: tokio::sync::Mutex<()>,
    policy: ConcurrentCheckPolicy,
    #[cfg(feature = "metrics")]
    metrics: Option<SyncMetrics>,
}

impl VersionWatcher {
    /// Create a watcher with no known version.
    pub fn new(store: Arc<dyn VersionStore>, reloader: Arc<dyn CatalogReload>) -> Self {
        Self {
            store,
            reloader,
            reload_gate: tokio::sync::Mutex::new(()),
            policy: ConcurrentCheckPolicy::default(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Start from a version the catalogs are already known to reflect.
    pub fn with_initial_version(self, version: Option<VersionToken>) -> Self {
        self.reloader.set_loaded_version(version);
        self
    }

    /// Set what concurrent checks do while a reload is running.
    pub fn with_policy(mut self, policy: ConcurrentCheckPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Record check outcomes.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: SyncMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The version the active catalogs were loaded for.
    pub fn last_known_version(&self) -> Option<VersionToken> {
        self.reloader.loaded_version()
    }

    /// Forget the local version so the next check reloads.
    pub fn reset(&self) {
        self.reloader.set_loaded_version(None);
    }

    /// Compare with the shared version and reload on mismatch.
    pub async fn check(&self) -> CheckOutcome {
        let outcome = self.run_check().await;

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_check(outcome.label());
        }

        outcome
    }

    async fn remote_version(&self) -> ControlFlow<CheckOutcome, VersionToken> {
        match self.store.try_get_version().await {
            Ok(Some(remote)) => ControlFlow::Continue(remote),
            Ok(None) => {
                tracing::debug!("no catalog version in store, skipping invalidation");
                ControlFlow::Break(CheckOutcome::NoRemoteVersion)
            }
            Err(SyncError::InvalidToken(e)) => {
                tracing::warn!(store = %self.store.name(), error = %e, "unreadable catalog version, treating as absent");
                ControlFlow::Break(CheckOutcome::NoRemoteVersion)
            }
            Err(e) => {
                tracing::warn!(store = %self.store.name(), error = %e, "version store unavailable, skipping invalidation");

                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    metrics.record_store_error();
                }

                ControlFlow::Break(CheckOutcome::StoreUnavailable)
            }
        }
    }

    async fn run_check(&self) -> CheckOutcome {
        let remote = match self.remote_version().await {
            ControlFlow::Continue(remote) => remote,
            ControlFlow::Break(outcome) => return outcome,
        };

        if self.last_known_version() == Some(remote) {
            return CheckOutcome::UpToDate(remote);
        }

        let (_gate, remote) = match self.reload_gate.try_lock() {
            Ok(gate) => (gate, remote),
            Err(_) => match self.policy {
                ConcurrentCheckPolicy::Skip => {
                    tracing::debug!(version = %remote, "catalog reload already in progress");
                    return CheckOutcome::InProgress;
                }
                ConcurrentCheckPolicy::Wait => {
                    let gate = self.reload_gate.lock().await;
                    // the token may have moved while we waited
                    match self.remote_version().await {
                        ControlFlow::Continue(remote) => (gate, remote),
                        ControlFlow::Break(outcome) => return outcome,
                    }
                }
            },
        };

        let local = self.last_known_version();
        if local == Some(remote) {
            return CheckOutcome::UpToDate(remote);
        }

        match self.reloader.reload_for(Some(remote)).await {
            Ok(stats) => {
                tracing::info!(
                    from = ?local.map(|v| v.value()),
                    to = %remote,
                    locales = stats.locales,
                    messages = stats.messages,
                    "translation catalogs refreshed"
                );
                CheckOutcome::Reloaded {
                    from: local,
                    to: remote,
                }
            }
            Err(e) => {
                tracing::warn!(
                    local = ?local.map(|v| v.value()),
                    remote = %remote,
                    error = %e,
                    "catalog refresh failed, will retry on next check"
                );
                CheckOutcome::ReloadFailed {
                    remote,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Run [`check`](Self::check) every `interval` in a background task.
    ///
    /// The first check runs immediately. Drop or
    /// [`shutdown`](PollerHandle::shutdown) the handle to stop polling.
    pub fn spawn_poller(self: &Arc<Self>, interval: Duration) -> PollerHandle {
        let watcher = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        watcher.check().await;
                    }
                }
            }
            tracing::debug!("catalog version poller stopped");
        });

        PollerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a background poller started by [`VersionWatcher::spawn_poller`].
///
/// Dropping the handle aborts the poller.
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop polling and wait for an in-flight check to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Whether the poller task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
