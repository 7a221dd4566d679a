//! In-process version store.

use super::{VersionStore, VersionToken};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct MemoryState {
    version: Option<VersionToken>,
    unavailable: bool,
    reads: usize,
    writes: usize,
}

/// Version store kept in process memory.
///
/// Clones share the same token, so several watchers in one process behave like
/// replicas sharing a remote store. Useful for single-node deployments and
/// tests; [`set_unavailable`](Self::set_unavailable) simulates an outage.
///
/// # Examples
///
/// ```rust
/// use catalog_sync::store::{MemoryVersionStore, VersionStore, VersionToken};
///
/// # async fn example() {
/// let store = MemoryVersionStore::new();
/// store.set_version(VersionToken::new(100)).await.unwrap();
/// assert_eq!(store.get_version().await, Some(VersionToken::new(100)));
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryVersionStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryVersionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `version`.
    pub fn with_version(version: VersionToken) -> Self {
        let store = Self::new();
        store.state.lock().version = Some(version);
        store
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Number of read attempts seen so far.
    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    /// Number of write attempts seen so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn try_get_version(&self) -> Result<Option<VersionToken>> {
        let mut state = self.state.lock();
        state.reads += 1;
        if state.unavailable {
            return Err(SyncError::StoreUnavailable("memory store is offline".to_string()));
        }
        Ok(state.version)
    }

    async fn set_version(&self, token: VersionToken) -> Result<()> {
        let mut state = self.state.lock();
        state.writes += 1;
        if state.unavailable {
            return Err(SyncError::StoreUnavailable("memory store is offline".to_string()));
        }
        state.version = Some(token);
        Ok(())
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_by_default() {
        let store = MemoryVersionStore::new();
        assert_eq!(store.get_version().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryVersionStore::new();
        let replica_view = store.clone();

        store.set_version(VersionToken::new(42)).await.unwrap();
        assert_eq!(replica_view.get_version().await, Some(VersionToken::new(42)));
    }

    #[tokio::test]
    async fn test_overwrite_not_merge() {
        let store = MemoryVersionStore::with_version(VersionToken::new(105));
        store.set_version(VersionToken::new(100)).await.unwrap();
        assert_eq!(store.get_version().await, Some(VersionToken::new(100)));
    }

    #[tokio::test]
    async fn test_unavailable_write_fails() {
        let store = MemoryVersionStore::with_version(VersionToken::new(1));
        store.set_unavailable(true);

        let result = store.set_version(VersionToken::new(2)).await;
        assert!(matches!(result, Err(SyncError::StoreUnavailable(_))));

        store.set_unavailable(false);
        assert_eq!(store.get_version().await, Some(VersionToken::new(1)));
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn test_unavailable_read_degrades_to_absent() {
        let store = MemoryVersionStore::with_version(VersionToken::new(7));
        store.set_unavailable(true);

        assert!(tokio_test::block_on(store.try_get_version()).is_err());
        assert_eq!(tokio_test::block_on(store.get_version()), None);
    }
}
