//! Redis-backed version store.

use super::{VersionStore, VersionToken, with_retries};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, Runtime};
use std::future::Future;
use std::time::Duration;

/// Version store backed by a Redis key shared by all replicas.
///
/// Every command is bounded by a short timeout; a timed-out read is reported
/// as [`SyncError::StoreTimeout`] and therefore degrades to "absent" through
/// [`VersionStore::get_version`]. Writes are retried with jittered backoff.
///
/// # Examples
///
/// ```rust,no_run
/// use catalog_sync::store::RedisVersionStore;
/// use std::time::Duration;
///
/// # fn example() -> catalog_sync::error::Result<()> {
/// let store = RedisVersionStore::connect("redis://127.0.0.1:6379", "i18n:catalog_version")?
///     .with_timeout(Duration::from_millis(50))
///     .with_write_retries(3, Duration::from_millis(20));
/// # Ok(())
/// # }
/// ```
pub struct RedisVersionStore {
    pool: Pool,
    key: String,
    timeout: Duration,
    write_retries: u32,
    retry_backoff: Duration,
}

impl RedisVersionStore {
    /// Create a store from a Redis URL.
    ///
    /// Connections are opened lazily, so an unreachable server is not an
    /// error here.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created.
    pub fn connect(url: &str, key: impl Into<String>) -> Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| SyncError::StoreUnavailable(format!("Failed to create Redis pool: {}", e)))?;
        Ok(Self::from_pool(pool, key))
    }

    /// Create a store from an existing pool.
    pub fn from_pool(pool: Pool, key: impl Into<String>) -> Self {
        Self {
            pool,
            key: key.into(),
            timeout: Duration::from_millis(50),
            write_retries: 3,
            retry_backoff: Duration::from_millis(20),
        }
    }

    /// Set the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many extra attempts a failed write gets, and the base backoff.
    pub fn with_write_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.write_retries = retries;
        self.retry_backoff = backoff;
        self
    }

    /// The key holding the version token.
    pub fn key(&self) -> &str {
        &self.key
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| SyncError::StoreTimeout(self.timeout.as_millis() as u64))?
    }

    async fn get_raw(&self) -> Result<Option<String>> {
        self.bounded(async {
            let mut conn = self.pool.get().await.map_err(|e| {
                SyncError::StoreUnavailable(format!("Redis connection error: {}", e))
            })?;
            conn.get::<_, Option<String>>(&self.key)
                .await
                .map_err(|e| SyncError::StoreUnavailable(format!("Redis GET error: {}", e)))
        })
        .await
    }

    async fn set_raw(&self, value: String) -> Result<()> {
        self.bounded(async {
            let mut conn = self.pool.get().await.map_err(|e| {
                SyncError::StoreUnavailable(format!("Redis connection error: {}", e))
            })?;
            conn.set::<_, _, ()>(&self.key, value)
                .await
                .map_err(|e| SyncError::StoreUnavailable(format!("Redis SET error: {}", e)))
        })
        .await
    }
}

#[async_trait]
impl VersionStore for RedisVersionStore {
    async fn try_get_version(&self) -> Result<Option<VersionToken>> {
        match self.get_raw().await? {
            Some(raw) => raw.parse().map(Some),
            None => Ok(None),
        }
    }

    async fn set_version(&self, token: VersionToken) -> Result<()> {
        with_retries(self.write_retries, self.retry_backoff, || {
            self.set_raw(token.to_string())
        })
        .await?;
        tracing::debug!(key = %self.key, version = %token, "version token written");
        Ok(())
    }

    fn name(&self) -> String {
        format!("redis:{}", self.key)
    }
}
