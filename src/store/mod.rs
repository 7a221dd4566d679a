//! Shared version store accessors.
//!
//! A [`VersionStore`] holds the single version token that tells every replica
//! which save of the translation catalogs is current. Reads degrade to
//! "absent" on failure; writes report failure to the caller.

mod memory;
#[cfg(feature = "redis-store")]
mod redis;
mod token;

pub use memory::MemoryVersionStore;
#[cfg(feature = "redis-store")]
pub use redis::RedisVersionStore;
pub use token::VersionToken;

use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Accessor for the shared version token.
///
/// Implement this trait to back the token with another key-value store.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Read the token, reporting connectivity or decoding failures.
    async fn try_get_version(&self) -> Result<Option<VersionToken>>;

    /// Overwrite the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be updated. Other replicas will
    /// not refresh until a later write succeeds.
    async fn set_version(&self, token: VersionToken) -> Result<()>;

    /// Human-readable name for logging.
    fn name(&self) -> String;

    /// Read the token, treating any failure as "no information available".
    async fn get_version(&self) -> Option<VersionToken> {
        match self.try_get_version().await {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(store = %self.name(), error = %e, "version read failed, treating as absent");
                None
            }
        }
    }
}

/// Delay before retry `attempt` (zero-based): exponential with up to one
/// `base` of random jitter.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(2u32.saturating_pow(attempt.min(16)));
    let jitter_ms = fastrand::u64(0..=base.as_millis() as u64);
    exp + Duration::from_millis(jitter_ms)
}

/// Run `op` up to `retries + 1` times, sleeping between transient failures.
pub(crate) async fn with_retries<T, F, Fut>(retries: u32, base: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < retries => {
                let delay = backoff_delay(base, attempt);
                tracing::warn!(attempt = attempt + 1, error = %e, delay_ms = delay.as_millis() as u64, "store write failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
