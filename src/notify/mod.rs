//! Change detection and notification.
//!
//! The write side bumps a shared version token after catalogs are saved; each
//! replica's watcher notices the new token and reloads its catalogs.

pub mod publisher;
pub mod subscriber;
pub mod watcher;

pub use publisher::WriteSideNotifier;
pub use subscriber::{SubscriberRegistry, SubscriptionHandle};
pub use watcher::{CheckOutcome, ConcurrentCheckPolicy, PollerHandle, VersionWatcher};
