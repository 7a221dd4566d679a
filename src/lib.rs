//! # catalog-sync
//!
//! Multi-replica translation catalog invalidation with lock-free reloads.
//!
//! ## Overview
//!
//! Every server replica keeps its translation catalogs in memory. When a
//! translator saves new catalogs, the editing tool writes the files to the
//! shared file store and bumps a version token in a shared key-value store.
//! Each replica compares that token with the version it last loaded (once per
//! request, or on a timer) and reloads on mismatch.
//!
//! - Lock-free catalog reads using `arc-swap`
//! - Atomic catalog swaps: readers never see a half-loaded catalog
//! - Failed reloads keep the previous catalog and retry on the next check
//! - Single-flight reloads per process
//! - Store outages degrade to "no invalidation this round"
//! - Files-before-version publishing through one call
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_sync::prelude::*;
//!
//! # async fn example() -> catalog_sync::error::Result<()> {
//! let sync = TranslationSync::builder()
//!     .with_settings_file("config/i18n.yaml")
//!     .with_env_overrides("CATALOG_SYNC")
//!     .build()
//!     .await?;
//!
//! // Once per request
//! sync.check().await;
//! println!("{}", sync.lookup("de", "cart.empty"));
//!
//! // In the editing tool, after a translator saves
//! sync.publish_translations(&[CatalogFile::json("de", r#"{"cart": {"empty": "Warenkorb leer"}}"#)])
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `redis-store`: [`store::RedisVersionStore`] backed by `deadpool-redis`
//! - `metrics`: OpenTelemetry metrics for checks, reloads and version bumps

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod core;
pub mod error;
pub mod notify;
pub mod settings;
pub mod store;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::catalog::{CatalogFile, CatalogFormat, TranslationCatalog};
    pub use crate::core::{TranslationSync, TranslationSyncBuilder};
    pub use crate::error::{Result, SyncError, ValidationError};
    pub use crate::notify::{CheckOutcome, ConcurrentCheckPolicy};
    pub use crate::settings::Settings;
    pub use crate::store::{MemoryVersionStore, VersionStore, VersionToken};
}
