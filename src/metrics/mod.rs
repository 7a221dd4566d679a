//! Built-in metrics for catalog synchronization.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Version checks, by outcome
//! - Reload attempts/success/failures and duration
//! - Version bumps and failed bumps
//! - Catalog age
//!
//! # Examples
//!
//! ```rust,no_run
//! use catalog_sync::prelude::*;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let sync = TranslationSync::builder()
//!     .with_settings_file("config/i18n.yaml")
//!     .with_metrics(global::meter("storefront"))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod sync_metrics;

pub use sync_metrics::SyncMetrics;
