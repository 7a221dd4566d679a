//! Process-local translation catalogs.
//!
//! The catalog directory on the shared file store holds one file per locale.
//! [`CatalogReloader`] decodes it into an immutable [`TranslationCatalog`] and
//! swaps that in atomically on every reload.

mod messages;
mod reloader;
mod source;
mod validation;

pub use messages::{CatalogStats, Messages, TranslationCatalog, normalize_locale};
pub use reloader::{CatalogReload, CatalogReloader};
pub use source::{CatalogFile, CatalogFormat, CatalogSource, DirectorySource};
pub use validation::{CatalogValidator, Validate, validate_catalog};
