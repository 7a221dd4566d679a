//! Checks a freshly loaded catalog must pass before it is swapped in.

use super::messages::TranslationCatalog;
use crate::error::ValidationError;
use std::sync::Arc;

/// Type alias for custom catalog validators.
pub type CatalogValidator =
    Arc<dyn Fn(&TranslationCatalog) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Trait for self-validating values.
///
/// # Examples
///
/// ```rust
/// use catalog_sync::catalog::Validate;
/// use catalog_sync::error::ValidationError;
///
/// struct Locales(Vec<String>);
///
/// impl Validate for Locales {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.0.is_empty() {
///             return Err(ValidationError::custom("at least one locale is required"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the value.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Built-in catalog checks: at least one locale, the fallback locale present
/// (when configured), and no empty message keys.
pub fn validate_catalog(
    catalog: &TranslationCatalog,
    fallback_locale: Option<&str>,
) -> Result<(), ValidationError> {
    if catalog.is_empty() {
        return Err(ValidationError::custom("catalog contains no locales"));
    }

    let mut errors = Vec::new();
    if let Some(fallback) = fallback_locale {
        if !catalog.has_locale(fallback) {
            errors.push(ValidationError::MissingLocale(fallback.to_string()));
        }
    }

    for (locale, messages) in catalog.iter() {
        if messages.keys().any(|key| key.trim().is_empty()) {
            errors.push(ValidationError::invalid_entry(locale, "", "message key is empty"));
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
