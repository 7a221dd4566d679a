//! Immutable, in-memory translation tables.

use crate::store::VersionToken;
use std::collections::HashMap;

/// Message tables for one locale: message key to localized string.
pub type Messages = HashMap<String, String>;

/// Normalize a locale identifier to `ll` or `ll_RR` form.
///
/// Accepts `-` or `_` as separator and any casing. Two-letter regions are
/// upper-cased; longer subtags (scripts) are title-cased.
///
/// # Examples
///
/// ```rust
/// use catalog_sync::catalog::normalize_locale;
///
/// assert_eq!(normalize_locale("pt-br"), "pt_BR");
/// assert_eq!(normalize_locale("sr-latn"), "sr_Latn");
/// assert_eq!(normalize_locale("EN"), "en");
/// ```
pub fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim().replace('-', "_");
    match locale.split_once('_') {
        Some((lang, region)) if !region.is_empty() => {
            let region = if region.len() == 2 {
                region.to_ascii_uppercase()
            } else {
                let mut chars = region.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                    }
                    None => String::new(),
                }
            };
            format!("{}_{}", lang.to_ascii_lowercase(), region)
        }
        Some((lang, _)) => lang.to_ascii_lowercase(),
        None => locale.to_ascii_lowercase(),
    }
}

/// Counts describing a loaded catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    /// Number of locales
    pub locales: usize,
    /// Total number of messages across all locales
    pub messages: usize,
}

/// Decoded message tables for every supported locale.
///
/// A catalog is never mutated after construction; reloads build a new one and
/// swap it in wholesale, together with the version token it was loaded for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationCatalog {
    locales: HashMap<String, Messages>,
    version: Option<VersionToken>,
}

impl TranslationCatalog {
    /// Build a catalog, normalizing locale identifiers.
    ///
    /// Tables whose locales normalize to the same identifier are merged, later
    /// entries winning.
    pub fn new(tables: impl IntoIterator<Item = (String, Messages)>) -> Self {
        let mut locales: HashMap<String, Messages> = HashMap::new();
        for (locale, messages) in tables {
            locales
                .entry(normalize_locale(&locale))
                .or_default()
                .extend(messages);
        }
        Self {
            locales,
            version: None,
        }
    }

    /// Label the catalog with the version token it reflects.
    pub fn with_version(mut self, version: Option<VersionToken>) -> Self {
        self.version = version;
        self
    }

    /// The version token this catalog was loaded for, if known.
    pub fn version(&self) -> Option<VersionToken> {
        self.version
    }

    /// A catalog with no locales.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the catalog holds no locales.
    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// Message table for a locale, if loaded.
    pub fn locale(&self, locale: &str) -> Option<&Messages> {
        self.locales.get(&normalize_locale(locale))
    }

    /// Whether the locale is loaded.
    pub fn has_locale(&self, locale: &str) -> bool {
        self.locale(locale).is_some()
    }

    /// Loaded locale identifiers, sorted.
    pub fn locales(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over `(locale, messages)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Messages)> {
        self.locales.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Exact lookup without any fallback.
    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        self.locale(locale)?.get(key).map(String::as_str)
    }

    /// Look a message up through the fallback chain: the exact locale, then
    /// its language (`pt_BR` to `pt`), then `fallback_locale`.
    pub fn resolve(&self, locale: &str, key: &str, fallback_locale: Option<&str>) -> Option<&str> {
        let locale = normalize_locale(locale);
        if let Some(found) = self.locales.get(&locale).and_then(|m| m.get(key)) {
            return Some(found);
        }

        if let Some((lang, _)) = locale.split_once('_') {
            if let Some(found) = self.locales.get(lang).and_then(|m| m.get(key)) {
                return Some(found);
            }
        }

        fallback_locale.and_then(|fallback| self.get(fallback, key))
    }

    /// Locale and message counts.
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            locales: self.locales.len(),
            messages: self.locales.values().map(HashMap::len).sum(),
        }
    }
}
