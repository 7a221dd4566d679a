//! Error types for catalog-sync.

use std::fmt;

/// Result type alias for catalog-sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while synchronizing translation catalogs.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The shared version store could not be reached or rejected the command.
    #[error("Version store unavailable: {0}")]
    StoreUnavailable(String),

    /// A version store operation did not complete in time.
    #[error("Version store timed out after {0} ms")]
    StoreTimeout(u64),

    /// A stored or supplied version token could not be parsed.
    #[error("Invalid version token: {0}")]
    InvalidToken(String),

    /// Failed to load catalogs from a source.
    #[error("Failed to load catalogs: {0}")]
    LoadError(String),

    /// A catalog file is malformed.
    #[error("Failed to parse catalog: {0}")]
    ParseError(String),

    /// Catalog validation failed.
    #[error("Catalog validation failed: {0}")]
    ValidationError(String),

    /// Runtime settings could not be loaded or are invalid.
    #[error("Invalid settings: {0}")]
    SettingsError(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Catalog sync error: {0}")]
    Other(String),
}

impl SyncError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::StoreTimeout(_))
    }
}

/// Validation error for a loaded catalog.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A locale required by the configuration is missing.
    MissingLocale(String),

    /// A specific message entry is invalid.
    InvalidEntry {
        /// The locale the entry belongs to
        locale: String,
        /// The message key
        key: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid entry error.
    pub fn invalid_entry(
        locale: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEntry {
            locale: locale.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::MissingLocale(locale) => write!(f, "Locale '{}' is missing", locale),
            Self::InvalidEntry {
                locale,
                key,
                reason,
            } => {
                write!(f, "Entry '{}' in locale '{}' is invalid: {}", key, locale, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::ValidationError(err.to_string())
    }
}
