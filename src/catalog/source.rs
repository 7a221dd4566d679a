//! Catalog sources backed by the shared file store.

use super::messages::{Messages, normalize_locale};
use crate::error::{Result, SyncError};
use config::{File, FileFormat, Source, Value, ValueKind};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File formats a catalog file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl CatalogFormat {
    /// Detect the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    fn file_format(self) -> FileFormat {
        match self {
            Self::Json => FileFormat::Json,
            Self::Yaml => FileFormat::Yaml,
            Self::Toml => FileFormat::Toml,
        }
    }
}

/// The contents of one locale's catalog file, as produced by the editing tool.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFile {
    /// Locale identifier (normalized when written)
    pub locale: String,
    /// Encoding of `contents`
    pub format: CatalogFormat,
    /// Raw file contents
    pub contents: String,
}

impl CatalogFile {
    /// Create a catalog file.
    pub fn new(locale: impl Into<String>, format: CatalogFormat, contents: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            format,
            contents: contents.into(),
        }
    }

    /// Create a JSON catalog file.
    pub fn json(locale: impl Into<String>, contents: impl Into<String>) -> Self {
        Self::new(locale, CatalogFormat::Json, contents)
    }

    /// Decode the messages, flattening nested tables into dotted keys.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ParseError`] if the contents are malformed or hold
    /// arrays or empty values.
    pub fn parse(&self) -> Result<Messages> {
        parse_messages(&self.contents, self.format, &self.locale)
    }
}

/// Decode catalog file contents into a flat message table.
pub(crate) fn parse_messages(contents: &str, format: CatalogFormat, origin: &str) -> Result<Messages> {
    let table = File::from_str(contents, format.file_format())
        .collect()
        .map_err(|e| SyncError::ParseError(format!("{}: {}", origin, e)))?;

    let mut messages = Messages::new();
    for (key, value) in table {
        flatten(&key, value, &mut messages, origin)?;
    }
    Ok(messages)
}

fn flatten(key: &str, value: Value, out: &mut Messages, origin: &str) -> Result<()> {
    match value.kind {
        ValueKind::Table(table) => {
            for (child, value) in table {
                flatten(&format!("{}.{}", key, child), value, out, origin)?;
            }
            Ok(())
        }
        ValueKind::Array(_) => Err(SyncError::ParseError(format!(
            "{}: message '{}' is a list, expected a string",
            origin, key
        ))),
        ValueKind::Nil => Err(SyncError::ParseError(format!(
            "{}: message '{}' has no value",
            origin, key
        ))),
        _ => {
            let text = value
                .into_string()
                .map_err(|e| SyncError::ParseError(format!("{}: {}", origin, e)))?;
            out.insert(key.to_string(), text);
            Ok(())
        }
    }
}

/// A place translation catalogs are read from.
///
/// Implement this trait to load catalogs from somewhere other than a
/// directory, e.g. an object store mounted elsewhere.
pub trait CatalogSource: Send + Sync {
    /// Load every locale's messages.
    ///
    /// # Errors
    ///
    /// Returns an error if any locale cannot be read or decoded. Partial
    /// results are never returned.
    fn load(&self) -> Result<HashMap<String, Messages>>;

    /// Durably store one locale's catalog file.
    ///
    /// Sources are read-only unless they override this.
    fn write(&self, file: &CatalogFile) -> Result<()> {
        Err(SyncError::Other(format!(
            "catalog source '{}' is read-only, cannot write locale '{}'",
            self.name(),
            file.locale
        )))
    }

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}

/// Catalog directory holding one `<locale>.<ext>` file per locale.
///
/// Supported extensions: `.json`, `.yaml`, `.yml`, `.toml`. Hidden files and
/// other extensions are ignored.
///
/// # Examples
///
/// ```rust,no_run
/// use catalog_sync::catalog::{CatalogSource, DirectorySource};
///
/// let source = DirectorySource::new("/srv/shared/locale");
/// let tables = source.load().unwrap();
/// ```
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Create a source reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The catalog directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Catalog files in the directory as `(locale, path, format)`, sorted by path.
    fn locale_files(&self) -> Result<Vec<(String, PathBuf, CatalogFormat)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') || stem.is_empty() {
                continue;
            }

            let format = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(CatalogFormat::from_extension);
            if let Some(format) = format {
                files.push((normalize_locale(stem), path.clone(), format));
            }
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    fn target_path(&self, locale: &str, format: CatalogFormat) -> PathBuf {
        self.dir
            .join(format!("{}.{}", normalize_locale(locale), format.extension()))
    }
}

impl CatalogSource for DirectorySource {
    fn load(&self) -> Result<HashMap<String, Messages>> {
        if !self.dir.is_dir() {
            return Err(SyncError::LoadError(format!(
                "Catalog directory not found: {}",
                self.dir.display()
            )));
        }

        let mut tables = HashMap::new();
        for (locale, path, format) in self.locale_files()? {
            let contents = fs::read_to_string(&path).map_err(|e| {
                SyncError::LoadError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let messages = parse_messages(&contents, format, &path.display().to_string())?;

            if tables.insert(locale.clone(), messages).is_some() {
                return Err(SyncError::LoadError(format!(
                    "Locale '{}' has more than one catalog file in {}",
                    locale,
                    self.dir.display()
                )));
            }
        }
        Ok(tables)
    }

    /// Write through a temp file in the same directory, `fsync` it, rename it
    /// over the target, then `fsync` the directory. Files for the same locale
    /// in other formats are removed afterwards.
    fn write(&self, file: &CatalogFile) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let target = self.target_path(&file.locale, file.format);

        let mut tmp = tempfile::Builder::new()
            .prefix(".catalog-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(file.contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| SyncError::IoError(e.error))?;

        for other in [CatalogFormat::Json, CatalogFormat::Yaml, CatalogFormat::Toml] {
            if other != file.format {
                let stale = self.target_path(&file.locale, other);
                if stale.exists() {
                    fs::remove_file(&stale)?;
                }
            }
        }
        let stale_yml = self.dir.join(format!("{}.yml", normalize_locale(&file.locale)));
        if stale_yml.exists() {
            fs::remove_file(&stale_yml)?;
        }

        sync_dir(&self.dir)?;
        tracing::debug!(locale = %file.locale, path = %target.display(), "catalog file written");
        Ok(())
    }

    fn name(&self) -> String {
        format!("dir:{}", self.dir.display())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
