//! The per-process service wiring store, catalogs, watcher and notifier.

mod builder;
mod service;

pub use builder::TranslationSyncBuilder;
pub use service::TranslationSync;
