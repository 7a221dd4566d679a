//! Several replicas sharing one version store and one catalog directory.

use catalog_sync::catalog::{CatalogSource, Messages};
use catalog_sync::prelude::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn seed_catalogs(dir: &Path) {
    fs::write(
        dir.join("en.json"),
        r#"{"checkout": "Checkout", "cart": {"empty": "Your cart is empty"}}"#,
    )
    .unwrap();
    fs::write(dir.join("pt.yaml"), "checkout: Finalizar compra\n").unwrap();
}

async fn replica(dir: &TempDir, store: &MemoryVersionStore) -> TranslationSync {
    TranslationSync::builder()
        .with_settings(Settings {
            catalog_dir: dir.path().to_path_buf(),
            ..Settings::default()
        })
        .with_shared_store(Arc::new(store.clone()))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_published_translations_reach_every_replica() {
    let dir = TempDir::new().unwrap();
    seed_catalogs(dir.path());
    let store = MemoryVersionStore::new();

    let editor = replica(&dir, &store).await;
    let replicas = [
        replica(&dir, &store).await,
        replica(&dir, &store).await,
        replica(&dir, &store).await,
    ];
    for r in &replicas {
        assert_eq!(r.lookup("pt-BR", "checkout"), "Finalizar compra");
        assert_eq!(r.check().await, CheckOutcome::NoRemoteVersion);
    }

    let version = editor
        .publish_translations(&[CatalogFile::new(
            "pt",
            CatalogFormat::Yaml,
            "checkout: Fechar pedido\ncart:\n  empty: Seu carrinho está vazio\n",
        )])
        .await
        .unwrap();

    // nothing changes until a replica checks
    assert_eq!(replicas[0].lookup("pt", "checkout"), "Finalizar compra");

    for r in &replicas {
        assert_eq!(
            r.check().await,
            CheckOutcome::Reloaded {
                from: None,
                to: version
            }
        );
        assert_eq!(r.lookup("pt-BR", "checkout"), "Fechar pedido");
        assert_eq!(r.lookup("pt", "cart.empty"), "Seu carrinho está vazio");
        assert_eq!(r.catalog_version(), Some(version));
        assert_eq!(r.check().await, CheckOutcome::UpToDate(version));
    }
}

#[tokio::test]
async fn test_broken_catalog_keeps_serving_previous_translations() {
    let dir = TempDir::new().unwrap();
    seed_catalogs(dir.path());
    let store = MemoryVersionStore::new();

    let editor = replica(&dir, &store).await;
    let reader = replica(&dir, &store).await;
    let v1 = editor.notify_translation_saved().await.unwrap();
    assert_eq!(reader.check().await.label(), "reloaded");

    // a file written behind the editor's back, then announced
    fs::write(dir.path().join("pt.yaml"), "checkout: [unterminated\n").unwrap();
    let v2 = editor.notify_translation_saved().await.unwrap();

    for _ in 0..3 {
        assert_eq!(reader.check().await.label(), "reload_failed");
        assert_eq!(reader.lookup("pt", "checkout"), "Finalizar compra");
        assert_eq!(reader.catalog_version(), Some(v1));
    }

    fs::write(dir.path().join("pt.yaml"), "checkout: Pagar\n").unwrap();
    assert_eq!(
        reader.check().await,
        CheckOutcome::Reloaded {
            from: Some(v1),
            to: v2
        }
    );
    assert_eq!(reader.lookup("pt", "checkout"), "Pagar");
}

#[tokio::test]
async fn test_store_outage_degrades_to_stale_translations() {
    let dir = TempDir::new().unwrap();
    seed_catalogs(dir.path());
    let store = MemoryVersionStore::new();

    let editor = replica(&dir, &store).await;
    let reader = replica(&dir, &store).await;

    store.set_unavailable(true);
    let result = editor
        .publish_translations(&[CatalogFile::json("en", r#"{"checkout": "Pay now"}"#)])
        .await;
    assert!(result.unwrap_err().is_transient());

    assert_eq!(reader.check().await, CheckOutcome::StoreUnavailable);
    assert_eq!(reader.lookup("en", "checkout"), "Checkout");

    // the files are already on disk; a retried save only needs the bump
    store.set_unavailable(false);
    editor.notify_translation_saved().await.unwrap();
    assert_eq!(reader.check().await.label(), "reloaded");
    assert_eq!(reader.lookup("en", "checkout"), "Pay now");
}

#[tokio::test]
async fn test_subscribers_hear_about_refreshes() {
    let dir = TempDir::new().unwrap();
    seed_catalogs(dir.path());
    let store = MemoryVersionStore::new();

    let editor = replica(&dir, &store).await;
    let reader = replica(&dir, &store).await;

    let refreshes = Arc::new(AtomicUsize::new(0));
    let refreshes_clone = Arc::clone(&refreshes);
    let _handle = reader.subscribe(move |catalog| {
        assert!(catalog.has_locale("de"));
        refreshes_clone.fetch_add(1, Ordering::SeqCst);
    });

    editor
        .publish_translations(&[CatalogFile::json("de", r#"{"checkout": "Zur Kasse"}"#)])
        .await
        .unwrap();
    reader.check().await;
    reader.check().await;

    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(reader.lookup("de_DE", "checkout"), "Zur Kasse");
    assert_eq!(reader.stats().locales, 3);
}

#[tokio::test]
async fn test_lookup_fallback_chain() {
    let dir = TempDir::new().unwrap();
    seed_catalogs(dir.path());
    let sync = replica(&dir, &MemoryVersionStore::new()).await;

    assert_eq!(sync.lookup("pt-BR", "checkout"), "Finalizar compra");
    assert_eq!(sync.lookup("pt-BR", "cart.empty"), "Your cart is empty");
    assert_eq!(sync.lookup("ja", "checkout"), "Checkout");
    assert_eq!(sync.lookup("ja", "wishlist.title"), "wishlist.title");
    assert_eq!(sync.try_lookup("ja", "wishlist.title"), None);
}

/// Serves one `en` greeting; the next load can be told to stall after
/// reading it.
#[derive(Clone, Default)]
struct StallingSource {
    greeting: Arc<Mutex<String>>,
    stall_next: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
}

impl StallingSource {
    fn new(greeting: &str) -> Self {
        let source = Self::default();
        source.set_greeting(greeting);
        source
    }

    fn set_greeting(&self, greeting: &str) {
        *self.greeting.lock() = greeting.to_string();
    }

    async fn wait_until_stalled(&self) {
        while !self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl CatalogSource for StallingSource {
    fn load(&self) -> catalog_sync::error::Result<HashMap<String, Messages>> {
        let greeting = self.greeting.lock().clone();
        if self.stall_next.swap(false, Ordering::SeqCst) {
            self.stalled.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(300));
        }
        let messages = Messages::from([("greeting".to_string(), greeting)]);
        Ok(HashMap::from([("en".to_string(), messages)]))
    }

    fn name(&self) -> String {
        "stalling".to_string()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_forced_reload_overlapping_check_serves_newest_files() {
    let source = StallingSource::new("old");
    let store = MemoryVersionStore::new();
    let sync = TranslationSync::builder()
        .with_settings(Settings::default())
        .with_shared_store(Arc::new(store.clone()))
        .with_source(source.clone())
        .build()
        .await
        .unwrap();

    // the forced reload reads "old", then stalls before swapping
    source.stall_next.store(true, Ordering::SeqCst);
    let forced = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.reload().await })
    };
    source.wait_until_stalled().await;

    source.set_greeting("new");
    store.set_version(VersionToken::new(6)).await.unwrap();

    let outcome = sync.check().await;
    forced.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Reloaded {
            from: None,
            to: VersionToken::new(6)
        }
    );
    assert_eq!(sync.lookup("en", "greeting"), "new");
    assert_eq!(sync.catalog_version(), Some(VersionToken::new(6)));

    assert_eq!(sync.check().await, CheckOutcome::UpToDate(VersionToken::new(6)));
    assert_eq!(sync.lookup("en", "greeting"), "new");
}
