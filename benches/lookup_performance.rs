//! Lookup benchmarks.
//!
//! Lookups must stay lock-free while catalogs are being reloaded.

use catalog_sync::catalog::{CatalogReloader, DirectorySource};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tempfile::TempDir;

fn catalog_dir(messages: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for locale in ["en", "de", "pt", "pt_BR"] {
        let body: Vec<String> = (0..messages)
            .map(|i| format!("\"msg_{}\": \"{} text {}\"", i, locale, i))
            .collect();
        fs::write(
            temp_dir.path().join(format!("{}.json", locale)),
            format!("{{{}}}", body.join(",")),
        )
        .unwrap();
    }
    temp_dir
}

fn loaded_reloader(rt: &tokio::runtime::Runtime, dir: &TempDir) -> Arc<CatalogReloader> {
    let reloader = CatalogReloader::new(Arc::new(DirectorySource::new(dir.path())))
        .with_fallback_locale(Some("en"));
    rt.block_on(reloader.reload()).unwrap();
    Arc::new(reloader)
}

/// Exact hits, language fallback and default-locale fallback.
fn benchmark_lookup(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = catalog_dir(1_000);
    let reloader = loaded_reloader(&rt, &dir);

    let mut group = c.benchmark_group("lookup");
    for (name, locale) in [("exact", "pt_BR"), ("language", "pt-PT"), ("fallback", "ja")] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &locale, |b, locale| {
            b.iter(|| black_box(reloader.lookup(locale, "msg_500")));
        });
    }
    group.finish();
}

/// Lookups while another thread reloads continuously.
fn benchmark_lookup_during_reload(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = catalog_dir(1_000);
    let reloader = loaded_reloader(&rt, &dir);

    let stop = Arc::new(AtomicBool::new(false));
    let background = {
        let reloader = Arc::clone(&reloader);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            while !stop.load(Ordering::Relaxed) {
                rt.block_on(reloader.reload()).unwrap();
            }
        })
    };

    c.bench_function("lookup_during_reload", |b| {
        b.iter(|| black_box(reloader.lookup("de", "msg_500")));
    });

    stop.store(true, Ordering::Relaxed);
    background.join().unwrap();
}

criterion_group!(benches, benchmark_lookup, benchmark_lookup_during_reload);
criterion_main!(benches);
