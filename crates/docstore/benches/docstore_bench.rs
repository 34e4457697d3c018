use criterion::{Criterion, criterion_group, criterion_main};
use docstore::{Document, DocumentStore, InMemoryDocumentStore, PutOptions};

fn stock_document(key: &str, available: i64) -> Document {
    Document::builder()
        .collection("inventory")
        .key(key)
        .body_raw(serde_json::json!({"available": available}))
        .build()
}

fn bench_put_single_document(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("docstore/put_single_document", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryDocumentStore::new();
                store
                    .put(stock_document("SKU-001", 100), PutOptions::new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_put_with_version_check(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("docstore/put_with_version_check", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryDocumentStore::new();
                store
                    .put(stock_document("SKU-001", 100), PutOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_adjust_counter(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("docstore/adjust_counter", |b| {
        let store = rt.block_on(async {
            let store = InMemoryDocumentStore::new();
            store
                .put(stock_document("SKU-001", i64::MAX / 2), PutOptions::new())
                .await
                .unwrap();
            store
        });

        b.iter(|| {
            rt.block_on(async {
                store
                    .adjust_counter("inventory", "SKU-001", "available", -1, Some(0))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_put_single_document,
    bench_put_with_version_check,
    bench_adjust_counter
);
criterion_main!(benches);
