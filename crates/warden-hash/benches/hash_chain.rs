//! Hash chain throughput over bundle-sized elements

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use warden_hash::{canonical_bytes, HashChain};

fn element(i: usize) -> Value {
    json!({
        "capability_name": format!("capability.{i}"),
        "context": {"principal_id": "p-1", "grant_id": "g-1", "confidence": 0.92, "step": i},
        "executed_at": 1_700_000_000_000_i64 + i as i64,
        "is_success": i % 2 == 0,
    })
}

fn bench_canonical(c: &mut Criterion) {
    let value = element(7);
    c.bench_function("canonical_bytes/execution_snapshot", |b| {
        b.iter(|| canonical_bytes(black_box(&value)));
    });
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_chain");
    for size in [4usize, 16, 64] {
        let elements: Vec<(String, Value)> =
            (0..size).map(|i| (format!("execution_{i}"), element(i))).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &elements, |b, elements| {
            b.iter(|| {
                HashChain::from_elements(elements.iter().map(|(k, v)| (k.as_str(), v))).root()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_canonical, bench_chain);
criterion_main!(benches);
