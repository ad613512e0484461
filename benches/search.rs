//! Benchmarks for search operations.
//!
//! Benchmark targets:
//! - 100 records: <5ms
//! - 1,000 records: <20ms
//!
//! These benchmarks cover the full retrieval pipeline:
//! - Query tokenization and synonym expansion
//! - Candidate collection from the inverted indexes
//! - Record loading and weighted scoring

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sidecar_debug::{DebugKnowledgeBase, ErrorContext, RecordSubmission, SearchQuery};
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

const ERROR_TYPES: &[&str] = &[
    "ImportError",
    "TypeError",
    "KeyError",
    "PermissionError",
    "TimeoutError",
];

const TOPICS: &[&str] = &[
    "module six missing from virtualenv",
    "unsupported operand for str and int",
    "config key user not found in mapping",
    "socket owned by root denied access",
    "upstream request exceeded deadline",
];

// ============================================================================
// Helper Functions
// ============================================================================

/// Seeds a knowledge base with `count` records.
fn seeded_kb(count: usize) -> (TempDir, DebugKnowledgeBase) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut kb = DebugKnowledgeBase::open(dir.path());

    for i in 0..count {
        let error_type = ERROR_TYPES[i % ERROR_TYPES.len()];
        let topic = TOPICS[(i / ERROR_TYPES.len()) % TOPICS.len()];
        kb.record(RecordSubmission::new(
            ErrorContext::new(error_type, format!("{topic} (case {i})")),
            format!("root cause {i}: {topic}"),
            format!("applied fix number {i}"),
            vec![format!("area{}", i % 7), "bench".to_string()],
        ))
        .expect("Failed to seed record");
    }

    (dir, kb)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.measurement_time(Duration::from_secs(5));

    for size in [100, 1_000] {
        let (_dir, kb) = seeded_kb(size);

        group.bench_with_input(BenchmarkId::new("text", size), &kb, |b, kb| {
            let query = SearchQuery::new("module six missing").with_limit(5);
            b.iter(|| black_box(kb.search(&query).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("synonyms", size), &kb, |b, kb| {
            let query = SearchQuery::new("import bug").with_limit(5);
            b.iter(|| black_box(kb.search(&query).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("filtered", size), &kb, |b, kb| {
            let query = SearchQuery::new("denied")
                .with_error_type("PermissionError")
                .with_tag("area3")
                .with_limit(5);
            b.iter(|| black_box(kb.search(&query).unwrap()));
        });
    }

    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    group.sample_size(20);

    let (_dir, mut kb) = seeded_kb(500);
    group.bench_function("full_500", |b| {
        b.iter(|| black_box(kb.rebuild_index().unwrap()));
    });
    group.bench_function("keywords_500", |b| {
        b.iter(|| black_box(kb.rebuild_keywords().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_search, bench_rebuild);
criterion_main!(benches);
