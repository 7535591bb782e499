// Benchmarks for the match engine (spec §1 "throughput and memory per active
// match are first-order concerns"). Mirrors the teacher's criterion-based
// `[[bench]]` target declared in Cargo.toml, retargeted from a single
// backtracking program at a slice of text to a `Matcher` over a large
// pattern set.

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use manyregex::{Engine, Matcher, MatcherConfig, Prefilter, StrBuffer};

fn corpus(repeats: usize) -> String {
    "the quick brown fox jumps over the lazy dog and laden wagons drawn by \
     heavy cart-horses and oxen amble lazily along the dusty road\n"
        .repeat(repeats)
}

fn literal_patterns(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("literal{i:05}")).collect()
}

fn build_matcher(config: MatcherConfig, patterns: &[String]) -> Matcher {
    let matcher = Matcher::with_config(config);
    for pattern in patterns {
        matcher.add(pattern, Arc::new(|_, _, _| {})).unwrap();
    }
    matcher
}

fn bench_small_pattern_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("small_pattern_set");
    group.measurement_time(Duration::from_secs(5));
    let text = corpus(200);
    let matcher = build_matcher(
        MatcherConfig::new().with_prefilter(Prefilter::None),
        &["laden".to_string(), "den".to_string(), "fox".to_string(), "a+".to_string()],
    );
    group.bench_function("four_patterns_no_prefilter", |b| {
        b.iter(|| {
            let mut buffer = StrBuffer::new(black_box(&text));
            matcher.exec(&mut buffer);
        })
    });
}

fn bench_large_pattern_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_pattern_set");
    group.measurement_time(Duration::from_secs(10)).sample_size(20);
    let text = corpus(50);
    let patterns = literal_patterns(5_000);

    let without_prefilter = build_matcher(MatcherConfig::new().with_prefilter(Prefilter::None), &patterns);
    group.bench_function("5000_literals_no_prefilter", |b| {
        b.iter(|| {
            let mut buffer = StrBuffer::new(black_box(&text));
            without_prefilter.exec(&mut buffer);
        })
    });

    let with_prefilter = build_matcher(
        MatcherConfig::new()
            .with_prefilter(Prefilter::Aho)
            .with_prefilter_threshold(1_000)
            .unwrap(),
        &patterns,
    );
    group.bench_function("5000_literals_with_prefilter", |b| {
        b.iter(|| {
            let mut buffer = StrBuffer::new(black_box(&text));
            with_prefilter.exec(&mut buffer);
        })
    });
}

fn bench_fastpath_vs_default(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_selection");
    group.measurement_time(Duration::from_secs(5));
    let text = corpus(200);
    let patterns = vec!["a+".to_string(), "b+".to_string(), "laden".to_string()];

    let default_engine = build_matcher(MatcherConfig::new().with_engine(Engine::Default), &patterns);
    group.bench_function("default_engine", |b| {
        b.iter(|| {
            let mut buffer = StrBuffer::new(black_box(&text));
            default_engine.exec(&mut buffer);
        })
    });

    let fastpath_engine = build_matcher(MatcherConfig::new().with_engine(Engine::Fastpath), &patterns);
    group.bench_function("fastpath_engine", |b| {
        b.iter(|| {
            let mut buffer = StrBuffer::new(black_box(&text));
            fastpath_engine.exec(&mut buffer);
        })
    });
}

criterion_group!(
    benches,
    bench_small_pattern_set,
    bench_large_pattern_set,
    bench_fastpath_vs_default
);
criterion_main!(benches);
