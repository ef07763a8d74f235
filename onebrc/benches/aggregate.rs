//! Throughput benchmarks for planning, chunk aggregation and the full engine

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use onebrc::{aggregate_chunk, aggregate_input, plan, ByteRange, EngineConfig};

const STATIONS: &[&str] = &[
    "Abha", "Accra", "Bangkok", "Bulawayo", "Cracow", "Dakar", "Hamburg", "Istanbul", "Lima",
    "Oslo", "Palembang", "Reykjavík", "St. John's", "Tokyo", "Vancouver", "Zürich",
];

/// Deterministic `station;temp` lines, one decimal place.
fn synthetic_input(lines: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(lines * 16);
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..lines {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let station = STATIONS[(state % STATIONS.len() as u64) as usize];
        let tenths = (state >> 32) % 1999;
        let tenths = tenths as i64 - 999;
        let sign = if tenths < 0 { "-" } else { "" };
        let magnitude = tenths.unsigned_abs();
        out.extend_from_slice(
            format!("{};{}{}.{}\n", station, sign, magnitude / 10, magnitude % 10).as_bytes(),
        );
    }
    out
}

fn bench_plan(c: &mut Criterion) {
    let input = synthetic_input(1_000_000);
    let mut group = c.benchmark_group("plan");
    for workers in [1, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
            b.iter(|| black_box(plan(&input, w, b'\n')))
        });
    }
    group.finish();
}

fn bench_chunk(c: &mut Criterion) {
    let input = synthetic_input(200_000);
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("aggregate_chunk");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("single_range", |b| {
        b.iter(|| black_box(aggregate_chunk(&input, ByteRange::new(0, input.len()), &config)))
    });
    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let input = Arc::new(synthetic_input(1_000_000));
    let mut group = c.benchmark_group("aggregate_input");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.sample_size(20);

    for workers in [1, 2, 4, 8] {
        let config = EngineConfig::default().with_workers(workers);
        group.bench_with_input(BenchmarkId::from_parameter(workers), &config, |b, config| {
            b.to_async(&runtime)
                .iter(|| async { black_box(aggregate_input(Arc::clone(&input), config).await) })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan, bench_chunk, bench_engine);
criterion_main!(benches);
