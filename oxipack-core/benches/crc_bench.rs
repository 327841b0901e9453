//! Throughput benchmarks for the CRC-32 engine.
//!
//! - One-shot checksums across entry sizes typical of pack contents
//! - Incremental updates in small blocks vs one call
//! - Standard static table vs a caller-built table

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxipack_core::crc::{CRC32_POLYNOMIAL, CRC32_SEED, Crc32, Crc32Table};
use std::hint::black_box;

/// Pseudo-random bytes from a fixed LCG so runs are comparable.
fn random_bytes(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut seed: u64 = 0x123456789ABCDEF0;
    for _ in 0..size {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 32) as u8);
    }
    data
}

const SIZES: [(&str, usize); 4] = [
    ("256B", 256),
    ("4KB", 4 * 1024),
    ("64KB", 64 * 1024),
    ("1MB", 1024 * 1024),
];

fn bench_crc32_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_sizes");

    for (size_name, size) in SIZES {
        let data = random_bytes(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_name), &data, |b, data| {
            b.iter(|| black_box(Crc32::compute(black_box(data))));
        });
    }

    group.finish();
}

fn bench_crc32_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_incremental");
    let data = random_bytes(64 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for block in [64usize, 4096] {
        group.bench_with_input(BenchmarkId::new("blocks", block), &data, |b, data| {
            b.iter(|| {
                let mut crc = Crc32::new();
                for part in data.chunks(block) {
                    crc.update(black_box(part));
                }
                black_box(crc.finalize())
            });
        });
    }

    group.finish();
}

fn bench_crc32_owned_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_table");
    let data = random_bytes(64 * 1024);
    let owned = Crc32Table::new(CRC32_POLYNOMIAL);
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("static", |b| {
        b.iter(|| black_box(Crc32::compute(black_box(&data))));
    });
    group.bench_function("owned", |b| {
        b.iter(|| {
            let mut crc = Crc32::with_table(&owned, CRC32_SEED);
            crc.update(black_box(&data));
            black_box(crc.finalize())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_crc32_sizes,
    bench_crc32_incremental,
    bench_crc32_owned_table
);
criterion_main!(benches);
