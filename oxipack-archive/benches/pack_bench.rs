//! Benchmarks for building and reading packs.
//!
//! - Building packs of many small entries (chunking and header cost)
//! - Directory walks with and without an index
//! - Verified extraction of large entries

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxipack_archive::{PackReader, build};
use std::hint::black_box;

fn entries(count: usize, size: usize) -> Vec<(String, Vec<u8>)> {
    (0..count)
        .map(|i| (format!("assets/item_{:05}.bin", i), vec![(i % 251) as u8; size]))
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_build");

    for count in [100usize, 1000, 10_000] {
        let input = entries(count, 256);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| build(black_box(input.clone())).unwrap());
        });
    }

    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_walk");
    let bytes = build(entries(10_000, 64)).unwrap();
    let reader = PackReader::new(bytes.as_slice()).unwrap();

    group.bench_function("entries", |b| {
        b.iter(|| black_box(reader.entries().count()));
    });
    group.bench_function("find_last", |b| {
        b.iter(|| black_box(reader.find("assets/item_09999.bin").unwrap()));
    });
    let index = reader.index().unwrap();
    group.bench_function("index_lookup", |b| {
        b.iter(|| black_box(index.get(black_box("assets/item_09999.bin"))));
    });

    group.finish();
}

fn bench_verified_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_read");
    let size = 1024 * 1024;
    let bytes = build(entries(4, size)).unwrap();
    let reader = PackReader::new(bytes.as_slice()).unwrap();
    let entry = reader.find("assets/item_00002.bin").unwrap().unwrap();
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("read", |b| {
        b.iter(|| black_box(reader.read(&entry).unwrap()));
    });
    group.bench_function("read_verified", |b| {
        b.iter(|| black_box(reader.read_verified(&entry).unwrap()));
    });
    group.bench_function("verify_streaming", |b| {
        b.iter(|| reader.verify(&entry).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_walk, bench_verified_read);
criterion_main!(benches);
