//! Benchmarks for memory access patterns

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gk_memory::{MemorySystem, GAMECUBE_CACHED_BASE, GAMECUBE_UNCACHED_BASE};

fn bench_sequential_read_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_access");

    for size in [1024u32, 4096, 16384, 65536].iter() {
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("write", size), size, |b, &size| {
            let mut mem = MemorySystem::gamecube();

            b.iter(|| {
                for i in (0..size).step_by(4) {
                    mem.write_be32(GAMECUBE_CACHED_BASE + i, black_box(0xDEADBEEF))
                        .unwrap();
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("read", size), size, |b, &size| {
            let mut mem = MemorySystem::gamecube();
            for i in (0..size).step_by(4) {
                mem.write_be32(GAMECUBE_CACHED_BASE + i, i).unwrap();
            }

            b.iter(|| {
                let mut sum = 0u64;
                for i in (0..size).step_by(4) {
                    sum = sum.wrapping_add(mem.read_be32(GAMECUBE_CACHED_BASE + i).unwrap() as u64);
                }
                black_box(sum);
            });
        });
    }

    group.finish();
}

fn bench_alias_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("alias_access");

    const NUM_OPERATIONS: u32 = 1000;
    const RANDOM_STEP: u32 = 97; // Prime number for pseudo-random distribution

    let mut mem = MemorySystem::gamecube();
    let offsets: Vec<u32> = (0..NUM_OPERATIONS)
        .map(|i| (i * RANDOM_STEP) % 0x4000 * 4)
        .collect();

    group.bench_function("cached", |b| {
        b.iter(|| {
            for &offset in &offsets {
                black_box(mem.read_be32(GAMECUBE_CACHED_BASE + offset).unwrap());
            }
        });
    });

    group.bench_function("uncached", |b| {
        b.iter(|| {
            for &offset in &offsets {
                black_box(mem.read_be32(GAMECUBE_UNCACHED_BASE + offset).unwrap());
            }
        });
    });

    group.bench_function("load_image", |b| {
        let image = vec![0x60u8; 0x1000];
        b.iter(|| mem.load_image(GAMECUBE_CACHED_BASE, black_box(&image)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_sequential_read_write, bench_alias_access);
criterion_main!(benches);
