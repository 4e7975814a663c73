use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lava_seed::keygen;

fn bench_derive(c: &mut Criterion) {
    // Roughly the size of a compressed 640x480 frame.
    let image: Vec<u8> = (0..64 * 1024).map(|i| (i * 31 + 7) as u8).collect();

    let mut group = c.benchmark_group("derive");
    for length in [16i64, 32, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, &length| {
            b.iter(|| keygen::derive(black_box(&image), length))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_derive);
criterion_main!(benches);
