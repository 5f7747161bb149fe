use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use pinch_core::kernels::{adaptive_threshold, bandpass, robust_z, tkeo};

// Tiny xorshift PRNG: deterministic, no extra dependency.
fn synth_trace(n: usize, noise_amp: f64, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (x as f64) / (u32::MAX as f64 + 1.0)
    };
    (0..n)
        .map(|i| {
            let t = i as f64 / 100.0;
            t.sin() + (next_f64() * 2.0 - 1.0) * noise_amp
        })
        .collect()
}

pub fn bench_kernels(c: &mut Criterion) {
    let mut g = c.benchmark_group("kernels");
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(30);
    }

    let fs = 100.0;
    let n = 10_000usize;
    let trace = synth_trace(n, 0.05, 0xC0FFEE);

    g.bench_function("robust_z", |b| {
        b.iter_batched(
            || trace.clone(),
            |x| black_box(robust_z(black_box(&x), fs, 0.5)),
            BatchSize::SmallInput,
        )
    });

    g.bench_function("tkeo", |b| {
        b.iter_batched(
            || trace.clone(),
            |x| black_box(tkeo(black_box(&x))),
            BatchSize::SmallInput,
        )
    });

    g.bench_function("bandpass", |b| {
        b.iter_batched(
            || trace.clone(),
            |x| black_box(bandpass(black_box(&x), fs, 3.0, 20.0, 2)),
            BatchSize::SmallInput,
        )
    });

    g.bench_function("adaptive_threshold", |b| {
        let score = robust_z(&trace, fs, 0.5);
        b.iter_batched(
            || score.clone(),
            |s| black_box(adaptive_threshold(black_box(&s), fs, 0.5, 5.5)),
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(kernels, bench_kernels);
criterion_main!(kernels);
