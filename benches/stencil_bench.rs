use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use poisson_slab::algs::reduction::local_norm;
use poisson_slab::algs::stencil::sweep;
use poisson_slab::config::SolverConfig;
use poisson_slab::data::Grid;
use poisson_slab::worker_group::run_local;

fn ramp(n: usize) -> Grid {
    let mut g = Grid::zeros(n, n);
    for i in 0..n + 2 {
        g.set(i, 0, 10.0);
    }
    for (k, v) in g.as_mut_slice().iter_mut().enumerate() {
        *v += (k % 17) as f32 * 0.01;
    }
    g
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for &n in &[64usize, 256, 1024] {
        let current = ramp(n);
        let rho = Grid::zeros(n, n);
        let mut next = current.clone();

        group.bench_with_input(BenchmarkId::new("sweep", n), &n, |b, _| {
            b.iter(|| sweep(black_box(&current), &mut next, &rho, 0.01))
        });

        sweep(&current, &mut next, &rho, 0.01).expect("matching shapes");
        group.bench_with_input(BenchmarkId::new("local_norm", n), &n, |b, _| {
            b.iter(|| local_norm(black_box(&current), black_box(&next)))
        });
    }

    group.finish();
}

fn bench_local_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_group");
    group.sample_size(10);

    let cfg = SolverConfig {
        rows: 128,
        cols: 128,
        max_iterations: 50,
        residual: 1e-30,
        ..SolverConfig::default()
    };
    for &workers in &[1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("run_local", workers), &workers, |b, &w| {
            b.iter(|| run_local(&cfg, w).expect("valid job"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sweep, bench_local_group);
criterion_main!(benches);
