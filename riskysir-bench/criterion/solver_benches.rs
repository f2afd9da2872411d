use criterion::{criterion_group, criterion_main, Criterion};
use riskysir::{ExtinctionCalculator, FixedPointSolver, OffspringModel};
use riskysir_bench::scenario;
use std::hint::black_box;

pub fn criterion_benchmark(criterion: &mut Criterion) {
    let mut criterion = criterion.benchmark_group("solver_benches");
    let parameters = scenario();
    let calculator = ExtinctionCalculator::default();

    criterion.bench_function("extinction_poisson", |bencher| {
        bencher.iter(|| {
            black_box(
                calculator
                    .extinction_probability(black_box(&parameters), OffspringModel::Poisson)
                    .unwrap(),
            );
        });
    });

    // Dominated by the `powf` calls on the population exponent.
    criterion.bench_function("extinction_binomial", |bencher| {
        bencher.iter(|| {
            black_box(
                calculator
                    .extinction_probability(black_box(&parameters), OffspringModel::Binomial)
                    .unwrap(),
            );
        });
    });

    criterion.bench_function("extinction_homogeneous", |bencher| {
        bencher.iter(|| {
            black_box(
                calculator
                    .homogeneous_extinction_probability(black_box(parameters.r0))
                    .unwrap(),
            );
        });
    });

    let short = ExtinctionCalculator::new(FixedPointSolver::default().with_iterations(60));
    criterion.bench_function("extinction_poisson_60_iterations", |bencher| {
        bencher.iter(|| {
            black_box(
                short
                    .extinction_probability(black_box(&parameters), OffspringModel::Poisson)
                    .unwrap(),
            );
        });
    });

    criterion.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
