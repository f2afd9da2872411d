use criterion::{criterion_group, criterion_main, Criterion};
use riskysir::{CurveCache, EpidemicParameters, OffspringModel};
use riskysir_bench::{default_builder, scenario, HOTSPOT_FRACTIONS, RISK_TOLERANCE_MEANS};
use std::hint::black_box;

pub fn criterion_benchmark(criterion: &mut Criterion) {
    let mut criterion = criterion.benchmark_group("curve_benches");
    let template = scenario();

    for model in [OffspringModel::Poisson, OffspringModel::Binomial] {
        let builder = default_builder(model).unwrap();

        criterion.bench_function(format!("curve_{model}"), |bencher| {
            bencher.iter(|| black_box(builder.build(black_box(&template)).unwrap()));
        });

        // Nine curves, each on its own scoped thread.
        criterion.bench_function(format!("family_{model}"), |bencher| {
            bencher.iter(|| {
                black_box(
                    builder
                        .family(
                            black_box(&EpidemicParameters::default()),
                            &HOTSPOT_FRACTIONS,
                            &RISK_TOLERANCE_MEANS,
                        )
                        .unwrap(),
                )
            });
        });
    }

    let cache = CurveCache::new(default_builder(OffspringModel::Poisson).unwrap());
    cache.get_or_build(&template).unwrap();
    criterion.bench_function("curve_cache_hit", |bencher| {
        bencher.iter(|| black_box(cache.get_or_build(black_box(&template)).unwrap()));
    });

    criterion.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
