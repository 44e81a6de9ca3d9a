use std::hint::black_box;

use arma_rs::{fit, generate_sample, ArmaConfig, ArmaOrder, ArmaParams, KalmanFilter, OrderSelector, TimeSeries};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sample() -> TimeSeries {
    let params = ArmaParams::new(vec![0.6], vec![0.3], 1.0);
    let data = generate_sample(&params, 500, 100, &mut StdRng::seed_from_u64(7)).unwrap();
    TimeSeries::new(data).unwrap()
}

fn bench_fit_arma11(c: &mut Criterion) {
    let series = sample();
    let config = ArmaConfig::default();
    let filter = KalmanFilter::new(config.initialization);
    c.bench_function("fit_arma11_n500", |b| {
        b.iter(|| fit(black_box(&series), ArmaOrder::new(1, 1), &config, &filter, None).unwrap())
    });
}

fn bench_select_2x2(c: &mut Criterion) {
    let series = sample();
    let selector = OrderSelector::new(ArmaConfig {
        max_ar: 2,
        max_ma: 2,
        ..Default::default()
    })
    .unwrap();
    let mut group = c.benchmark_group("select");
    group.sample_size(10);
    group.bench_function("select_2x2_n500", |b| {
        b.iter(|| selector.select(black_box(&series)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_fit_arma11, bench_select_2x2);
criterion_main!(benches);
