use std::hint::black_box;

use arma_rs::kalman::{InnovationsFilter, KalmanFilter};
use arma_rs::likelihood::{gaussian_loglike, Scale};
use arma_rs::{generate_sample, ArmaParams, InitializationMode};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_kalman_arma21(c: &mut Criterion) {
    let params = ArmaParams::new(vec![0.5, -0.2], vec![0.3], 1.0);
    let data = generate_sample(&params, 1000, 200, &mut StdRng::seed_from_u64(42)).unwrap();

    for mode in [InitializationMode::ZeroPadding, InitializationMode::StationaryCovariance] {
        let filter = KalmanFilter::new(mode);
        c.bench_function(&format!("{}_arma21_n1000", filter.name()), |b| {
            b.iter(|| {
                let innovations = filter.filter(black_box(&data), black_box(&params)).unwrap();
                gaussian_loglike(&innovations, Scale::Concentrated).unwrap()
            })
        });
    }
}

criterion_group!(benches, bench_kalman_arma21);
criterion_main!(benches);
