//! Simulate-then-fit consistency tests.

use arma_rs::{fit, generate_sample, ArmaConfig, ArmaOrder, ArmaParams, ConditionalSumOfSquares, KalmanFilter, TimeSeries};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn max_param_error(truth: &ArmaParams, n: usize, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let series = TimeSeries::new(generate_sample(truth, n, 300, &mut rng).unwrap()).unwrap();
    let config = ArmaConfig::default();
    let filter = KalmanFilter::new(config.initialization);
    let fitted = fit(&series, truth.order(), &config, &filter, None).unwrap();

    fitted
        .params
        .ar
        .iter()
        .zip(&truth.ar)
        .chain(fitted.params.ma.iter().zip(&truth.ma))
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

#[test]
fn arma11_round_trip() {
    let truth = ArmaParams::new(vec![0.6], vec![0.3], 1.0);
    let err = max_param_error(&truth, 2000, 42);
    assert!(err < 0.1, "max abs parameter error {}", err);
}

#[test]
fn estimation_error_shrinks_with_sample_size() {
    // Averaged over seeds so a single lucky short sample cannot flip the comparison
    let truth = ArmaParams::new(vec![0.5, -0.3], vec![0.4], 1.0);
    let mean_err = |n: usize| -> f64 {
        (0..8u64).map(|seed| max_param_error(&truth, n, 1000 + seed)).sum::<f64>() / 8.0
    };
    let short = mean_err(150);
    let long = mean_err(3000);
    assert!(long < short, "error did not shrink: T=150 {} vs T=3000 {}", short, long);
    assert!(long < 0.1, "T=3000 error {}", long);
}

#[test]
fn sigma2_recovered() {
    let truth = ArmaParams::new(vec![0.7], vec![], 2.5);
    let mut rng = StdRng::seed_from_u64(9);
    let series = TimeSeries::new(generate_sample(&truth, 3000, 300, &mut rng).unwrap()).unwrap();
    let config = ArmaConfig::default();
    let fitted = fit(&series, ArmaOrder::new(1, 0), &config, &KalmanFilter::new(config.initialization), None)
        .unwrap();
    assert!(
        (fitted.params.sigma2 - 2.5).abs() < 0.2,
        "sigma2_hat = {}",
        fitted.params.sigma2
    );
}

#[test]
fn css_and_exact_likelihood_agree_on_long_series() {
    let truth = ArmaParams::new(vec![0.6], vec![0.3], 1.0);
    let mut rng = StdRng::seed_from_u64(17);
    let series = TimeSeries::new(generate_sample(&truth, 3000, 300, &mut rng).unwrap()).unwrap();
    let config = ArmaConfig::default();
    let order = ArmaOrder::new(1, 1);

    let exact = fit(&series, order, &config, &KalmanFilter::new(config.initialization), None).unwrap();
    let css = fit(&series, order, &config, &ConditionalSumOfSquares, None).unwrap();
    assert!((exact.params.ar[0] - css.params.ar[0]).abs() < 0.05);
    assert!((exact.params.ma[0] - css.params.ma[0]).abs() < 0.05);
    assert!(css.method.ends_with("/css"));
}
