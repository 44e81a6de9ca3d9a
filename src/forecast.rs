use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{ArmaError, Result};
use crate::kalman::{KalmanFilter, KalmanOutput};
use crate::params::ArmaParams;
use crate::state_space::StateSpace;
use crate::types::InitializationMode;

/// H-step ahead forecast result.
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Forecast means E[y_{n+h}] for h = 1..steps.
    pub mean: Vec<f64>,
    /// Forecast variances Var[y_{n+h}].
    pub variance: Vec<f64>,
    /// Lower confidence interval bounds.
    pub ci_lower: Vec<f64>,
    /// Upper confidence interval bounds.
    pub ci_upper: Vec<f64>,
}

/// Residual diagnostics output.
#[derive(Debug, Clone)]
pub struct ResidualOutput {
    /// Raw innovations e_t.
    pub residuals: Vec<f64>,
    /// Standardized residuals e_t / sqrt(v_t * sigma2).
    pub standardized_residuals: Vec<f64>,
}

/// Two-sided normal quantile for a (1 - alpha) interval.
fn z_score(alpha: f64) -> Result<f64> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(ArmaError::InvalidConfig(format!(
            "alpha must lie in (0, 1), got {}",
            alpha
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| ArmaError::InvalidConfig(e.to_string()))?;
    Ok(normal.inverse_cdf(1.0 - alpha / 2.0))
}

/// Compute h-step ahead forecast from the final Kalman filter state.
///
/// Uses state-space forward propagation:
///   y_hat_h = Z' * a_h + mean
///   F_h     = Z' * P_h * Z * sigma2
///   a_{h+1} = T * a_h
///   P_{h+1} = T * P_h * T' + R R'
pub fn forecast(
    ss: &StateSpace,
    filter_output: &KalmanOutput,
    sigma2: f64,
    mean: f64,
    steps: usize,
    alpha: f64,
) -> Result<ForecastResult> {
    let z_alpha = z_score(alpha)?;

    let z = &ss.design;
    let t_mat = &ss.transition;
    let rrt = ss.rrt();

    // Start from predicted state a_{n+1|n}, P_{n+1|n}
    let mut a = filter_output.predicted_state.clone();
    let mut p = filter_output.predicted_cov.clone();

    let mut result = ForecastResult {
        mean: Vec::with_capacity(steps),
        variance: Vec::with_capacity(steps),
        ci_lower: Vec::with_capacity(steps),
        ci_upper: Vec::with_capacity(steps),
    };

    for _ in 0..steps {
        let y_hat = z.dot(&a) + mean;
        let f_h = (z.dot(&(&p * z)) * sigma2).max(0.0);
        let se = f_h.sqrt();

        result.mean.push(y_hat);
        result.variance.push(f_h);
        result.ci_lower.push(y_hat - z_alpha * se);
        result.ci_upper.push(y_hat + z_alpha * se);

        a = t_mat * &a;
        p = t_mat * &p * t_mat.transpose() + &rrt;
    }

    Ok(result)
}

/// Compute residuals and standardized residuals from Kalman filter output.
pub fn compute_residuals(filter_output: &KalmanOutput, sigma2: f64) -> ResidualOutput {
    let innovations = &filter_output.innovations;
    ResidualOutput {
        residuals: innovations.errors.clone(),
        standardized_residuals: innovations.standardized(sigma2),
    }
}

fn centered(endog: &[f64], mean: f64) -> Vec<f64> {
    endog.iter().map(|v| v - mean).collect()
}

/// Run forecast pipeline: build state space → filter → forecast.
///
/// `mean` is removed before filtering and added back to the forecasts.
pub fn forecast_pipeline(
    endog: &[f64],
    params: &ArmaParams,
    mean: f64,
    init: InitializationMode,
    steps: usize,
    alpha: f64,
) -> Result<ForecastResult> {
    let ss = StateSpace::new(params);
    let fo = KalmanFilter::new(init).run(&centered(endog, mean), params)?;
    forecast(&ss, &fo, params.sigma2, mean, steps, alpha)
}

/// Run residuals pipeline: build state space → filter → residuals.
pub fn residuals_pipeline(
    endog: &[f64],
    params: &ArmaParams,
    mean: f64,
    init: InitializationMode,
) -> Result<ResidualOutput> {
    let fo = KalmanFilter::new(init).run(&centered(endog, mean), params)?;
    Ok(compute_residuals(&fo, params.sigma2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::generate_sample;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ar1_data(phi: f64) -> Vec<f64> {
        let params = ArmaParams::new(vec![phi], vec![], 1.0);
        let mut rng = StdRng::seed_from_u64(42);
        generate_sample(&params, 300, 100, &mut rng).unwrap()
    }

    #[test]
    fn test_z_score_standard() {
        assert!((z_score(0.05).unwrap() - 1.959964).abs() < 1e-5);
        assert!((z_score(0.10).unwrap() - 1.644854).abs() < 1e-5);
        assert!(z_score(0.0).is_err());
        assert!(z_score(1.5).is_err());
    }

    #[test]
    fn test_forecast_ar1_mean() {
        // AR(1): forecast(h) = phi^h * y_n
        let phi = 0.65;
        let data = ar1_data(phi);
        let params = ArmaParams::new(vec![phi], vec![], 1.0);
        let result =
            forecast_pipeline(&data, &params, 0.0, InitializationMode::StationaryCovariance, 5, 0.05)
                .unwrap();
        assert_eq!(result.mean.len(), 5);
        let last = data[data.len() - 1];
        for h in 0..5 {
            let expected = phi.powi(h as i32 + 1) * last;
            assert!((result.mean[h] - expected).abs() < 1e-10);
        }
        // Var(h) = sigma2 * sum_{j<h} phi^{2j}
        assert!((result.variance[0] - 1.0).abs() < 1e-10);
        assert!((result.variance[1] - (1.0 + phi * phi)).abs() < 1e-10);
        for i in 1..result.variance.len() {
            assert!(result.variance[i] >= result.variance[i - 1]);
        }
    }

    #[test]
    fn test_forecast_reverts_to_mean() {
        let data: Vec<f64> = ar1_data(0.5).iter().map(|v| v + 10.0).collect();
        let params = ArmaParams::new(vec![0.5], vec![], 1.0);
        let result =
            forecast_pipeline(&data, &params, 10.0, InitializationMode::ZeroPadding, 60, 0.05)
                .unwrap();
        assert!((result.mean[59] - 10.0).abs() < 1e-8);
        // Long-run variance sigma2 / (1 - phi^2)
        assert!((result.variance[59] - 1.0 / 0.75).abs() < 1e-8);
    }

    #[test]
    fn test_forecast_ci_symmetric() {
        let data = ar1_data(0.65);
        let params = ArmaParams::new(vec![0.65], vec![0.2], 2.0);
        let result =
            forecast_pipeline(&data, &params, 0.0, InitializationMode::StationaryCovariance, 5, 0.05)
                .unwrap();
        for i in 0..5 {
            let lower_dist = result.mean[i] - result.ci_lower[i];
            let upper_dist = result.ci_upper[i] - result.mean[i];
            assert!((lower_dist - upper_dist).abs() < 1e-10);
            assert!(lower_dist > 0.0);
        }
    }

    #[test]
    fn test_ma1_forecast_horizon() {
        // Beyond lag q the MA forecast is the mean
        let data = ar1_data(0.3);
        let params = ArmaParams::new(vec![], vec![0.4], 1.0);
        let result =
            forecast_pipeline(&data, &params, 0.0, InitializationMode::StationaryCovariance, 3, 0.05)
                .unwrap();
        assert!(result.mean[1].abs() < 1e-12);
        assert!((result.variance[1] - 1.16).abs() < 1e-10);
    }

    #[test]
    fn test_forecast_zero_steps() {
        let data = ar1_data(0.65);
        let params = ArmaParams::new(vec![0.65], vec![], 1.0);
        let result =
            forecast_pipeline(&data, &params, 0.0, InitializationMode::ZeroPadding, 0, 0.05).unwrap();
        assert!(result.mean.is_empty());
    }

    #[test]
    fn test_residuals_length() {
        let data = ar1_data(0.65);
        let params = ArmaParams::new(vec![0.65], vec![], 1.0);
        let result =
            residuals_pipeline(&data, &params, 0.0, InitializationMode::StationaryCovariance).unwrap();
        assert_eq!(result.residuals.len(), data.len());
        assert_eq!(result.standardized_residuals.len(), data.len());
    }

    #[test]
    fn test_standardized_residuals_scale() {
        let data = ar1_data(0.65);
        let params = ArmaParams::new(vec![0.65], vec![], 1.0);
        let result =
            residuals_pipeline(&data, &params, 0.0, InitializationMode::StationaryCovariance).unwrap();
        let std_res = &result.standardized_residuals;
        let n = std_res.len() as f64;
        let mean = std_res.iter().sum::<f64>() / n;
        let var = std_res.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        assert!(var > 0.7 && var < 1.3, "standardized residual variance {}", var);
    }
}
