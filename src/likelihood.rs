//! Gaussian log-likelihood of ARMA innovations.

use std::f64::consts::PI;

use crate::error::{ArmaError, Result};
use crate::kalman::{Innovations, InnovationsFilter};
use crate::optimizer::{transform_params, Objective};
use crate::params::ArmaParams;
use crate::types::ArmaOrder;

/// How the innovation variance enters the likelihood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// sigma2 is profiled out: sigma2_hat = (1/T) sum e_t^2 / v_t.
    Concentrated,
    /// sigma2 is a free parameter.
    Fixed(f64),
}

/// Evaluated log-likelihood together with the variance it was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogLikelihood {
    pub loglike: f64,
    pub sigma2: f64,
    pub n_obs: usize,
}

/// Gaussian log-likelihood of a sequence of innovations.
///
/// Exact:
///   ll = -T/2 ln(2pi) - 1/2 sum ln(sigma2 v_t) - 1/2 sum e_t^2 / (sigma2 v_t)
///
/// Concentrated:
///   ll = -T/2 (ln(2pi) + ln(sigma2_hat) + 1) - 1/2 sum ln(v_t)
pub fn gaussian_loglike(innovations: &Innovations, scale: Scale) -> Result<LogLikelihood> {
    let n = innovations.len();
    if n == 0 {
        return Err(ArmaError::DegenerateLikelihood("no innovations".into()));
    }
    if innovations.variances.iter().all(|&v| v == 0.0) {
        return Err(ArmaError::DegenerateLikelihood(
            "all innovation variances are zero".into(),
        ));
    }

    let n_f = n as f64;
    let mut sum_log_v = 0.0;
    let mut sum_e2_v = 0.0;
    for (e, v) in innovations.errors.iter().zip(&innovations.variances) {
        sum_log_v += v.ln();
        sum_e2_v += e * e / v;
    }

    if !(sum_e2_v > 0.0) {
        return Err(ArmaError::DegenerateLikelihood(format!(
            "innovations carry no variation: sum e_t^2 / v_t = {}",
            sum_e2_v
        )));
    }

    let (loglike, sigma2) = match scale {
        Scale::Concentrated => {
            let sigma2_hat = sum_e2_v / n_f;
            if !(sigma2_hat > 0.0) {
                return Err(ArmaError::DegenerateLikelihood(format!(
                    "concentrated variance is not positive: {}",
                    sigma2_hat
                )));
            }
            let ll = -0.5 * n_f * ((2.0 * PI).ln() + sigma2_hat.ln() + 1.0) - 0.5 * sum_log_v;
            (ll, sigma2_hat)
        }
        Scale::Fixed(sigma2) => {
            if !(sigma2 > 0.0) {
                return Err(ArmaError::DegenerateLikelihood(format!(
                    "innovation variance is not positive: {}",
                    sigma2
                )));
            }
            let ll = -0.5 * n_f * (2.0 * PI).ln()
                - 0.5 * (sum_log_v + n_f * sigma2.ln())
                - 0.5 * sum_e2_v / sigma2;
            (ll, sigma2)
        }
    };

    if !loglike.is_finite() {
        return Err(ArmaError::DegenerateLikelihood(format!(
            "log-likelihood is not finite: {}",
            loglike
        )));
    }

    Ok(LogLikelihood {
        loglike,
        sigma2,
        n_obs: n,
    })
}

/// Log-likelihood of an ARMA(p,q) model on a fixed series, as a function of
/// the unconstrained optimizer parameters.
pub struct ArmaLikelihood<'a> {
    pub series: &'a [f64],
    pub order: ArmaOrder,
    pub filter: &'a dyn InnovationsFilter,
    pub concentrate_variance: bool,
    pub enforce_stationarity: bool,
    pub enforce_invertibility: bool,
}

impl<'a> ArmaLikelihood<'a> {
    /// Map unconstrained parameters to model parameters.
    pub fn params_at(&self, unconstrained: &[f64]) -> Result<ArmaParams> {
        let constrained = transform_params(
            unconstrained,
            self.order,
            self.concentrate_variance,
            self.enforce_stationarity,
            self.enforce_invertibility,
        )?;
        ArmaParams::from_flat(&constrained, self.order, !self.concentrate_variance)
    }

    /// Evaluate at model parameters. In concentrated mode the returned
    /// `sigma2` is the profiled estimate.
    pub fn evaluate(&self, params: &ArmaParams) -> Result<(LogLikelihood, Innovations)> {
        if !self.enforce_stationarity && !params.is_stationary() {
            return Err(ArmaError::NumericalInstability {
                t: 0,
                detail: "AR polynomial is not stationary".into(),
            });
        }
        let innovations = self.filter.filter(self.series, params)?;
        let scale = if self.concentrate_variance {
            Scale::Concentrated
        } else {
            Scale::Fixed(params.sigma2)
        };
        let ll = gaussian_loglike(&innovations, scale)?;
        Ok((ll, innovations))
    }
}

impl Objective for ArmaLikelihood<'_> {
    fn dim(&self) -> usize {
        self.order.p + self.order.q + usize::from(!self.concentrate_variance)
    }

    fn loglike(&self, unconstrained: &[f64]) -> Result<f64> {
        let params = self.params_at(unconstrained)?;
        self.evaluate(&params).map(|(ll, _)| ll.loglike)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kalman::KalmanFilter;
    use crate::types::InitializationMode;

    fn white(errors: Vec<f64>) -> Innovations {
        let n = errors.len();
        Innovations {
            errors,
            variances: vec![1.0; n],
        }
    }

    #[test]
    fn test_concentrated_white_noise() {
        let inn = white(vec![1.0, -1.0, 2.0, -2.0]);
        let ll = gaussian_loglike(&inn, Scale::Concentrated).unwrap();
        let sigma2: f64 = 2.5;
        let expected = -2.0 * ((2.0 * PI).ln() + sigma2.ln() + 1.0);
        assert!((ll.sigma2 - sigma2).abs() < 1e-12);
        assert!((ll.loglike - expected).abs() < 1e-12);
        assert_eq!(ll.n_obs, 4);
    }

    #[test]
    fn test_concentrated_equals_exact_at_sigma2_hat() {
        let inn = Innovations {
            errors: vec![0.4, -1.1, 0.7, 0.2, -0.5],
            variances: vec![1.8, 1.2, 1.05, 1.01, 1.0],
        };
        let conc = gaussian_loglike(&inn, Scale::Concentrated).unwrap();
        let exact = gaussian_loglike(&inn, Scale::Fixed(conc.sigma2)).unwrap();
        assert!((conc.loglike - exact.loglike).abs() < 1e-10);
    }

    #[test]
    fn test_exact_maximized_at_sigma2_hat() {
        let inn = white(vec![0.4, -1.1, 0.7, 0.2, -0.5]);
        let conc = gaussian_loglike(&inn, Scale::Concentrated).unwrap();
        for s in [0.5 * conc.sigma2, 2.0 * conc.sigma2] {
            let ll = gaussian_loglike(&inn, Scale::Fixed(s)).unwrap();
            assert!(ll.loglike < conc.loglike);
        }
    }

    #[test]
    fn test_zero_residuals_degenerate() {
        let inn = white(vec![0.0; 5]);
        for scale in [Scale::Concentrated, Scale::Fixed(1.0)] {
            let err = gaussian_loglike(&inn, scale).unwrap_err();
            assert!(matches!(err, ArmaError::DegenerateLikelihood(_)), "{:?}", scale);
        }
    }

    #[test]
    fn test_zero_variances_degenerate() {
        let inn = Innovations {
            errors: vec![1.0, 2.0],
            variances: vec![0.0, 0.0],
        };
        assert!(matches!(
            gaussian_loglike(&inn, Scale::Concentrated),
            Err(ArmaError::DegenerateLikelihood(_))
        ));
    }

    #[test]
    fn test_empty_degenerate() {
        assert!(gaussian_loglike(&Innovations::default(), Scale::Fixed(1.0)).is_err());
    }

    #[test]
    fn test_objective_dimension_and_value() {
        let series = vec![0.3, -0.8, 1.2, 0.5, -0.1, 0.9, -1.4, 0.2];
        let filter = KalmanFilter::new(InitializationMode::StationaryCovariance);
        let lik = ArmaLikelihood {
            series: &series,
            order: ArmaOrder::new(1, 1),
            filter: &filter,
            concentrate_variance: true,
            enforce_stationarity: true,
            enforce_invertibility: true,
        };
        assert_eq!(lik.dim(), 2);
        let ll = lik.loglike(&[0.2, -0.1]).unwrap();
        assert!(ll.is_finite());

        let params = lik.params_at(&[0.2, -0.1]).unwrap();
        assert!(params.is_stationary() && params.is_invertible());
    }

    #[test]
    fn test_unenforced_nonstationary_rejected() {
        let series = vec![0.3, -0.8, 1.2, 0.5];
        let filter = KalmanFilter::new(InitializationMode::ZeroPadding);
        let lik = ArmaLikelihood {
            series: &series,
            order: ArmaOrder::new(1, 0),
            filter: &filter,
            concentrate_variance: true,
            enforce_stationarity: false,
            enforce_invertibility: false,
        };
        assert!(lik.loglike(&[1.5]).is_err());
        assert!(lik.loglike(&[0.5]).is_ok());
    }
}
