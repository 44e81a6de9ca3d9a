//! ARMA parameter optimization via L-BFGS with Nelder-Mead fallback.
//!
//! This module provides:
//! - Parameter space transformations (constrained ↔ unconstrained)
//! - The `Objective` contract and its negative log-likelihood adapter for argmin
//! - `fit()`: the maximum-likelihood entry point for a single order

use std::time::{Duration, Instant};

use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::neldermead::NelderMead;
use argmin::solver::quasinewton::LBFGS;
use finitediff::FiniteDiff;
use tracing::{debug, warn};

use crate::error::{ArmaError, Result};
use crate::kalman::InnovationsFilter;
use crate::likelihood::{gaussian_loglike, ArmaLikelihood, Scale};
use crate::params::{self, ArmaParams};
use crate::series::TimeSeries;
use crate::start_params::compute_start_params;
use crate::types::{ArmaConfig, ArmaOrder, FitResult, FitStatus};

/// Cost assigned to trial points where the likelihood cannot be evaluated.
const INFEASIBLE_COST: f64 = 1e10;

// ---------------------------------------------------------------------------
// Parameter transformations (constrained ↔ unconstrained)
// ---------------------------------------------------------------------------

/// Layout: `[ar(p) | ma(q) | sigma2?]`
fn expected_param_len(order: ArmaOrder, concentrate_variance: bool) -> usize {
    order.p + order.q + usize::from(!concentrate_variance)
}

/// Transform constrained parameters to unconstrained space for optimization.
pub fn untransform_params(
    constrained: &[f64],
    order: ArmaOrder,
    concentrate_variance: bool,
    enforce_stationarity: bool,
    enforce_invertibility: bool,
) -> Result<Vec<f64>> {
    let expected = expected_param_len(order, concentrate_variance);
    if constrained.len() != expected {
        return Err(ArmaError::ParamLengthMismatch {
            expected,
            got: constrained.len(),
        });
    }
    let (p, q) = (order.p, order.q);
    let mut out = Vec::with_capacity(expected);

    if enforce_stationarity {
        out.extend(params::unconstrain_stationary(&constrained[..p]));
    } else {
        out.extend_from_slice(&constrained[..p]);
    }

    if enforce_invertibility {
        out.extend(params::unconstrain_invertible(&constrained[p..p + q]));
    } else {
        out.extend_from_slice(&constrained[p..p + q]);
    }

    if !concentrate_variance {
        out.push(params::unconstrain_variance(constrained[p + q])?);
    }

    Ok(out)
}

/// Transform unconstrained parameters back to constrained space.
pub fn transform_params(
    unconstrained: &[f64],
    order: ArmaOrder,
    concentrate_variance: bool,
    enforce_stationarity: bool,
    enforce_invertibility: bool,
) -> Result<Vec<f64>> {
    let expected = expected_param_len(order, concentrate_variance);
    if unconstrained.len() != expected {
        return Err(ArmaError::ParamLengthMismatch {
            expected,
            got: unconstrained.len(),
        });
    }
    let (p, q) = (order.p, order.q);
    let mut out = Vec::with_capacity(expected);

    if enforce_stationarity {
        out.extend(params::constrain_stationary(&unconstrained[..p]));
    } else {
        out.extend_from_slice(&unconstrained[..p]);
    }

    if enforce_invertibility {
        out.extend(params::constrain_invertible(&unconstrained[p..p + q]));
    } else {
        out.extend_from_slice(&unconstrained[p..p + q]);
    }

    if !concentrate_variance {
        out.push(params::constrain_variance(unconstrained[p + q]));
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Objective contract and argmin adapter
// ---------------------------------------------------------------------------

/// A log-likelihood over an unconstrained parameter vector.
///
/// The optimizer only sees this contract; it knows nothing about filters or
/// state-space models.
pub trait Objective {
    fn dim(&self) -> usize;
    fn loglike(&self, unconstrained: &[f64]) -> Result<f64>;
}

/// Negative log-likelihood seen by argmin (which minimizes).
struct NegLogLike<'a, O: Objective + ?Sized> {
    objective: &'a O,
}

impl<O: Objective + ?Sized> NegLogLike<'_, O> {
    fn eval(&self, x: &[f64]) -> f64 {
        match self.objective.loglike(x) {
            Ok(ll) if ll.is_finite() => -ll,
            _ => INFEASIBLE_COST,
        }
    }
}

impl<O: Objective + ?Sized> CostFunction for NegLogLike<'_, O> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Vec<f64>) -> std::result::Result<f64, argmin::core::Error> {
        Ok(self.eval(param))
    }
}

impl<O: Objective + ?Sized> Gradient for NegLogLike<'_, O> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    /// Central differences first; forward differences when a central stencil
    /// touches an infeasible point.
    fn gradient(&self, param: &Vec<f64>) -> std::result::Result<Vec<f64>, argmin::core::Error> {
        let f = |x: &Vec<f64>| self.eval(x);
        let usable = |g: &[f64]| g.iter().all(|v| v.is_finite() && v.abs() < INFEASIBLE_COST / 1e3);

        let grad = param.central_diff(&f);
        if usable(&grad) {
            return Ok(grad);
        }
        let grad = param.forward_diff(&f);
        if usable(&grad) {
            return Ok(grad);
        }
        Err(ArmaError::NumericalInstability {
            t: 0,
            detail: "finite-difference gradient crosses an infeasible region".into(),
        }
        .into())
    }
}

// ---------------------------------------------------------------------------
// Search drivers
// ---------------------------------------------------------------------------

/// Stopping rules for one maximization.
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub tolerance: f64,
    pub max_iterations: u64,
    pub timeout: Option<Duration>,
}

impl SearchSettings {
    pub fn from_config(config: &ArmaConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            timeout: config.per_fit_timeout,
        }
    }
}

/// Best point found by a maximization.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub x: Vec<f64>,
    pub loglike: f64,
    pub n_iter: u64,
    pub status: FitStatus,
    pub method: &'static str,
}

fn status_from(reason: Option<&TerminationReason>) -> FitStatus {
    match reason {
        Some(TerminationReason::SolverConverged) | Some(TerminationReason::TargetCostReached) => {
            FitStatus::Converged
        }
        Some(TerminationReason::Timeout) => FitStatus::TimedOut,
        _ => FitStatus::NotConverged,
    }
}

fn run_lbfgs<O: Objective + ?Sized>(
    objective: &O,
    init_params: Vec<f64>,
    tol_grad: f64,
    tol_cost: f64,
    maxiter: u64,
    timeout: Option<Duration>,
) -> std::result::Result<(Vec<f64>, f64, u64, FitStatus), String> {
    let linesearch = MoreThuenteLineSearch::new();
    let solver = LBFGS::new(linesearch, 10)
        .with_tolerance_grad(tol_grad)
        .map_err(|e| e.to_string())?
        .with_tolerance_cost(tol_cost)
        .map_err(|e| e.to_string())?;

    let mut executor = Executor::new(NegLogLike { objective }, solver).configure(
        |state: argmin::core::IterState<Vec<f64>, Vec<f64>, (), (), (), f64>| {
            state.param(init_params).max_iters(maxiter)
        },
    );
    if let Some(limit) = timeout {
        executor = executor.timeout(limit);
    }
    let result = executor.run().map_err(|e| format!("L-BFGS failed: {}", e))?;

    let state = result.state();
    let best_param = state
        .get_best_param()
        .ok_or("L-BFGS: no best parameter found")?
        .clone();
    let best_cost = state.get_best_cost();
    let n_iter = state.get_iter();
    let status = status_from(state.get_termination_reason());

    Ok((best_param, best_cost, n_iter, status))
}

fn run_nelder_mead<O: Objective + ?Sized>(
    objective: &O,
    init_params: Vec<f64>,
    sd_tolerance: f64,
    maxiter: u64,
    timeout: Option<Duration>,
) -> std::result::Result<(Vec<f64>, f64, u64, FitStatus), String> {
    let n = init_params.len();

    // Build simplex: n+1 vertices
    let mut simplex = vec![init_params.clone()];
    for i in 0..n {
        let mut vertex = init_params.clone();
        let delta = if vertex[i].abs() > 1e-8 {
            vertex[i] * 0.05
        } else {
            0.00025
        };
        vertex[i] += delta;
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(sd_tolerance)
        .map_err(|e| e.to_string())?;

    let mut executor = Executor::new(NegLogLike { objective }, solver).configure(
        |state: argmin::core::IterState<Vec<f64>, (), (), (), (), f64>| state.max_iters(maxiter),
    );
    if let Some(limit) = timeout {
        executor = executor.timeout(limit);
    }
    let result = executor
        .run()
        .map_err(|e| format!("Nelder-Mead failed: {}", e))?;

    let state = result.state();
    let best_param = state
        .get_best_param()
        .ok_or("Nelder-Mead: no best parameter found")?
        .clone();
    let best_cost = state.get_best_cost();
    let n_iter = state.get_iter();
    let status = status_from(state.get_termination_reason());

    Ok((best_param, best_cost, n_iter, status))
}

/// Maximize `objective` from `start`.
///
/// Exhausting the iteration budget or the timeout is not an error: the best
/// iterate is returned with the matching status. An error is returned only
/// when neither `start` nor the origin can be evaluated.
pub fn maximize<O: Objective + ?Sized>(
    objective: &O,
    start: Vec<f64>,
    settings: &SearchSettings,
) -> Result<SearchOutcome> {
    let started = Instant::now();
    let dim = objective.dim();
    if start.len() != dim {
        return Err(ArmaError::ParamLengthMismatch {
            expected: dim,
            got: start.len(),
        });
    }

    // Feasible starting point: the given one, else the origin
    let (start, ll0) = match objective.loglike(&start) {
        Ok(ll) if ll.is_finite() => (start, ll),
        first => {
            let origin = vec![0.0; dim];
            match objective.loglike(&origin) {
                Ok(ll) if ll.is_finite() => {
                    debug!(reason = ?first.err(), "start point infeasible, restarting at origin");
                    (origin, ll)
                }
                Ok(ll) => {
                    return Err(ArmaError::OptimizationFailed(format!(
                        "log-likelihood at start and origin is not finite: {}",
                        ll
                    )))
                }
                Err(e) => return Err(e),
            }
        }
    };

    if dim == 0 {
        return Ok(SearchOutcome {
            x: start,
            loglike: ll0,
            n_iter: 0,
            status: FitStatus::Converged,
            method: "closed-form",
        });
    }
    if settings.max_iterations == 0 {
        return Ok(SearchOutcome {
            x: start,
            loglike: ll0,
            n_iter: 0,
            status: FitStatus::NotConverged,
            method: "start",
        });
    }

    let tol_cost = settings.tolerance * ll0.abs().max(1.0);
    let lbfgs = run_lbfgs(
        objective,
        start.clone(),
        settings.tolerance,
        tol_cost,
        settings.max_iterations,
        settings.timeout,
    );

    let (x, cost, n_iter, status, method) = match lbfgs {
        Ok((x, cost, n, status)) if cost < INFEASIBLE_COST => (x, cost, n, status, "lbfgs"),
        other => {
            let reason = match other {
                Err(e) => e,
                Ok(_) => "L-BFGS found no feasible point".to_string(),
            };
            let remaining = settings
                .timeout
                .map(|limit| limit.saturating_sub(started.elapsed()));
            if remaining == Some(Duration::ZERO) {
                return Ok(SearchOutcome {
                    x: start,
                    loglike: ll0,
                    n_iter: 0,
                    status: FitStatus::TimedOut,
                    method: "start",
                });
            }
            warn!(%reason, "L-BFGS aborted, falling back to Nelder-Mead");
            let (x, cost, n, status) = run_nelder_mead(
                objective,
                start.clone(),
                tol_cost,
                settings.max_iterations,
                remaining,
            )
            .map_err(ArmaError::OptimizationFailed)?;
            (x, cost, n, status, "nelder-mead (fallback)")
        }
    };

    // Never return a point worse than the start
    if !(cost < INFEASIBLE_COST) || -cost < ll0 {
        return Ok(SearchOutcome {
            x: start,
            loglike: ll0,
            n_iter,
            status,
            method,
        });
    }

    Ok(SearchOutcome {
        x,
        loglike: -cost,
        n_iter,
        status,
        method,
    })
}

// ---------------------------------------------------------------------------
// Public fit() entry point
// ---------------------------------------------------------------------------

/// Fit an ARMA(p,q) model by maximum likelihood.
///
/// # Arguments
/// * `series`: Observed time series
/// * `order`: (p, q)
/// * `config`: Tolerances, constraints and likelihood options
/// * `filter`: Innovations filter evaluated at each trial point
/// * `start_params`: Optional initial parameters (constrained space); Hannan-Rissanen otherwise
pub fn fit(
    series: &TimeSeries,
    order: ArmaOrder,
    config: &ArmaConfig,
    filter: &dyn InnovationsFilter,
    start_params: Option<&ArmaParams>,
) -> Result<FitResult> {
    let n = series.len();
    if n < order.min_obs() {
        return Err(ArmaError::DataError(format!(
            "Not enough observations: n={} < {} required for order {}",
            n,
            order.min_obs(),
            order
        )));
    }

    let mean = if config.demean { series.mean() } else { 0.0 };
    let data: Vec<f64> = series.as_slice().iter().map(|v| v - mean).collect();

    // White noise: sigma2_hat is the mean square of the (demeaned) series
    if order.p == 0 && order.q == 0 {
        let innovations = filter.filter(&data, &ArmaParams::white_noise(1.0))?;
        let ll = gaussian_loglike(&innovations, Scale::Concentrated)?;
        debug!(%order, loglike = ll.loglike, "closed-form fit");
        return Ok(FitResult {
            order,
            params: ArmaParams::white_noise(ll.sigma2),
            loglike: ll.loglike,
            criterion: 0.0,
            aic: 0.0,
            bic: 0.0,
            status: FitStatus::Converged,
            n_obs: n,
            n_iter: 0,
            method: "closed-form".to_string(),
            mean,
            residuals: innovations.errors,
        }
        .with_information_criteria(config.criterion));
    }

    let start = match start_params {
        Some(sp) => {
            if sp.order() != order {
                return Err(ArmaError::ParamLengthMismatch {
                    expected: order.p + order.q,
                    got: sp.ar.len() + sp.ma.len(),
                });
            }
            sp.clone()
        }
        None => compute_start_params(&data, order, config),
    };

    let likelihood = ArmaLikelihood {
        series: &data,
        order,
        filter,
        concentrate_variance: config.concentrate_variance,
        enforce_stationarity: config.enforce_stationarity,
        enforce_invertibility: config.enforce_invertibility,
    };

    let unconstrained_start = untransform_params(
        &start.to_flat(!config.concentrate_variance),
        order,
        config.concentrate_variance,
        config.enforce_stationarity,
        config.enforce_invertibility,
    )?;

    let outcome = maximize(
        &likelihood,
        unconstrained_start,
        &SearchSettings::from_config(config),
    )?;

    let mut params = likelihood.params_at(&outcome.x)?;
    let (ll, innovations) = likelihood.evaluate(&params)?;
    params.sigma2 = ll.sigma2;

    debug!(
        %order,
        loglike = ll.loglike,
        n_iter = outcome.n_iter,
        status = ?outcome.status,
        method = outcome.method,
        "fit finished"
    );

    Ok(FitResult {
        order,
        params,
        loglike: ll.loglike,
        criterion: 0.0,
        aic: 0.0,
        bic: 0.0,
        status: outcome.status,
        n_obs: n,
        n_iter: outcome.n_iter,
        method: format!("{}/{}", outcome.method, filter.name()),
        mean,
        residuals: innovations.errors,
    }
    .with_information_criteria(config.criterion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kalman::{ConditionalSumOfSquares, KalmanFilter};
    use crate::simulate::generate_sample;
    use crate::types::InitializationMode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample(ar: &[f64], ma: &[f64], n: usize, seed: u64) -> TimeSeries {
        let params = ArmaParams::new(ar.to_vec(), ma.to_vec(), 1.0);
        let mut rng = StdRng::seed_from_u64(seed);
        TimeSeries::new(generate_sample(&params, n, 200, &mut rng).unwrap()).unwrap()
    }

    fn kalman() -> KalmanFilter {
        KalmanFilter::new(InitializationMode::StationaryCovariance)
    }

    /// Concave quadratic with maximum at (1, -2).
    struct Quadratic;

    impl Objective for Quadratic {
        fn dim(&self) -> usize {
            2
        }
        fn loglike(&self, x: &[f64]) -> Result<f64> {
            Ok(-((x[0] - 1.0).powi(2) + 3.0 * (x[1] + 2.0).powi(2)))
        }
    }

    /// Infeasible everywhere except near the origin.
    struct Walled;

    impl Objective for Walled {
        fn dim(&self) -> usize {
            1
        }
        fn loglike(&self, x: &[f64]) -> Result<f64> {
            if x[0].abs() > 5.0 {
                Err(ArmaError::DegenerateLikelihood("outside".into()))
            } else {
                Ok(-(x[0] - 1.0).powi(2))
            }
        }
    }

    struct Nowhere;

    impl Objective for Nowhere {
        fn dim(&self) -> usize {
            1
        }
        fn loglike(&self, _x: &[f64]) -> Result<f64> {
            Err(ArmaError::DegenerateLikelihood("never".into()))
        }
    }

    fn settings() -> SearchSettings {
        SearchSettings {
            tolerance: 1e-8,
            max_iterations: 200,
            timeout: None,
        }
    }

    #[test]
    fn test_transform_roundtrip() {
        let order = ArmaOrder::new(2, 1);
        let constrained = vec![0.5, -0.3, 0.4, 2.0];
        let u = untransform_params(&constrained, order, false, true, true).unwrap();
        let back = transform_params(&u, order, false, true, true).unwrap();
        for (a, b) in constrained.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-10, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_transform_passthrough_when_not_enforced() {
        let order = ArmaOrder::new(1, 1);
        let x = vec![1.7, -2.5];
        assert_eq!(transform_params(&x, order, true, false, false).unwrap(), x);
    }

    #[test]
    fn test_transform_length_mismatch() {
        let err = transform_params(&[0.1], ArmaOrder::new(1, 1), true, true, true).unwrap_err();
        assert!(matches!(err, ArmaError::ParamLengthMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_maximize_quadratic() {
        let out = maximize(&Quadratic, vec![0.0, 0.0], &settings()).unwrap();
        assert!(out.status.is_converged());
        assert!((out.x[0] - 1.0).abs() < 1e-4);
        assert!((out.x[1] + 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_maximize_infeasible_start_uses_origin() {
        let out = maximize(&Walled, vec![10.0], &settings()).unwrap();
        assert!((out.x[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_maximize_nowhere_feasible_fails() {
        assert!(maximize(&Nowhere, vec![0.5], &settings()).is_err());
    }

    #[test]
    fn test_maximize_zero_iterations() {
        let s = SearchSettings {
            max_iterations: 0,
            ..settings()
        };
        let out = maximize(&Quadratic, vec![0.0, 0.0], &s).unwrap();
        assert_eq!(out.status, FitStatus::NotConverged);
        assert_eq!(out.x, vec![0.0, 0.0]);
    }

    #[test]
    fn test_fit_ar1() {
        let ts = sample(&[0.75], &[], 1000, 42);
        let result = fit(&ts, ArmaOrder::new(1, 0), &ArmaConfig::default(), &kalman(), None).unwrap();
        assert!(result.status.is_converged());
        // For AR(1) the exact MLE sits within a few thousandths of Yule-Walker
        let yw = crate::start_params::yule_walker(&ts.demeaned(), 1).unwrap();
        assert!((result.params.ar[0] - yw[0]).abs() < 0.01, "phi = {} vs yw = {}", result.params.ar[0], yw[0]);
        assert!((result.params.ar[0] - 0.75).abs() < 0.1, "phi = {}", result.params.ar[0]);
        assert!((result.params.sigma2 - 1.0).abs() < 0.15);
        assert_eq!(result.residuals.len(), 1000);
        assert!((result.aic - (-2.0 * result.loglike + 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fit_ar1_zero_padding() {
        let ts = sample(&[0.6], &[0.2], 800, 21);
        let config = ArmaConfig {
            initialization: InitializationMode::ZeroPadding,
            ..Default::default()
        };
        let filter = KalmanFilter::new(config.initialization);
        let result = fit(&ts, ArmaOrder::new(1, 1), &config, &filter, None).unwrap();
        assert!(result.status.is_converged());
        assert!(result.method.ends_with("/kalman-zero"), "{}", result.method);
        assert!((result.params.ar[0] - 0.6).abs() < 0.15, "phi = {}", result.params.ar[0]);
        assert!((result.params.ma[0] - 0.2).abs() < 0.15, "theta = {}", result.params.ma[0]);

        // Both initializations agree on a long series
        let exact = fit(&ts, ArmaOrder::new(1, 1), &ArmaConfig::default(), &kalman(), None).unwrap();
        assert!((exact.params.ar[0] - result.params.ar[0]).abs() < 0.05);
    }

    #[test]
    fn test_fit_iteration_budget_not_converged() {
        let ts = sample(&[0.5], &[0.4], 500, 3);
        let config = ArmaConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let result = fit(&ts, ArmaOrder::new(1, 1), &config, &kalman(), None).unwrap();
        assert_eq!(result.status, FitStatus::NotConverged);
        assert!(result.n_iter <= 1);
        assert!(result.loglike.is_finite());
    }

    #[test]
    fn test_fit_timeout() {
        let ts = sample(&[0.5], &[0.4], 500, 3);
        let config = ArmaConfig {
            per_fit_timeout: Some(Duration::from_nanos(1)),
            ..Default::default()
        };
        let result = fit(&ts, ArmaOrder::new(1, 1), &config, &kalman(), None).unwrap();
        assert_eq!(result.status, FitStatus::TimedOut);
        assert!(result.loglike.is_finite());
    }

    #[test]
    fn test_fit_arma11_unconcentrated() {
        let ts = sample(&[0.5], &[0.4], 1500, 7);
        let config = ArmaConfig {
            concentrate_variance: false,
            ..Default::default()
        };
        let result = fit(&ts, ArmaOrder::new(1, 1), &config, &kalman(), None).unwrap();
        assert!((result.params.ar[0] - 0.5).abs() < 0.1);
        assert!((result.params.ma[0] - 0.4).abs() < 0.1);
        assert!((result.params.sigma2 - 1.0).abs() < 0.15);
    }

    #[test]
    fn test_fit_white_noise_closed_form() {
        let ts = TimeSeries::new(vec![1.0, 3.0, 2.0, 4.0, 0.0]).unwrap();
        let result = fit(&ts, ArmaOrder::new(0, 0), &ArmaConfig::default(), &kalman(), None).unwrap();
        assert_eq!(result.status, FitStatus::Converged);
        assert_eq!(result.n_iter, 0);
        assert!((result.params.sigma2 - ts.variance()).abs() < 1e-12);
        assert!((result.mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_constant_series_degenerate() {
        let ts = TimeSeries::new(vec![3.0; 50]).unwrap();
        for order in [ArmaOrder::new(0, 0), ArmaOrder::new(1, 0), ArmaOrder::new(1, 1)] {
            let err = fit(&ts, order, &ArmaConfig::default(), &kalman(), None).unwrap_err();
            assert!(
                matches!(err, ArmaError::DegenerateLikelihood(_)),
                "{}: unexpected {:?}",
                order,
                err
            );
        }
    }

    #[test]
    fn test_fit_constant_series_degenerate_unconcentrated() {
        let config = ArmaConfig {
            concentrate_variance: false,
            ..Default::default()
        };
        for value in [0.0, 2.0, -7.5] {
            let ts = TimeSeries::new(vec![value; 60]).unwrap();
            for order in [ArmaOrder::new(1, 0), ArmaOrder::new(0, 1), ArmaOrder::new(1, 1)] {
                let err = fit(&ts, order, &config, &kalman(), None).unwrap_err();
                assert!(
                    matches!(err, ArmaError::DegenerateLikelihood(_)),
                    "value {} order {}: unexpected {:?}",
                    value,
                    order,
                    err
                );
            }
        }
    }

    #[test]
    fn test_fit_too_short() {
        let ts = TimeSeries::new(vec![0.1, 0.2]).unwrap();
        let err = fit(&ts, ArmaOrder::new(2, 0), &ArmaConfig::default(), &kalman(), None).unwrap_err();
        assert!(matches!(err, ArmaError::DataError(_)));
    }

    #[test]
    fn test_fit_with_css_filter() {
        let ts = sample(&[0.6], &[], 800, 9);
        let result = fit(
            &ts,
            ArmaOrder::new(1, 0),
            &ArmaConfig::default(),
            &ConditionalSumOfSquares,
            None,
        )
        .unwrap();
        assert!((result.params.ar[0] - 0.6).abs() < 0.08);
        assert!(result.method.ends_with("/css"));
    }

    #[test]
    fn test_fit_start_params_order_mismatch() {
        let ts = sample(&[0.6], &[], 100, 1);
        let sp = ArmaParams::new(vec![0.1, 0.1], vec![], 1.0);
        assert!(fit(&ts, ArmaOrder::new(1, 0), &ArmaConfig::default(), &kalman(), Some(&sp)).is_err());
    }
}
