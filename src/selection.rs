//! Order selection: fit every candidate (p, q) in parallel and rank by AIC/BIC.
//!
//! Converged candidates whose AR and MA polynomials nearly share a factor, or
//! have a root near the unit circle, are rejected before ranking.

use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::error::{ArmaError, Result};
use crate::kalman::{InnovationsFilter, KalmanFilter};
use crate::optimizer;
use crate::series::TimeSeries;
use crate::types::{ArmaConfig, ArmaOrder, CandidateDiagnostic, FitResult, InformationCriterion};

/// Criterion values closer than this are treated as equal.
pub const CRITERION_TIE_EPS: f64 = 1e-8;

/// Fits a single candidate order.
pub trait CandidateFitter: Sync {
    fn fit_order(&self, series: &TimeSeries, order: ArmaOrder, config: &ArmaConfig) -> Result<FitResult>;
}

/// Maximum-likelihood fitter over a configurable innovations filter.
pub struct MleFitter {
    filter: Box<dyn InnovationsFilter>,
}

impl MleFitter {
    /// Kalman filter with the configured initialization.
    pub fn from_config(config: &ArmaConfig) -> Self {
        Self::with_filter(KalmanFilter::new(config.initialization))
    }

    pub fn with_filter(filter: impl InnovationsFilter + 'static) -> Self {
        Self {
            filter: Box::new(filter),
        }
    }
}

impl CandidateFitter for MleFitter {
    fn fit_order(&self, series: &TimeSeries, order: ArmaOrder, config: &ArmaConfig) -> Result<FitResult> {
        optimizer::fit(series, order, config, self.filter.as_ref(), None)
    }
}

/// Progress of a selection sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    FittingOrder(ArmaOrder),
    Selecting,
    Done,
    Failed,
}

impl SweepPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SweepPhase::Done | SweepPhase::Failed)
    }
}

fn advance(phase: &mut SweepPhase, next: SweepPhase) {
    trace!(from = ?*phase, to = ?next, "sweep phase");
    *phase = next;
}

/// Outcome of a successful sweep.
#[derive(Debug, Clone)]
pub struct Selection {
    pub best: FitResult,
    pub criterion: InformationCriterion,
    /// One entry per candidate, in sweep order.
    pub diagnostics: Vec<CandidateDiagnostic>,
}

impl Selection {
    pub fn order(&self) -> ArmaOrder {
        self.best.order
    }
}

/// Grid search over (p, q) in [0, maxAR] × [0, maxMA].
pub struct OrderSelector {
    config: ArmaConfig,
}

impl OrderSelector {
    pub fn new(config: ArmaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ArmaConfig {
        &self.config
    }

    /// Select with maximum-likelihood fits under the configured filter.
    pub fn select(&self, series: &TimeSeries) -> Result<Selection> {
        self.select_with(series, &MleFitter::from_config(&self.config))
    }

    /// Select using a caller-supplied fitter.
    pub fn select_with(&self, series: &TimeSeries, fitter: &dyn CandidateFitter) -> Result<Selection> {
        let mut phase = SweepPhase::Idle;
        let orders = self.config.candidate_orders();
        info!(
            n_candidates = orders.len(),
            max_ar = self.config.max_ar,
            max_ma = self.config.max_ma,
            criterion = ?self.config.criterion,
            n_obs = series.len(),
            "starting order selection"
        );

        let results = self.fit_all(series, fitter, &orders)?;

        advance(&mut phase, SweepPhase::Selecting);
        let mut diagnostics = Vec::with_capacity(results.len());
        let mut accepted = Vec::new();
        for (order, result) in orders.iter().zip(results) {
            match result {
                Ok(fit) if !(fit.status.is_converged() && fit.criterion.is_finite()) => {
                    debug!(%order, status = ?fit.status, "candidate not converged");
                    diagnostics.push(CandidateDiagnostic::from_fit(&fit));
                }
                Ok(fit) => match fit.params.identifiability_issue() {
                    Some(reason) => {
                        debug!(%order, %reason, "candidate rejected");
                        diagnostics.push(CandidateDiagnostic::rejected(&fit, reason));
                    }
                    None => {
                        diagnostics.push(CandidateDiagnostic::from_fit(&fit));
                        accepted.push(fit);
                    }
                },
                Err(e) => {
                    debug!(%order, error = %e, "candidate failed");
                    diagnostics.push(CandidateDiagnostic::failed(*order, e.to_string()));
                }
            }
        }

        let outcome = match pick_best(accepted) {
            Some(best) => {
                advance(&mut phase, SweepPhase::Done);
                info!(
                    order = %best.order,
                    criterion = best.criterion,
                    loglike = best.loglike,
                    "order selected"
                );
                Ok(Selection {
                    best,
                    criterion: self.config.criterion,
                    diagnostics,
                })
            }
            None => {
                advance(&mut phase, SweepPhase::Failed);
                Err(ArmaError::NoFeasibleModel { diagnostics })
            }
        };
        debug_assert!(phase.is_terminal());
        outcome
    }

    /// Fit every candidate on the worker pool; results keep candidate order.
    fn fit_all(
        &self,
        series: &TimeSeries,
        fitter: &dyn CandidateFitter,
        orders: &[ArmaOrder],
    ) -> Result<Vec<Result<FitResult>>> {
        let config = &self.config;
        let run = || -> Vec<Result<FitResult>> {
            orders
                .par_iter()
                .map(|&order| {
                    trace!(phase = ?SweepPhase::FittingOrder(order), "sweep phase");
                    fitter.fit_order(series, order, config)
                })
                .collect()
        };

        match config.max_workers {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ArmaError::InvalidConfig(format!("worker pool: {}", e)))?;
                Ok(pool.install(run))
            }
            None => Ok(run()),
        }
    }
}

/// Minimum criterion; values within `CRITERION_TIE_EPS` of the minimum tie and
/// are broken by lower p + q, then lower p.
fn pick_best(fits: Vec<FitResult>) -> Option<FitResult> {
    let min = fits
        .iter()
        .map(|f| f.criterion)
        .fold(f64::INFINITY, f64::min);
    fits.into_iter()
        .filter(|f| f.criterion <= min + CRITERION_TIE_EPS)
        .min_by_key(|f| (f.order.p + f.order.q, f.order.p))
}
