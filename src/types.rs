use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{ArmaError, Result};
use crate::params::ArmaParams;

/// ARMA model order (p, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmaOrder {
    pub p: usize, // AR order
    pub q: usize, // MA order
}

impl ArmaOrder {
    pub fn new(p: usize, q: usize) -> Self {
        Self { p, q }
    }

    /// State space dimension: max(p, q + 1)
    pub fn k_states(&self) -> usize {
        std::cmp::max(self.p, self.q + 1)
    }

    /// Parameters counted by AIC/BIC: p + q + sigma2.
    pub fn n_estimated_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Minimum series length needed to fit this order.
    pub fn min_obs(&self) -> usize {
        self.p.max(self.q) + 1
    }
}

impl fmt::Display for ArmaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.p, self.q)
    }
}

/// Penalized-likelihood score used to rank candidate orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum InformationCriterion {
    #[serde(rename = "AIC", alias = "aic")]
    Aic,
    #[serde(rename = "BIC", alias = "bic")]
    Bic,
}

impl InformationCriterion {
    /// AIC = -2 logL + 2k, BIC = -2 logL + k ln(n).
    pub fn score(&self, loglike: f64, k: usize, n_obs: usize) -> f64 {
        let k = k as f64;
        match self {
            InformationCriterion::Aic => -2.0 * loglike + 2.0 * k,
            InformationCriterion::Bic => -2.0 * loglike + k * (n_obs as f64).ln(),
        }
    }
}

/// How the state before the first observation is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InitializationMode {
    /// Pre-sample values and shocks are zero: a_0 = 0, P_0 = R R'.
    ZeroPadding,
    /// a_0 = 0, P_0 = unconditional state covariance (Lyapunov solution).
    StationaryCovariance,
}

/// Estimation and selection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArmaConfig {
    #[serde(rename = "maxAR", default = "default_max_lag")]
    pub max_ar: usize,
    #[serde(rename = "maxMA", default = "default_max_lag")]
    pub max_ma: usize,
    #[serde(rename = "infoCriterion", default = "default_criterion")]
    pub criterion: InformationCriterion,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(rename = "maxIterations", default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(rename = "initializationMode", default = "default_initialization")]
    pub initialization: InitializationMode,
    #[serde(rename = "concentrateVariance", default = "default_true")]
    pub concentrate_variance: bool,
    #[serde(
        rename = "perFitTimeout",
        default,
        deserialize_with = "deserialize_timeout_secs"
    )]
    pub per_fit_timeout: Option<Duration>,
    #[serde(rename = "maxWorkers", default)]
    pub max_workers: Option<usize>,
    #[serde(rename = "enforceStationarity", default = "default_true")]
    pub enforce_stationarity: bool,
    #[serde(rename = "enforceInvertibility", default = "default_true")]
    pub enforce_invertibility: bool,
    #[serde(default = "default_true")]
    pub demean: bool,
}

fn default_max_lag() -> usize {
    5
}
fn default_criterion() -> InformationCriterion {
    InformationCriterion::Aic
}
fn default_tolerance() -> f64 {
    1e-8
}
fn default_max_iterations() -> u64 {
    500
}
fn default_initialization() -> InitializationMode {
    InitializationMode::StationaryCovariance
}
fn default_true() -> bool {
    true
}

fn deserialize_timeout_secs<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs: Option<f64> = Option::deserialize(deserializer)?;
    match secs {
        None => Ok(None),
        Some(s) if s.is_finite() && s > 0.0 => Ok(Some(Duration::from_secs_f64(s))),
        Some(s) => Err(serde::de::Error::custom(format!(
            "perFitTimeout must be a positive number of seconds, got {}",
            s
        ))),
    }
}

impl Default for ArmaConfig {
    fn default() -> Self {
        Self {
            max_ar: default_max_lag(),
            max_ma: default_max_lag(),
            criterion: default_criterion(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            initialization: default_initialization(),
            concentrate_variance: true,
            per_fit_timeout: None,
            max_workers: None,
            enforce_stationarity: true,
            enforce_invertibility: true,
            demean: true,
        }
    }
}

impl ArmaConfig {
    /// AR-only selection: q is fixed at zero.
    pub fn ar_only(max_ar: usize) -> Self {
        Self {
            max_ar,
            max_ma: 0,
            ..Default::default()
        }
    }

    /// Parse a JSON configuration document and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ArmaConfig =
            serde_json::from_str(text).map_err(|e| ArmaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ArmaError::InvalidConfig(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_workers == Some(0) {
            return Err(ArmaError::InvalidConfig(
                "maxWorkers must be at least 1".into(),
            ));
        }
        if self.per_fit_timeout == Some(Duration::ZERO) {
            return Err(ArmaError::InvalidConfig(
                "perFitTimeout must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Candidate orders in sweep order: p outer, q inner.
    pub fn candidate_orders(&self) -> Vec<ArmaOrder> {
        (0..=self.max_ar)
            .flat_map(|p| (0..=self.max_ma).map(move |q| ArmaOrder::new(p, q)))
            .collect()
    }
}

/// Outcome of a single optimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    Converged,
    NotConverged,
    TimedOut,
}

impl FitStatus {
    pub fn is_converged(&self) -> bool {
        *self == FitStatus::Converged
    }
}

/// Fit result returned by the optimizer.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub order: ArmaOrder,
    pub params: ArmaParams,
    pub loglike: f64,
    /// Value of the configured information criterion.
    pub criterion: f64,
    pub aic: f64,
    pub bic: f64,
    pub status: FitStatus,
    pub n_obs: usize,
    pub n_iter: u64,
    pub method: String,
    /// Sample mean removed before fitting (0 when demeaning is off).
    pub mean: f64,
    /// One-step-ahead innovations at the fitted parameters.
    pub residuals: Vec<f64>,
}

impl FitResult {
    pub fn n_params(&self) -> usize {
        self.order.n_estimated_params()
    }

    /// Fill `aic`, `bic` and `criterion` from `loglike`.
    pub fn with_information_criteria(mut self, criterion: InformationCriterion) -> Self {
        let k = self.n_params();
        self.aic = InformationCriterion::Aic.score(self.loglike, k, self.n_obs);
        self.bic = InformationCriterion::Bic.score(self.loglike, k, self.n_obs);
        self.criterion = criterion.score(self.loglike, k, self.n_obs);
        self
    }
}

/// Per-candidate status in the selection sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    Converged,
    NotConverged,
    TimedOut,
    /// Converged, but the AR and MA parts are not identifiable.
    Rejected,
    Failed,
}

impl From<FitStatus> for CandidateStatus {
    fn from(status: FitStatus) -> Self {
        match status {
            FitStatus::Converged => CandidateStatus::Converged,
            FitStatus::NotConverged => CandidateStatus::NotConverged,
            FitStatus::TimedOut => CandidateStatus::TimedOut,
        }
    }
}

/// One row of the selection diagnostics list.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDiagnostic {
    pub order: ArmaOrder,
    pub status: CandidateStatus,
    pub loglike: Option<f64>,
    pub criterion: Option<f64>,
    pub error: Option<String>,
}

impl CandidateDiagnostic {
    pub fn from_fit(fit: &FitResult) -> Self {
        Self {
            order: fit.order,
            status: fit.status.into(),
            loglike: Some(fit.loglike),
            criterion: Some(fit.criterion),
            error: None,
        }
    }

    pub fn rejected(fit: &FitResult, reason: impl Into<String>) -> Self {
        Self {
            status: CandidateStatus::Rejected,
            error: Some(reason.into()),
            ..Self::from_fit(fit)
        }
    }

    pub fn failed(order: ArmaOrder, error: impl Into<String>) -> Self {
        Self {
            order,
            status: CandidateStatus::Failed,
            loglike: None,
            criterion: None,
            error: Some(error.into()),
        }
    }
}
