use nalgebra::{DMatrix, DVector};

use crate::error::{ArmaError, Result};
use crate::initialization::KalmanInit;
use crate::params::ArmaParams;
use crate::state_space::StateSpace;
use crate::types::InitializationMode;

/// One-step-ahead prediction errors and their variances.
///
/// Variances are in units of sigma2: the absolute variance of `errors[t]` is
/// `sigma2 * variances[t]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Innovations {
    pub errors: Vec<f64>,
    pub variances: Vec<f64>,
}

impl Innovations {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Residuals scaled to unit variance given the innovation variance `sigma2`.
    pub fn standardized(&self, sigma2: f64) -> Vec<f64> {
        self.errors
            .iter()
            .zip(&self.variances)
            .map(|(e, v)| e / (sigma2 * v).sqrt())
            .collect()
    }
}

/// Produces the innovations of a series under given ARMA parameters.
///
/// Implementations are pure functions of their inputs and must return exactly
/// one innovation per observation.
pub trait InnovationsFilter: Send + Sync {
    fn filter(&self, series: &[f64], params: &ArmaParams) -> Result<Innovations>;

    /// Short label recorded in fit results.
    fn name(&self) -> &'static str;
}

/// Output of the Kalman recursion.
#[derive(Debug, Clone)]
pub struct KalmanOutput {
    pub innovations: Innovations,
    /// a_{T+1|T}: predicted state after the last observation.
    pub predicted_state: DVector<f64>,
    /// P_{T+1|T} in sigma2 units.
    pub predicted_cov: DMatrix<f64>,
}

/// Exact Gaussian filter over the Harvey state-space form.
#[derive(Debug, Clone, Copy)]
pub struct KalmanFilter {
    pub init: InitializationMode,
}

impl KalmanFilter {
    pub fn new(init: InitializationMode) -> Self {
        Self { init }
    }

    /// Full filter pass, keeping the final predicted state for forecasting.
    pub fn run(&self, series: &[f64], params: &ArmaParams) -> Result<KalmanOutput> {
        let ss = StateSpace::new(params);
        let init = KalmanInit::from_mode(self.init, &ss, &params.ar)?;
        kalman_filter(series, &ss, &init)
    }
}

impl InnovationsFilter for KalmanFilter {
    fn filter(&self, series: &[f64], params: &ArmaParams) -> Result<Innovations> {
        self.run(series, params).map(|out| out.innovations)
    }

    fn name(&self) -> &'static str {
        match self.init {
            InitializationMode::ZeroPadding => "kalman-zero",
            InitializationMode::StationaryCovariance => "kalman-stationary",
        }
    }
}

/// Run the Kalman filter and collect innovations.
///
/// Uses the standard Harvey-form recursion:
///   - a_{t|t-1}, P_{t|t-1} are the predicted state/cov at time t
///   - Innovation: v_t = y_t - Z' * a_{t|t-1},  F_t = Z' P_{t|t-1} Z
///   - Update: a_{t|t} = a_{t|t-1} + K * v_t
///   - Predict: a_{t+1|t} = T * a_{t|t}
pub fn kalman_filter(series: &[f64], ss: &StateSpace, init: &KalmanInit) -> Result<KalmanOutput> {
    let n = series.len();
    let k = ss.k_states;

    // Initialize: a = a_{0|-1}, P = P_{0|-1}
    let mut a = init.initial_state.clone();
    let mut p = init.initial_state_cov.clone();

    let t_mat = &ss.transition;
    let z = &ss.design;
    let rrt = ss.rrt();
    let eye = DMatrix::<f64>::identity(k, k);

    let mut errors = Vec::with_capacity(n);
    let mut variances = Vec::with_capacity(n);

    for (t, &y) in series.iter().enumerate() {
        let v_t = y - z.dot(&a);

        // F_t = Z' * P_{t|t-1} * Z (scalar, univariate)
        let p_z = &p * z;
        let f_t: f64 = z.dot(&p_z);

        if !(f_t.is_finite() && f_t > 0.0) {
            return Err(ArmaError::NumericalInstability {
                t,
                detail: format!("innovation variance is not positive: {}", f_t),
            });
        }
        if !v_t.is_finite() {
            return Err(ArmaError::NumericalInstability {
                t,
                detail: "innovation is not finite".into(),
            });
        }
        errors.push(v_t);
        variances.push(f_t);

        // Kalman gain: K = P_{t|t-1} * Z / F_t
        let k_gain = &p_z / f_t;
        let a_updated = &a + &k_gain * v_t;

        // Joseph form: P_{t|t} = (I - K*Z') * P_{t|t-1} * (I - K*Z')'
        let i_kz = &eye - &k_gain * z.transpose();
        let p_updated = &i_kz * &p * i_kz.transpose();

        a = t_mat * &a_updated;
        p = t_mat * &p_updated * t_mat.transpose() + &rrt;
    }

    Ok(KalmanOutput {
        innovations: Innovations { errors, variances },
        predicted_state: a,
        predicted_cov: p,
    })
}

/// Conditional sum of squares: the ARMA recursion with zero pre-sample values
/// and shocks, unit variance at every step.
///
/// e_t = x_t - sum phi_i x_{t-i} - sum theta_j e_{t-j}
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalSumOfSquares;

impl InnovationsFilter for ConditionalSumOfSquares {
    fn filter(&self, series: &[f64], params: &ArmaParams) -> Result<Innovations> {
        let n = series.len();
        let mut errors: Vec<f64> = Vec::with_capacity(n);
        for t in 0..n {
            let ar_part: f64 = params
                .ar
                .iter()
                .enumerate()
                .filter(|(i, _)| *i < t)
                .map(|(i, phi)| phi * series[t - 1 - i])
                .sum();
            let ma_part: f64 = params
                .ma
                .iter()
                .enumerate()
                .filter(|(j, _)| *j < t)
                .map(|(j, theta)| theta * errors[t - 1 - j])
                .sum();
            let e = series[t] - ar_part - ma_part;
            if !e.is_finite() {
                return Err(ArmaError::NumericalInstability {
                    t,
                    detail: "conditional residual is not finite".into(),
                });
            }
            errors.push(e);
        }
        Ok(Innovations {
            errors,
            variances: vec![1.0; n],
        })
    }

    fn name(&self) -> &'static str {
        "css"
    }
}
