use nalgebra::{DMatrix, DVector};

use crate::error::{ArmaError, Result};
use crate::polynomial;
use crate::state_space::StateSpace;
use crate::types::InitializationMode;

/// Kalman filter initial state and covariance.
#[derive(Debug, Clone)]
pub struct KalmanInit {
    /// Initial state vector a_0 (zeros).
    pub initial_state: DVector<f64>,
    /// Initial state covariance P_0 in sigma2 units.
    pub initial_state_cov: DMatrix<f64>,
}

impl KalmanInit {
    pub fn from_mode(mode: InitializationMode, ss: &StateSpace, ar: &[f64]) -> Result<Self> {
        match mode {
            InitializationMode::ZeroPadding => Ok(Self::zero_padding(ss)),
            InitializationMode::StationaryCovariance => Self::stationary(ss, ar),
        }
    }

    /// Pre-sample observations and shocks are zero.
    ///
    /// - a_0 = 0
    /// - P_0 = R R' (only the shock entering at t = 0 is uncertain)
    pub fn zero_padding(ss: &StateSpace) -> Self {
        Self {
            initial_state: DVector::zeros(ss.k_states),
            initial_state_cov: ss.rrt(),
        }
    }

    /// Unconditional (stationary) initialization.
    ///
    /// P_0 solves the discrete Lyapunov equation P = T P T' + R R', via the
    /// Kronecker system (I - T ⊗ T) vec(P) = vec(R R').
    pub fn stationary(ss: &StateSpace, ar: &[f64]) -> Result<Self> {
        if !polynomial::is_stationary(ar) {
            return Err(ArmaError::NumericalInstability {
                t: 0,
                detail: "AR polynomial is not stationary; no unconditional covariance".into(),
            });
        }

        let k = ss.k_states;
        let rrt = ss.rrt();
        let lhs = DMatrix::<f64>::identity(k * k, k * k) - ss.transition.kronecker(&ss.transition);
        let rhs = DVector::from_column_slice(rrt.as_slice());

        let vec_p = lhs.lu().solve(&rhs).ok_or_else(|| ArmaError::NumericalInstability {
            t: 0,
            detail: "Lyapunov system is singular".into(),
        })?;

        let p = DMatrix::from_column_slice(k, k, vec_p.as_slice());
        let p = (&p + p.transpose()) * 0.5;
        if p.iter().any(|v| !v.is_finite()) || p[(0, 0)] <= 0.0 {
            return Err(ArmaError::NumericalInstability {
                t: 0,
                detail: "stationary state covariance is not positive".into(),
            });
        }

        Ok(Self {
            initial_state: DVector::zeros(k),
            initial_state_cov: p,
        })
    }
}
