use nalgebra::{DMatrix, DVector};

use crate::params::ArmaParams;

/// Harvey-representation state space for ARMA(p,q).
///
/// State equation:  alpha_{t+1} = T * alpha_t + R * eta_t
/// Observation:     y_t          = Z' * alpha_t
///
/// with eta_t ~ N(0, sigma2) and no measurement error. All covariances are
/// kept in units of sigma2 (Q = 1).
#[derive(Debug, Clone)]
pub struct StateSpace {
    pub k_states: usize,
    pub transition: DMatrix<f64>, // T: k_states × k_states
    pub design: DVector<f64>,     // Z: k_states (single observation row)
    pub selection: DVector<f64>,  // R: k_states × 1
}

impl StateSpace {
    /// Construct the Harvey representation with r = max(p, q + 1).
    pub fn new(params: &ArmaParams) -> Self {
        let k_states = params.order().k_states();
        Self {
            k_states,
            transition: Self::build_transition(&params.ar, k_states),
            design: Self::build_design(k_states),
            selection: Self::build_selection(&params.ma, k_states),
        }
    }

    /// Companion matrix: phi down the first column, ones on the superdiagonal.
    ///
    /// T = [[phi_1, 1, 0, ..., 0],
    ///      [phi_2, 0, 1, ..., 0],
    ///      ...
    ///      [phi_r, 0, 0, ..., 0]]
    fn build_transition(ar: &[f64], k_states: usize) -> DMatrix<f64> {
        let mut t = DMatrix::<f64>::zeros(k_states, k_states);
        for (i, &phi) in ar.iter().enumerate() {
            t[(i, 0)] = phi;
        }
        for i in 0..k_states.saturating_sub(1) {
            t[(i, i + 1)] = 1.0;
        }
        t
    }

    /// Z = e_1
    fn build_design(k_states: usize) -> DVector<f64> {
        let mut z = DVector::<f64>::zeros(k_states);
        z[0] = 1.0;
        z
    }

    /// R = [1, theta_1, ..., theta_q, 0, ...]'
    fn build_selection(ma: &[f64], k_states: usize) -> DVector<f64> {
        let mut r = DVector::<f64>::zeros(k_states);
        r[0] = 1.0;
        for (i, &theta) in ma.iter().enumerate() {
            r[i + 1] = theta;
        }
        r
    }

    /// R R' (state disturbance covariance in sigma2 units).
    pub fn rrt(&self) -> DMatrix<f64> {
        &self.selection * self.selection.transpose()
    }
}
