//! Lag-polynomial root conditions via reflection (partial autocorrelation)
//! coefficients.
//!
//! Convention: `ar` holds phi in x_t = phi_1 x_{t-1} + ... + phi_p x_{t-p} + e_t,
//! i.e. the polynomial 1 - phi_1 L - ... - phi_p L^p. The polynomial has all
//! roots outside the unit circle iff every reflection coefficient lies in (-1, 1).

use nalgebra::{Complex, DMatrix, Schur};

/// Levinson-Durbin recursion: reflection coefficients -> AR coefficients.
///
/// phi_{k,k} = r_k,  phi_{k,j} = phi_{k-1,j} - r_k * phi_{k-1,k-j}
pub fn from_reflection_coefficients(r: &[f64]) -> Vec<f64> {
    let n = r.len();
    let mut phi = vec![0.0; n];
    let mut prev = vec![0.0; n];
    for k in 0..n {
        prev[..k].copy_from_slice(&phi[..k]);
        phi[k] = r[k];
        for j in 0..k {
            phi[j] = prev[j] - r[k] * prev[k - 1 - j];
        }
    }
    phi
}

/// Step-down recursion: AR coefficients -> reflection coefficients.
///
/// Returns `None` as soon as a reflection coefficient has |r_k| >= 1, which
/// means the AR polynomial has a root on or inside the unit circle.
pub fn to_reflection_coefficients(ar: &[f64]) -> Option<Vec<f64>> {
    let n = ar.len();
    let mut a = ar.to_vec();
    let mut r = vec![0.0; n];
    for k in (0..n).rev() {
        let rk = a[k];
        if !rk.is_finite() || rk.abs() >= 1.0 {
            return None;
        }
        r[k] = rk;
        let denom = 1.0 - rk * rk;
        let prev: Vec<f64> = (0..k).map(|j| (a[j] + rk * a[k - 1 - j]) / denom).collect();
        a[..k].copy_from_slice(&prev);
    }
    Some(r)
}

/// AR polynomial 1 - phi_1 z - ... - phi_p z^p has no roots in |z| <= 1.
pub fn is_stationary(ar: &[f64]) -> bool {
    to_reflection_coefficients(ar).is_some()
}

/// MA polynomial 1 + theta_1 z + ... + theta_q z^q has no roots in |z| <= 1.
pub fn is_invertible(ma: &[f64]) -> bool {
    let negated: Vec<f64> = ma.iter().map(|&t| -t).collect();
    is_stationary(&negated)
}

/// AR and MA inverse roots closer than this form a near-common factor.
pub const COMMON_ROOT_TOL: f64 = 0.1;

/// Inverse roots above this modulus count as unit roots (|root| < 1.01).
pub const UNIT_ROOT_MODULUS: f64 = 1.0 / 1.01;

/// Inverse roots of 1 - c_1 z - ... - c_n z^n, i.e. the eigenvalues of the
/// companion matrix with `c` in the first row. `None` if the Schur iteration
/// does not converge.
pub fn inverse_roots(c: &[f64]) -> Option<Vec<Complex<f64>>> {
    let n = c.len();
    if n == 0 {
        return Some(Vec::new());
    }
    let mut companion = DMatrix::<f64>::zeros(n, n);
    for (j, &cj) in c.iter().enumerate() {
        companion[(0, j)] = cj;
    }
    for i in 1..n {
        companion[(i, i - 1)] = 1.0;
    }
    let schur = Schur::try_new(companion, f64::EPSILON, 1000)?;
    Some(schur.complex_eigenvalues().iter().copied().collect())
}

/// Why the ARMA pair (`ar`, `ma`) is not identifiable, if it is not: an AR
/// and an MA factor nearly cancel, or a root lies near the unit circle.
pub fn identifiability_issue(ar: &[f64], ma: &[f64]) -> Option<String> {
    let negated: Vec<f64> = ma.iter().map(|&t| -t).collect();
    let (ar_roots, ma_roots) = match (inverse_roots(ar), inverse_roots(&negated)) {
        (Some(a), Some(m)) => (a, m),
        _ => return None,
    };

    if let Some(root) = ar_roots.iter().find(|r| r.norm() > UNIT_ROOT_MODULUS) {
        return Some(format!("AR inverse root {:.4} is near the unit circle", root));
    }
    if let Some(root) = ma_roots.iter().find(|r| r.norm() > UNIT_ROOT_MODULUS) {
        return Some(format!("MA inverse root {:.4} is near the unit circle", root));
    }
    for a in &ar_roots {
        for m in &ma_roots {
            if (a - m).norm() < COMMON_ROOT_TOL {
                return Some(format!(
                    "near-common AR/MA factor: inverse roots {:.4} and {:.4}",
                    a, m
                ));
            }
        }
    }
    None
}
