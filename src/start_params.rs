//! Initial parameter estimation for the optimizer.
//!
//! Provides reasonable starting values by:
//! 1. Burg estimates for pure AR orders
//! 2. Hannan-Rissanen two-stage regression when MA terms are present
//! 3. Innovations-algorithm MA estimates when the regression is unusable
//! 4. Falling back to zeros when the estimates violate the enforced constraints

use nalgebra::{DMatrix, DVector};

use crate::params::ArmaParams;
use crate::polynomial;
use crate::types::{ArmaConfig, ArmaOrder};

/// Compute sample autocovariance at lag k.
pub(crate) fn autocovariance(y: &[f64], k: usize) -> f64 {
    let n = y.len();
    if k >= n {
        return 0.0;
    }
    let mean: f64 = y.iter().sum::<f64>() / n as f64;
    let mut sum = 0.0;
    for i in 0..n - k {
        sum += (y[i] - mean) * (y[i + k] - mean);
    }
    sum / n as f64
}

/// Estimate AR coefficients via Burg's maximum entropy method.
///
/// Every stage has |reflection| < 1, so the result is stationary.
pub(crate) fn burg_ar(y: &[f64], p: usize) -> Option<Vec<f64>> {
    if p == 0 {
        return Some(vec![]);
    }
    let n = y.len();
    if n <= p {
        return None;
    }

    let mean: f64 = y.iter().sum::<f64>() / n as f64;

    // Forward and backward prediction errors
    let mut ef: Vec<f64> = y.iter().map(|&v| v - mean).collect();
    let mut eb: Vec<f64> = ef.clone();

    let mut a = vec![0.0; p];

    for k in 0..p {
        let mut num = 0.0;
        let mut den = 0.0;
        for t in (k + 1)..n {
            num += ef[t] * eb[t - 1];
            den += ef[t] * ef[t] + eb[t - 1] * eb[t - 1];
        }
        if den.abs() < 1e-15 {
            return None;
        }
        let kk = 2.0 * num / den;
        if kk.abs() >= 1.0 {
            return None;
        }

        let a_prev: Vec<f64> = a[..k].to_vec();
        a[k] = kk;
        for j in 0..k {
            a[j] = a_prev[j] - kk * a_prev[k - 1 - j];
        }

        // Reverse iteration so eb[t-1] is read before it is overwritten
        for t in ((k + 1)..n).rev() {
            let ef_t = ef[t];
            ef[t] = ef_t - kk * eb[t - 1];
            eb[t] = eb[t - 1] - kk * ef_t;
        }
    }

    Some(a)
}

/// Estimate AR coefficients via the Yule-Walker equations.
///
/// Solves R * phi = r with R[i,j] = gamma(|i-j|), r[i] = gamma(i+1) by
/// Levinson-Durbin recursion.
pub(crate) fn yule_walker(y: &[f64], p: usize) -> Option<Vec<f64>> {
    if p == 0 {
        return Some(vec![]);
    }
    if y.len() <= p {
        return None;
    }

    let gammas: Vec<f64> = (0..=p).map(|k| autocovariance(y, k)).collect();
    if gammas[0].abs() < 1e-15 {
        return None;
    }

    let mut phi = vec![0.0; p];
    let mut phi_prev = vec![0.0; p];
    let mut var = gammas[0];

    for k in 0..p {
        let mut num = gammas[k + 1];
        for j in 0..k {
            num -= phi[j] * gammas[k - j];
        }
        if var.abs() < 1e-15 {
            return None;
        }
        let lambda = num / var;

        phi_prev.copy_from_slice(&phi);
        phi[k] = lambda;
        for j in 0..k {
            phi[j] = phi_prev[j] - lambda * phi_prev[k - 1 - j];
        }
        var *= 1.0 - lambda * lambda;
    }

    Some(phi)
}

/// Estimate MA coefficients via the innovation algorithm (Brockwell & Davis, 5.2).
fn innovations_ma(residuals: &[f64], q: usize) -> Vec<f64> {
    if q == 0 || residuals.len() <= q {
        return vec![0.0; q];
    }

    let gamma: Vec<f64> = (0..=q).map(|k| autocovariance(residuals, k)).collect();
    if gamma[0].abs() < 1e-15 {
        return vec![0.0; q];
    }

    let m = q;
    let mut theta = vec![vec![0.0; m]; m + 1];
    let mut v = vec![0.0; m + 1];
    v[0] = gamma[0];

    for i in 1..=m {
        for k in 0..i {
            let mut sum = gamma[i - k];
            for j in 0..k {
                sum -= theta[k][k - 1 - j] * theta[i][i - 1 - j] * v[j];
            }
            theta[i][i - 1 - k] = if v[k].abs() > 1e-15 { sum / v[k] } else { 0.0 };
        }
        v[i] = gamma[0];
        for j in 0..i {
            v[i] -= theta[i][i - 1 - j].powi(2) * v[j];
        }
        v[i] = v[i].max(1e-15);
    }

    (0..q).map(|k| theta[m][k].clamp(-0.99, 0.99)).collect()
}

/// Residuals of an AR fit; the first `ar.len()` observations are dropped.
fn ar_residuals(y: &[f64], ar: &[f64]) -> Vec<f64> {
    let p = ar.len();
    (p..y.len())
        .map(|t| y[t] - ar.iter().enumerate().map(|(j, a)| a * y[t - 1 - j]).sum::<f64>())
        .collect()
}

/// Order of the long autoregression used in the first Hannan-Rissanen stage.
fn long_ar_order(n: usize, order: ArmaOrder) -> usize {
    let lower = order.p.max(order.q) + 1;
    let upper = n / 4;
    let m = ((n as f64).ln().powi(2)).round() as usize;
    m.min(upper).max(lower)
}

/// Hannan-Rissanen preliminary estimates.
///
/// 1. Fit a long AR(m) by Yule-Walker and take its residuals as proxies for
///    the unobserved shocks.
/// 2. Regress y_t on y_{t-1..t-p} and the lagged residuals e_{t-1..t-q}.
///
/// Returns `None` when the series is too short or the regression is singular.
pub fn hannan_rissanen(y: &[f64], order: ArmaOrder) -> Option<(Vec<f64>, Vec<f64>)> {
    let (p, q) = (order.p, order.q);
    if q == 0 {
        return burg_ar(y, p).map(|ar| (ar, vec![]));
    }

    let n = y.len();
    let m = long_ar_order(n, order);
    let long_ar = yule_walker(y, m)?;

    // resid[t - m] is the shock proxy at time t
    let resid = ar_residuals(y, &long_ar);
    // m > p, so the first usable row needs only the q lagged residuals
    let start = m + q;
    let n_cols = p + q;
    if n <= start || n - start <= n_cols {
        return None;
    }
    let n_rows = n - start;

    let mut x = DMatrix::<f64>::zeros(n_rows, n_cols);
    let mut b = DVector::<f64>::zeros(n_rows);
    for (row, t) in (start..n).enumerate() {
        b[row] = y[t];
        for i in 0..p {
            x[(row, i)] = y[t - 1 - i];
        }
        for j in 0..q {
            x[(row, p + j)] = resid[t - 1 - j - m];
        }
    }

    let coeffs = x.svd(true, true).solve(&b, 1e-12).ok()?;
    if coeffs.iter().any(|c| !c.is_finite()) {
        return None;
    }
    let coeffs = coeffs.as_slice();
    Some((coeffs[..p].to_vec(), coeffs[p..].to_vec()))
}

/// Compute starting parameters for an ARMA(p,q) fit.
///
/// The result satisfies the constraints enforced by `config`; `sigma2` holds
/// the variance of the conditional residuals at the start values.
pub fn compute_start_params(y: &[f64], order: ArmaOrder, config: &ArmaConfig) -> ArmaParams {
    let (p, q) = (order.p, order.q);

    let (mut ar, mut ma) = hannan_rissanen(y, order).unwrap_or_else(|| {
        let ar = burg_ar(y, p)
            .or_else(|| yule_walker(y, p))
            .unwrap_or_else(|| vec![0.0; p]);
        let ma = innovations_ma(&ar_residuals(y, &ar), q);
        (ar, ma)
    });

    if config.enforce_stationarity && !polynomial::is_stationary(&ar) {
        ar = yule_walker(y, p)
            .filter(|a| polynomial::is_stationary(a))
            .unwrap_or_else(|| vec![0.0; p]);
    }
    if config.enforce_invertibility && !polynomial::is_invertible(&ma) {
        ma = vec![0.0; q];
    }

    let sigma2 = conditional_variance(y, &ar, &ma)
        .or_else(|| Some(autocovariance(y, 0)).filter(|v| *v > 0.0))
        .unwrap_or(1.0);

    ArmaParams::new(ar, ma, sigma2)
}

/// Mean squared ARMA residual with zero pre-sample values.
fn conditional_variance(y: &[f64], ar: &[f64], ma: &[f64]) -> Option<f64> {
    let mut errors: Vec<f64> = Vec::with_capacity(y.len());
    for t in 0..y.len() {
        let mut pred = 0.0;
        for (i, phi) in ar.iter().enumerate().take(t) {
            pred += phi * y[t - 1 - i];
        }
        for (j, theta) in ma.iter().enumerate().take(t) {
            pred += theta * errors[t - 1 - j];
        }
        errors.push(y[t] - pred);
    }
    let var = errors.iter().map(|e| e * e).sum::<f64>() / y.len().max(1) as f64;
    (var.is_finite() && var > 0.0).then_some(var)
}
