use crate::error::{ArmaError, Result};
use crate::polynomial::{self, from_reflection_coefficients, to_reflection_coefficients};
use crate::types::ArmaOrder;

/// ARMA(p,q) coefficients and innovation variance.
///
/// Flat layout (optimizer order): `[ar(p) | ma(q) | sigma2?]`
///
/// When the variance is concentrated out of the likelihood, `sigma2` is not
/// part of the flat vector and holds 1.0 until the fit resolves it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmaParams {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub sigma2: f64,
}

impl ArmaParams {
    pub fn new(ar: Vec<f64>, ma: Vec<f64>, sigma2: f64) -> Self {
        Self { ar, ma, sigma2 }
    }

    /// White noise with variance `sigma2`.
    pub fn white_noise(sigma2: f64) -> Self {
        Self::new(vec![], vec![], sigma2)
    }

    pub fn order(&self) -> ArmaOrder {
        ArmaOrder::new(self.ar.len(), self.ma.len())
    }

    pub fn is_stationary(&self) -> bool {
        polynomial::is_stationary(&self.ar)
    }

    pub fn is_invertible(&self) -> bool {
        polynomial::is_invertible(&self.ma)
    }

    /// See [`polynomial::identifiability_issue`].
    pub fn identifiability_issue(&self) -> Option<String> {
        polynomial::identifiability_issue(&self.ar, &self.ma)
    }

    /// Unpack a flat parameter vector.
    pub fn from_flat(flat: &[f64], order: ArmaOrder, with_sigma2: bool) -> Result<Self> {
        let (p, q) = (order.p, order.q);
        let expected = p + q + usize::from(with_sigma2);
        if flat.len() != expected {
            return Err(ArmaError::ParamLengthMismatch {
                expected,
                got: flat.len(),
            });
        }
        let sigma2 = if with_sigma2 { flat[p + q] } else { 1.0 };
        Ok(Self {
            ar: flat[..p].to_vec(),
            ma: flat[p..p + q].to_vec(),
            sigma2,
        })
    }

    /// Pack into the flat layout.
    pub fn to_flat(&self, with_sigma2: bool) -> Vec<f64> {
        let mut v = Vec::with_capacity(self.ar.len() + self.ma.len() + 1);
        v.extend(&self.ar);
        v.extend(&self.ma);
        if with_sigma2 {
            v.push(self.sigma2);
        }
        v
    }
}

// ---------------------------------------------------------------------------
// Monahan (1984) / Jones (1980) parameter transformations
// ---------------------------------------------------------------------------

/// Transform unconstrained parameters to stationary AR coefficients.
///
/// 1. Map each x[k] to a partial autocorrelation `r[k] = x[k] / sqrt(1 + x[k]^2)`
/// 2. Levinson-Durbin recursion turns the PACF into AR coefficients
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let pacf: Vec<f64> = unconstrained
        .iter()
        .map(|&x| x / (1.0 + x * x).sqrt())
        .collect();
    from_reflection_coefficients(&pacf)
}

/// Inverse transform: stationary AR coefficients -> unconstrained parameters.
///
/// Coefficients on or outside the stationarity boundary are pulled just
/// inside it.
pub fn unconstrain_stationary(constrained: &[f64]) -> Vec<f64> {
    let pacf = to_reflection_coefficients(constrained).unwrap_or_else(|| {
        // Step down without the stability check, clamping each coefficient.
        clamped_reflection_coefficients(constrained)
    });
    pacf.iter()
        .map(|&r| {
            let r = r.clamp(-1.0 + 1e-8, 1.0 - 1e-8);
            r / (1.0 - r * r).sqrt()
        })
        .collect()
}

fn clamped_reflection_coefficients(ar: &[f64]) -> Vec<f64> {
    let n = ar.len();
    let mut a = ar.to_vec();
    let mut r = vec![0.0; n];
    for k in (0..n).rev() {
        let rk = a[k].clamp(-1.0 + 1e-8, 1.0 - 1e-8);
        r[k] = rk;
        let denom = 1.0 - rk * rk;
        let prev: Vec<f64> = (0..k).map(|j| (a[j] + rk * a[k - 1 - j]) / denom).collect();
        a[..k].copy_from_slice(&prev);
    }
    r
}

/// Transform unconstrained parameters to invertible MA coefficients.
/// Same as stationary transform but with sign flip.
pub fn constrain_invertible(unconstrained: &[f64]) -> Vec<f64> {
    constrain_stationary(unconstrained)
        .iter()
        .map(|&x| -x)
        .collect()
}

/// Inverse: invertible MA coefficients -> unconstrained parameters.
pub fn unconstrain_invertible(constrained: &[f64]) -> Vec<f64> {
    let negated: Vec<f64> = constrained.iter().map(|&x| -x).collect();
    unconstrain_stationary(&negated)
}

/// Constrain variance: unconstrained -> positive (x^2).
pub fn constrain_variance(x: f64) -> f64 {
    x * x
}

/// Unconstrain variance: positive -> unconstrained (sqrt).
pub fn unconstrain_variance(s: f64) -> Result<f64> {
    if !(s.is_finite() && s > 0.0) {
        return Err(ArmaError::DataError(format!(
            "variance sigma2 must be positive, got {}",
            s
        )));
    }
    Ok(s.sqrt())
}
