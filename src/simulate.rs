//! Generative ARMA process as an iterator adapter over a shock stream.

use std::collections::VecDeque;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{ArmaError, Result};
use crate::params::ArmaParams;

/// ARMA recursion driven by an innovation stream:
///
/// x_t = phi_1 x_{t-1} + ... + phi_p x_{t-p} + e_t + theta_1 e_{t-1} + ... + theta_q e_{t-q}
///
/// Pre-sample values and shocks are zero. The adapter owns no randomness, so
/// cloning it before the first `next()` over a cloneable noise stream replays
/// the same path.
#[derive(Debug, Clone)]
pub struct Simulate<I> {
    noise: I,
    ar: Vec<f64>,
    ma: Vec<f64>,
    past_x: VecDeque<f64>,
    past_e: VecDeque<f64>,
}

impl<I: Iterator<Item = f64>> Simulate<I> {
    pub fn new(noise: I, params: &ArmaParams) -> Self {
        Self {
            noise,
            ar: params.ar.clone(),
            ma: params.ma.clone(),
            past_x: VecDeque::from(vec![0.0; params.ar.len()]),
            past_e: VecDeque::from(vec![0.0; params.ma.len()]),
        }
    }
}

impl<I: Iterator<Item = f64>> Iterator for Simulate<I> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let e = self.noise.next()?;
        let ar_part: f64 = self.ar.iter().zip(&self.past_x).map(|(phi, x)| phi * x).sum();
        let ma_part: f64 = self.ma.iter().zip(&self.past_e).map(|(theta, e)| theta * e).sum();
        let x = ar_part + e + ma_part;

        if !self.ar.is_empty() {
            self.past_x.pop_back();
            self.past_x.push_front(x);
        }
        if !self.ma.is_empty() {
            self.past_e.pop_back();
            self.past_e.push_front(e);
        }
        Some(x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.noise.size_hint()
    }
}

impl ArmaParams {
    /// Feed `noise` through this model. `sigma2` is not applied: the shocks are
    /// taken as given.
    pub fn simulate<I: IntoIterator<Item = f64>>(&self, noise: I) -> Simulate<I::IntoIter> {
        Simulate::new(noise.into_iter(), self)
    }
}

/// Gaussian shocks with variance `sigma2`.
pub fn gaussian_noise<R: Rng>(sigma2: f64, rng: R) -> Result<impl Iterator<Item = f64>> {
    if !(sigma2.is_finite() && sigma2 > 0.0) {
        return Err(ArmaError::DataError(format!(
            "noise variance must be positive, got {}",
            sigma2
        )));
    }
    let normal = Normal::new(0.0, sigma2.sqrt()).map_err(|e| ArmaError::DataError(e.to_string()))?;
    Ok(normal.sample_iter(rng))
}

/// Draw `n` observations after discarding `burn_in` warm-up values.
pub fn generate_sample<R: Rng>(
    params: &ArmaParams,
    n: usize,
    burn_in: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if !params.is_stationary() {
        return Err(ArmaError::DataError(
            "cannot draw a stationary sample from a non-stationary AR polynomial".into(),
        ));
    }
    let noise = gaussian_noise(params.sigma2, rng)?;
    Ok(params.simulate(noise).skip(burn_in).take(n).collect())
}
