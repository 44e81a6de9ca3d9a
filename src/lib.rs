//! ARMA(p, q) fitting and order selection.
//!
//! Exact Gaussian likelihood through a Kalman filter on the Harvey state-space
//! form, L-BFGS maximization over constrained parameters, and a parallel
//! AIC/BIC sweep over candidate orders.

pub mod error;
pub mod types;
pub mod series;
pub mod params;
pub mod polynomial;
pub mod state_space;
pub mod initialization;
pub mod kalman;
pub mod likelihood;
pub mod start_params;
pub mod optimizer;
pub mod selection;
pub mod forecast;
pub mod simulate;

#[cfg(feature = "python")]
mod python;

pub use error::{ArmaError, Result};
pub use kalman::{ConditionalSumOfSquares, InnovationsFilter, KalmanFilter};
pub use optimizer::fit;
pub use params::ArmaParams;
pub use selection::{OrderSelector, Selection};
pub use series::TimeSeries;
pub use simulate::generate_sample;
pub use types::{ArmaConfig, ArmaOrder, FitResult, FitStatus, InformationCriterion, InitializationMode};
