//! Python bindings (feature `python`).

use numpy::PyReadonlyArray1;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::ArmaError;
use crate::forecast;
use crate::kalman::{InnovationsFilter, KalmanFilter};
use crate::likelihood::{gaussian_loglike, Scale};
use crate::optimizer;
use crate::params::ArmaParams;
use crate::selection::OrderSelector;
use crate::series::TimeSeries;
use crate::types::{ArmaConfig, ArmaOrder, CandidateStatus, FitResult, InitializationMode};

fn value_err(e: ArmaError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_config(config_json: Option<&str>) -> PyResult<ArmaConfig> {
    match config_json {
        Some(text) => ArmaConfig::from_json(text).map_err(value_err),
        None => Ok(ArmaConfig::default()),
    }
}

fn parse_init(name: &str) -> PyResult<InitializationMode> {
    match name {
        "zeroPadding" => Ok(InitializationMode::ZeroPadding),
        "stationaryCovariance" => Ok(InitializationMode::StationaryCovariance),
        other => Err(PyValueError::new_err(format!(
            "unknown initialization mode '{}': expected 'zeroPadding' or 'stationaryCovariance'",
            other
        ))),
    }
}

fn fit_to_dict<'py>(py: Python<'py>, result: &FitResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("order", (result.order.p, result.order.q))?;
    dict.set_item("ar", result.params.ar.clone())?;
    dict.set_item("ma", result.params.ma.clone())?;
    dict.set_item("sigma2", result.params.sigma2)?;
    dict.set_item("loglike", result.loglike)?;
    dict.set_item("criterion", result.criterion)?;
    dict.set_item("aic", result.aic)?;
    dict.set_item("bic", result.bic)?;
    dict.set_item("n_obs", result.n_obs)?;
    dict.set_item("n_params", result.n_params())?;
    dict.set_item("n_iter", result.n_iter)?;
    dict.set_item("converged", result.status.is_converged())?;
    dict.set_item("method", result.method.clone())?;
    dict.set_item("mean", result.mean)?;
    Ok(dict)
}

/// Smoke-test function: returns the version string.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Log-likelihood of an ARMA(p,q) model at fixed parameters.
///
/// `params` is `[ar(p) | ma(q)]`, followed by sigma2 when the variance is
/// not concentrated.
#[pyfunction]
#[pyo3(signature = (y, order, params, concentrate_variance=true,
                    initialization="stationaryCovariance", demean=true))]
fn arma_loglike<'py>(
    y: PyReadonlyArray1<'py, f64>,
    order: (usize, usize),
    params: PyReadonlyArray1<'py, f64>,
    concentrate_variance: bool,
    initialization: &str,
    demean: bool,
) -> PyResult<f64> {
    let series = TimeSeries::new(y.as_slice()?.to_vec()).map_err(value_err)?;
    let order = ArmaOrder::new(order.0, order.1);
    let params = ArmaParams::from_flat(params.as_slice()?, order, !concentrate_variance)
        .map_err(value_err)?;
    let data = if demean {
        series.demeaned()
    } else {
        series.as_slice().to_vec()
    };

    let filter = KalmanFilter::new(parse_init(initialization)?);
    let innovations = filter.filter(&data, &params).map_err(value_err)?;
    let scale = if concentrate_variance {
        Scale::Concentrated
    } else {
        Scale::Fixed(params.sigma2)
    };
    let ll = gaussian_loglike(&innovations, scale).map_err(value_err)?;
    Ok(ll.loglike)
}

/// Fit a single ARMA(p,q) order. `config_json` uses the camelCase keys of
/// `ArmaConfig`; `maxAR`/`maxMA` are ignored here.
#[pyfunction]
#[pyo3(signature = (y, order, config_json=None))]
fn arma_fit<'py>(
    py: Python<'py>,
    y: PyReadonlyArray1<'py, f64>,
    order: (usize, usize),
    config_json: Option<&str>,
) -> PyResult<Py<PyDict>> {
    let config = parse_config(config_json)?;
    let series = TimeSeries::new(y.as_slice()?.to_vec()).map_err(value_err)?;
    let filter = KalmanFilter::new(config.initialization);
    let result = optimizer::fit(&series, ArmaOrder::new(order.0, order.1), &config, &filter, None)
        .map_err(value_err)?;
    Ok(fit_to_dict(py, &result)?.into())
}

/// Select the best order over the configured grid.
#[pyfunction]
#[pyo3(signature = (y, config_json=None))]
fn arma_select<'py>(
    py: Python<'py>,
    y: PyReadonlyArray1<'py, f64>,
    config_json: Option<&str>,
) -> PyResult<Py<PyDict>> {
    let config = parse_config(config_json)?;
    let series = TimeSeries::new(y.as_slice()?.to_vec()).map_err(value_err)?;
    let selector = OrderSelector::new(config).map_err(value_err)?;
    let selection = py.allow_threads(|| selector.select(&series)).map_err(value_err)?;

    let dict = fit_to_dict(py, &selection.best)?;
    let mut diagnostics = Vec::with_capacity(selection.diagnostics.len());
    for d in &selection.diagnostics {
        let row = PyDict::new(py);
        row.set_item("order", (d.order.p, d.order.q))?;
        let status = match d.status {
            CandidateStatus::Converged => "converged",
            CandidateStatus::NotConverged => "not_converged",
            CandidateStatus::TimedOut => "timed_out",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::Failed => "failed",
        };
        row.set_item("status", status)?;
        row.set_item("loglike", d.loglike)?;
        row.set_item("criterion", d.criterion)?;
        row.set_item("error", d.error.clone())?;
        diagnostics.push(row);
    }
    dict.set_item("diagnostics", diagnostics)?;
    Ok(dict.into())
}

#[pyfunction]
#[pyo3(signature = (y, ar, ma, sigma2, mean=0.0, steps=10, alpha=0.05,
                    initialization="stationaryCovariance"))]
#[allow(clippy::too_many_arguments)]
fn arma_forecast<'py>(
    py: Python<'py>,
    y: PyReadonlyArray1<'py, f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    mean: f64,
    steps: usize,
    alpha: f64,
    initialization: &str,
) -> PyResult<Py<PyDict>> {
    if steps > 10_000 {
        return Err(PyValueError::new_err(format!(
            "steps must be <= 10000, got {}",
            steps
        )));
    }
    let params = ArmaParams::new(ar, ma, sigma2);
    let result = forecast::forecast_pipeline(
        y.as_slice()?,
        &params,
        mean,
        parse_init(initialization)?,
        steps,
        alpha,
    )
    .map_err(value_err)?;

    let dict = PyDict::new(py);
    dict.set_item("mean", result.mean)?;
    dict.set_item("variance", result.variance)?;
    dict.set_item("ci_lower", result.ci_lower)?;
    dict.set_item("ci_upper", result.ci_upper)?;
    Ok(dict.into())
}

#[pyfunction]
#[pyo3(signature = (y, ar, ma, sigma2, mean=0.0, initialization="stationaryCovariance"))]
fn arma_residuals<'py>(
    py: Python<'py>,
    y: PyReadonlyArray1<'py, f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    mean: f64,
    initialization: &str,
) -> PyResult<Py<PyDict>> {
    let params = ArmaParams::new(ar, ma, sigma2);
    let result =
        forecast::residuals_pipeline(y.as_slice()?, &params, mean, parse_init(initialization)?)
            .map_err(value_err)?;

    let dict = PyDict::new(py);
    dict.set_item("residuals", result.residuals)?;
    dict.set_item("standardized_residuals", result.standardized_residuals)?;
    Ok(dict.into())
}

#[pymodule]
fn arma_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(arma_loglike, m)?)?;
    m.add_function(wrap_pyfunction!(arma_fit, m)?)?;
    m.add_function(wrap_pyfunction!(arma_select, m)?)?;
    m.add_function(wrap_pyfunction!(arma_forecast, m)?)?;
    m.add_function(wrap_pyfunction!(arma_residuals, m)?)?;
    Ok(())
}
