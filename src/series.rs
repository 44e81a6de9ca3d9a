use crate::error::{ArmaError, Result};

/// Observed, equally spaced scalar time series.
///
/// Construction rejects empty input and non-finite values; the buffer is
/// immutable afterwards and is shared by reference across candidate fits.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ArmaError::DataError("time series is empty".into()));
        }
        if let Some(t) = values.iter().position(|v| !v.is_finite()) {
            return Err(ArmaError::DataError(format!(
                "non-finite observation at t={}: {}",
                t, values[t]
            )));
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.len() as f64
    }

    /// Population variance (divisor T).
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.len() as f64
    }

    /// Observations with the sample mean removed.
    pub fn demeaned(&self) -> Vec<f64> {
        let mean = self.mean();
        self.values.iter().map(|v| v - mean).collect()
    }
}

impl TryFrom<Vec<f64>> for TimeSeries {
    type Error = ArmaError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl TryFrom<&[f64]> for TimeSeries {
    type Error = ArmaError;

    fn try_from(values: &[f64]) -> Result<Self> {
        Self::new(values.to_vec())
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        let err = TimeSeries::new(vec![]).unwrap_err();
        assert!(matches!(err, ArmaError::DataError(_)));
    }

    #[test]
    fn test_rejects_nan_and_inf() {
        assert!(TimeSeries::new(vec![1.0, f64::NAN, 3.0]).is_err());
        let err = TimeSeries::new(vec![1.0, 2.0, f64::INFINITY]).unwrap_err();
        assert!(err.to_string().contains("t=2"));
    }

    #[test]
    fn test_moments() {
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(ts.len(), 4);
        assert!((ts.mean() - 2.5).abs() < 1e-12);
        assert!((ts.variance() - 1.25).abs() < 1e-12);
        let centered = ts.demeaned();
        assert!((centered.iter().sum::<f64>()).abs() < 1e-12);
        assert!((centered[0] + 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_try_from_slice() {
        let data = [0.5, -0.5];
        let ts = TimeSeries::try_from(&data[..]).unwrap();
        assert_eq!(ts.as_slice(), &data);
    }
}
