// projeto: bilstm_price
// file: src/rna/scaler.rs
// Min-max normalisation of a single price column

use log::debug;
use serde::{Deserialize, Serialize};

use crate::rna::utils::{PredictorError, Result, ensure_finite};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct FittedRange {
    data_min: f64,
    data_max: f64,
}

/// Affine map from the fitted `[data_min, data_max]` onto `feature_range`.
///
/// Values outside the fitted range are mapped with the same affine transform,
/// so they land outside `feature_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    fitted: Option<FittedRange>,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self { feature_range: (0.0, 1.0), fitted: None }
    }
}

impl MinMaxScaler {
    pub fn new(feature_range: (f64, f64)) -> Result<Self> {
        let (low, high) = feature_range;
        if !(low.is_finite() && high.is_finite()) || low >= high {
            return Err(PredictorError::InvalidConfig(format!(
                "feature range must be finite and increasing, got ({low}, {high})"
            )));
        }
        Ok(Self { feature_range, fitted: None })
    }

    pub fn feature_range(&self) -> (f64, f64) {
        self.feature_range
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn data_min(&self) -> Option<f64> {
        self.fitted.map(|f| f.data_min)
    }

    pub fn data_max(&self) -> Option<f64> {
        self.fitted.map(|f| f.data_max)
    }

    /// Discards any previous fit and learns min/max from `values`.
    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(PredictorError::InsufficientHistory { required: 1, actual: 0 });
        }
        ensure_finite(values)?;

        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        self.fitted = Some(FittedRange { data_min, data_max });
        debug!("📏 Scaler fitted - min: {:.4}, max: {:.4}", data_min, data_max);
        Ok(())
    }

    pub fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        self.fit(values)?;
        self.transform(values)
    }

    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (scale, offset) = self.coefficients()?;
        Ok(values.iter().map(|&x| x * scale + offset).collect())
    }

    pub fn transform_one(&self, value: f64) -> Result<f64> {
        let (scale, offset) = self.coefficients()?;
        Ok(value * scale + offset)
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (scale, offset) = self.coefficients()?;
        Ok(values.iter().map(|&x| (x - offset) / scale).collect())
    }

    pub fn inverse_transform_one(&self, value: f64) -> Result<f64> {
        let (scale, offset) = self.coefficients()?;
        Ok((value - offset) / scale)
    }

    pub fn reset(&mut self) {
        self.fitted = None;
    }

    // A flat series has zero range; a unit denominator keeps the map invertible.
    fn coefficients(&self) -> Result<(f64, f64)> {
        let fitted = self.fitted.ok_or(PredictorError::ScalerNotFitted)?;
        let (low, high) = self.feature_range;
        let mut data_range = fitted.data_max - fitted.data_min;
        if data_range.abs() < f64::EPSILON * 10.0 {
            data_range = 1.0;
        }
        let scale = (high - low) / data_range;
        let offset = low - fitted.data_min * scale;
        Ok((scale, offset))
    }
}
