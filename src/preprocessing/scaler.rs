//! Feature scaling

use crate::error::{CarPriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::{float_values, quantile_linear};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Robust scaling using median and IQR
    Robust,
    /// No scaling
    None,
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64, // mean, min, or median
    pub scale: f64,  // std, range, or IQR
}

impl ScalerParams {
    fn apply(&self, v: f64) -> f64 {
        (v - self.center) / self.scale
    }

    fn invert(&self, v: f64) -> f64 {
        v * self.scale + self.center
    }
}

/// Joint scaler over an ordered set of numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    columns: Vec<String>,
    params: Vec<ScalerParams>,
}

impl Scaler {
    /// Create an unfitted scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            columns: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Rebuild a fitted scaler from stored statistics
    pub fn from_params(scaler_type: ScalerType, fitted: Vec<(String, ScalerParams)>) -> Self {
        let (columns, params) = fitted.into_iter().unzip();
        Self {
            scaler_type,
            columns,
            params,
        }
    }

    /// Fit the scaler to the data. Column order is kept and defines the
    /// order `transform_values` expects.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let params = columns
            .iter()
            .map(|c| self.compute_params(&float_values(df, c)?))
            .collect::<Result<Vec<_>>>()?;

        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.params = params;
        Ok(self)
    }

    pub fn is_fitted(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn params(&self, column: &str) -> Option<ScalerParams> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.params[i])
    }

    /// Scale one record's values, given in fitted column order
    pub fn transform_values(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.check_width(values)?;
        Ok(values
            .iter()
            .zip(&self.params)
            .map(|(v, p)| p.apply(*v))
            .collect())
    }

    /// Undo `transform_values`
    pub fn inverse_transform_values(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.check_width(values)?;
        Ok(values
            .iter()
            .zip(&self.params)
            .map(|(v, p)| p.invert(*v))
            .collect())
    }

    /// Transform the fitted columns of a table
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_columns(df, ScalerParams::apply)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_columns(df, ScalerParams::invert)
    }

    /// Builds all replacement columns first, then applies them in one pass
    fn map_columns(&self, df: &DataFrame, f: fn(&ScalerParams, f64) -> f64) -> Result<DataFrame> {
        if !self.is_fitted() {
            return Err(CarPriceError::Inference("scaler is not fitted".to_string()));
        }

        let replacements: Vec<Series> = self
            .columns
            .iter()
            .zip(&self.params)
            .map(|(name, params)| {
                let scaled: Float64Chunked = float_values(df, name)?
                    .into_iter()
                    .map(|opt| opt.map(|v| f(params, v)))
                    .collect();
                Ok(scaled.with_name(name.as_str().into()).into_series())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    fn check_width(&self, values: &[f64]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(CarPriceError::SchemaMismatch {
                expected: format!("{} scaled inputs ({})", self.columns.len(), self.columns.join(", ")),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(())
    }

    fn compute_params(&self, values: &[Option<f64>]) -> Result<ScalerParams> {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(CarPriceError::Data("cannot fit scaler on an all-null column".to_string()));
        }
        let n = present.len() as f64;

        let (center, scale) = match self.scaler_type {
            ScalerType::Standard => {
                let mean = present.iter().sum::<f64>() / n;
                // population std, ddof = 0
                let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                (mean, var.sqrt())
            }
            ScalerType::MinMax => {
                let min = present.iter().copied().fold(f64::INFINITY, f64::min);
                let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
            ScalerType::Robust => {
                present.sort_by(f64::total_cmp);
                let q1 = quantile_linear(&present, 0.25);
                let q3 = quantile_linear(&present, 0.75);
                (quantile_linear(&present, 0.5), q3 - q1)
            }
            ScalerType::None => (0.0, 1.0),
        };

        Ok(ScalerParams {
            center,
            scale: if scale == 0.0 { 1.0 } else { scale },
        })
    }
}
