//! Training-time data preprocessing
//!
//! Turns the raw vehicle sales table into the cleaned table the encoders and
//! the regressor are fitted on:
//! - Field normalization (levy sentinel, unit-suffixed numerics, Yes/No flags)
//! - IQR outlier removal, applied column by column
//! - Derived columns (log1p variants, vehicle age)
//! - Category curation (vintage window, low-signal manufacturers)
//! - Fitting of the one-hot/label encoders and the numeric scaler

mod config;
mod encoder;
mod scaler;
mod pipeline;
pub mod normalize;
pub mod outlier;
pub mod transforms;
pub mod curation;

pub use config::{current_year, PreprocessingConfig};
pub use encoder::{HandleUnknown, LabelEncoder, LabelEncoders, OneHotEncoder};
pub use scaler::{Scaler, ScalerParams, ScalerType};
pub use pipeline::{manufacturer_models, FittedArtifacts, PipelineOutput, PipelineReport, StageShape, TrainingPipeline};
pub use outlier::{OutlierBounds, OutlierFilter};
pub use curation::{CategoryCurator, CurationOutcome};

use crate::error::{CarPriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column names of the vehicle sales dataset.
///
/// Both the training pipeline and the inference replay address columns
/// through these constants, so the two paths cannot drift apart.
pub mod columns {
    pub const ID: &str = "ID";
    pub const PRICE: &str = "Price";
    pub const LEVY: &str = "Levy";
    pub const MANUFACTURER: &str = "Manufacturer";
    pub const MODEL: &str = "Model";
    pub const PROD_YEAR: &str = "Prod. year";
    pub const CATEGORY: &str = "Category";
    pub const LEATHER_INTERIOR: &str = "Leather interior";
    pub const FUEL_TYPE: &str = "Fuel type";
    pub const ENGINE_VOLUME: &str = "Engine volume";
    pub const MILEAGE: &str = "Mileage";
    pub const CYLINDERS: &str = "Cylinders";
    pub const GEAR_BOX_TYPE: &str = "Gear box type";
    pub const DRIVE_WHEELS: &str = "Drive wheels";
    pub const DOORS: &str = "Doors";
    pub const WHEEL: &str = "Wheel";
    pub const COLOR: &str = "Color";
    pub const AIRBAGS: &str = "Airbags";

    pub const AGE: &str = "Age";
    pub const LEVY_LOG1P: &str = "Levy_logp1";
    pub const ENGINE_VOLUME_LOG1P: &str = "Engine_volume_logp1";
    pub const MILEAGE_LOG1P: &str = "Mileage_logp1";

    /// Low-cardinality nominal columns, one-hot encoded
    pub const ONE_HOT: [&str; 4] = [GEAR_BOX_TYPE, DRIVE_WHEELS, WHEEL, FUEL_TYPE];
    /// Higher-cardinality nominal columns, label encoded
    pub const LABEL: [&str; 4] = [MANUFACTURER, MODEL, CATEGORY, COLOR];
    /// Continuous columns handled by the scaler
    pub const SCALED: [&str; 4] = [LEVY, ENGINE_VOLUME, MILEAGE, AGE];
    /// Columns screened by the outlier filter, in processing order
    pub const OUTLIER_SCREENED: [&str; 4] = [PRICE, LEVY, ENGINE_VOLUME, MILEAGE];
    /// Columns dropped once curation is done
    pub const DROPPED_AFTER_CURATION: [&str; 3] = [ID, PROD_YEAR, DOORS];
}

/// Column data type for dataset summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    Unknown,
}

/// Per-column summary statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub dtype: ColumnType,
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub unique_count: Option<usize>,
}

impl FeatureStats {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
            count: 0,
            null_count: 0,
            mean: None,
            min: None,
            max: None,
            median: None,
            unique_count: None,
        }
    }

    /// Summarize one column, numeric or string
    pub fn from_column(column: &Column) -> Result<Self> {
        let name = column.name().to_string();

        if column.dtype().is_primitive_numeric() {
            let mut stats = Self::new(name, ColumnType::Numeric);
            stats.count = column.len();
            stats.null_count = column.null_count();

            let casted = column.cast(&DataType::Float64)?;
            let mut values: Vec<f64> = casted.f64()?.into_iter().flatten().collect();
            if !values.is_empty() {
                values.sort_by(f64::total_cmp);
                stats.mean = Some(values.iter().sum::<f64>() / values.len() as f64);
                stats.min = values.first().copied();
                stats.max = values.last().copied();
                stats.median = Some(quantile_linear(&values, 0.5));
            }
            return Ok(stats);
        }

        let dtype = if matches!(column.dtype(), DataType::String) {
            ColumnType::Categorical
        } else {
            ColumnType::Unknown
        };
        let mut stats = Self::new(name, dtype);
        stats.count = column.len();
        stats.null_count = column.null_count();
        stats.unique_count = Some(column.n_unique()?);
        Ok(stats)
    }
}

/// Summarize every column of a table
pub fn describe(df: &DataFrame) -> Result<Vec<FeatureStats>> {
    df.get_columns().iter().map(FeatureStats::from_column).collect()
}

/// Quantile of already sorted values using linear interpolation between the
/// two closest ranks. `sorted` must be non-empty.
pub(crate) fn quantile_linear(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Fetch a column by name, reporting a missing column explicitly
pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| CarPriceError::MissingColumn(name.to_string()))
}

/// Fetch a column cast to f64, keeping nulls
pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = require_column(df, name)?.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}
