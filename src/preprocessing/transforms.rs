//! Derived feature columns
//!
//! Adds log1p variants of the right-skewed numeric columns and the vehicle
//! age. The log columns only exist on the training table; the inference path
//! recomputes `Age` alone.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::{columns, float_values, require_column};

/// Kind of derived column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformType {
    /// ln(1 + x) of a source column
    Log1p,
    /// reference year minus a year column
    Age { reference_year: i32 },
}

/// Log1p transforms applied on the training table: (source, derived name)
pub const LOG1P_COLUMNS: [(&str, &str); 3] = [
    (columns::LEVY, columns::LEVY_LOG1P),
    (columns::ENGINE_VOLUME, columns::ENGINE_VOLUME_LOG1P),
    (columns::MILEAGE, columns::MILEAGE_LOG1P),
];

/// Derive a new column from `source` and append it under `target`
pub fn derive_column(
    df: &DataFrame,
    source: &str,
    target: &str,
    transform: &TransformType,
) -> Result<DataFrame> {
    let derived: Series = match transform {
        TransformType::Log1p => {
            let values: Float64Chunked = float_values(df, source)?
                .into_iter()
                .map(|v| v.map(f64::ln_1p))
                .collect();
            values.with_name(target.into()).into_series()
        }
        TransformType::Age { reference_year } => {
            let years = require_column(df, source)?.cast(&DataType::Int64)?;
            let ages: Int64Chunked = years
                .i64()?
                .into_iter()
                .map(|y| y.map(|y| vehicle_age(*reference_year, y)))
                .collect();
            ages.with_name(target.into()).into_series()
        }
    };

    let mut result = df.clone();
    result.with_column(derived)?;
    Ok(result)
}

/// Age of a vehicle produced in `production_year`, measured at `reference_year`
pub fn vehicle_age(reference_year: i32, production_year: i64) -> i64 {
    i64::from(reference_year) - production_year
}

/// Add `Levy_logp1`, `Engine_volume_logp1`, `Mileage_logp1`
pub fn add_log1p_columns(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();
    for (source, target) in LOG1P_COLUMNS {
        result = derive_column(&result, source, target, &TransformType::Log1p)?;
    }
    Ok(result)
}

/// Add the `Age` column from `Prod. year`
pub fn add_age(df: &DataFrame, reference_year: i32) -> Result<DataFrame> {
    derive_column(
        df,
        columns::PROD_YEAR,
        columns::AGE,
        &TransformType::Age { reference_year },
    )
}

/// Add every derived column used on the training table
pub fn transform(df: &DataFrame, reference_year: i32) -> Result<DataFrame> {
    add_age(&add_log1p_columns(df)?, reference_year)
}
