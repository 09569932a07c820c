//! Field normalization
//!
//! Converts the four string-encoded columns of the raw dataset into clean
//! numeric form. Cell parsers are exposed so the inference path can reuse the
//! exact same rules on a single record.

use crate::error::{CarPriceError, Result};
use polars::prelude::*;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use super::{columns, require_column};

/// Placeholder the dataset uses for "no levy"
pub const LEVY_SENTINEL: &str = "-";

fn engine_volume_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d*\.\d+|\d+").expect("engine volume pattern is valid"))
}

fn mileage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("mileage pattern is valid"))
}

/// Parse a levy cell: the sentinel means zero, anything else must be an integer
pub fn parse_levy(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed == LEVY_SENTINEL {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| CarPriceError::parse(columns::LEVY, raw))
}

/// Extract the first decimal-or-integer token of an engine volume cell
/// ("2.0 Turbo" -> 2.0, "3" -> 3.0)
pub fn parse_engine_volume(raw: &str) -> Result<f64> {
    engine_volume_pattern()
        .find(raw)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| CarPriceError::parse(columns::ENGINE_VOLUME, raw))
}

/// Extract the first integer token of a mileage cell ("150000 km" -> 150000)
pub fn parse_mileage(raw: &str) -> Result<i64> {
    mileage_pattern()
        .find(raw)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| CarPriceError::parse(columns::MILEAGE, raw))
}

/// Map the leather interior flag. Only the literal "Yes"/"No" are recognised.
pub fn parse_leather_interior(raw: &str) -> Option<i64> {
    match raw {
        "Yes" => Some(1),
        "No" => Some(0),
        _ => None,
    }
}

/// Normalize the levy, engine volume, mileage and leather interior columns.
///
/// Returns a new table; the input is left untouched. Columns that are
/// already numeric pass through with only a dtype cast, so normalizing twice
/// yields the same table.
pub fn normalize(df: &DataFrame) -> Result<DataFrame> {
    let levy = normalize_levy(require_column(df, columns::LEVY)?)?;
    let engine = normalize_engine_volume(require_column(df, columns::ENGINE_VOLUME)?)?;
    let mileage = normalize_mileage(require_column(df, columns::MILEAGE)?)?;
    let leather = normalize_leather(require_column(df, columns::LEATHER_INTERIOR)?)?;

    let mut result = df.clone();
    for series in [levy, engine, mileage, leather] {
        result.with_column(series)?;
    }
    Ok(result)
}

fn normalize_levy(column: &Column) -> Result<Series> {
    parse_int_column(column, parse_levy)
}

fn normalize_mileage(column: &Column) -> Result<Series> {
    parse_int_column(column, parse_mileage)
}

fn normalize_engine_volume(column: &Column) -> Result<Series> {
    let name = column.name().clone();
    match column.dtype() {
        DataType::String => {
            let values = column
                .str()?
                .into_iter()
                .map(|cell| cell.map(parse_engine_volume).transpose())
                .collect::<Result<Vec<Option<f64>>>>()?;
            Ok(Series::new(name, values))
        }
        dtype if dtype.is_primitive_numeric() => cast_series(column, &DataType::Float64),
        other => Err(unsupported_dtype(&name, other)),
    }
}

fn normalize_leather(column: &Column) -> Result<Series> {
    let name = column.name().clone();
    match column.dtype() {
        DataType::String => {
            let mut unrecognised = 0usize;
            let values: Vec<Option<i64>> = column
                .str()?
                .into_iter()
                .map(|cell| {
                    let mapped = cell.and_then(parse_leather_interior);
                    if cell.is_some() && mapped.is_none() {
                        unrecognised += 1;
                    }
                    mapped
                })
                .collect();

            if unrecognised > 0 {
                warn!(
                    column = %name,
                    count = unrecognised,
                    "Unrecognised leather interior values mapped to null"
                );
            }
            Ok(Series::new(name, values))
        }
        dtype if dtype.is_primitive_numeric() => cast_series(column, &DataType::Int64),
        other => Err(unsupported_dtype(&name, other)),
    }
}

fn parse_int_column(column: &Column, parse: fn(&str) -> Result<i64>) -> Result<Series> {
    let name = column.name().clone();
    match column.dtype() {
        DataType::String => {
            let values = column
                .str()?
                .into_iter()
                .map(|cell| cell.map(parse).transpose())
                .collect::<Result<Vec<Option<i64>>>>()?;
            Ok(Series::new(name, values))
        }
        dtype if dtype.is_primitive_numeric() => cast_series(column, &DataType::Int64),
        other => Err(unsupported_dtype(&name, other)),
    }
}

fn cast_series(column: &Column, dtype: &DataType) -> Result<Series> {
    Ok(column.cast(dtype)?.as_materialized_series().clone())
}

fn unsupported_dtype(name: &PlSmallStr, dtype: &DataType) -> CarPriceError {
    CarPriceError::Data(format!("column '{}' has unsupported dtype {:?}", name, dtype))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df!(
            "Levy" => &["-", "500", "1399"],
            "Engine volume" => &["2.0 Turbo", "3", "1.8"],
            "Mileage" => &["150000 km", "0 km", "80000 km"],
            "Leather interior" => &["Yes", "No", "Maybe"]
        )
        .unwrap()
    }

    #[test]
    fn test_levy_sentinel() {
        assert_eq!(parse_levy("-").unwrap(), 0);
        assert_eq!(parse_levy("500").unwrap(), 500);
        assert!(matches!(parse_levy("n/a"), Err(CarPriceError::Parse { .. })));
    }

    #[test]
    fn test_engine_volume_extraction() {
        assert_eq!(parse_engine_volume("2.0 Turbo").unwrap(), 2.0);
        assert_eq!(parse_engine_volume("3").unwrap(), 3.0);
        assert_eq!(parse_engine_volume("1.25").unwrap(), 1.25);
        assert!(matches!(
            parse_engine_volume("Turbo"),
            Err(CarPriceError::Parse { ref field, .. }) if field == "Engine volume"
        ));
    }

    #[test]
    fn test_mileage_extraction() {
        assert_eq!(parse_mileage("150000 km").unwrap(), 150000);
        assert!(parse_mileage("km").is_err());
    }

    #[test]
    fn test_leather_mapping() {
        assert_eq!(parse_leather_interior("Yes"), Some(1));
        assert_eq!(parse_leather_interior("No"), Some(0));
        assert_eq!(parse_leather_interior("yes"), None);
    }

    #[test]
    fn test_normalize_frame() {
        let df = raw_frame();
        let result = normalize(&df).unwrap();

        let levy: Vec<Option<i64>> = result.column("Levy").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(levy, vec![Some(0), Some(500), Some(1399)]);

        let engine: Vec<Option<f64>> = result
            .column("Engine volume")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(engine, vec![Some(2.0), Some(3.0), Some(1.8)]);

        let leather: Vec<Option<i64>> = result
            .column("Leather interior")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(leather, vec![Some(1), Some(0), None]);

        // input untouched
        assert_eq!(df.column("Levy").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&raw_frame()).unwrap();
        let twice = normalize(&once).unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_normalize_rejects_malformed_levy() {
        let df = df!(
            "Levy" => &["-", "abc"],
            "Engine volume" => &["2.0", "2.0"],
            "Mileage" => &["1 km", "2 km"],
            "Leather interior" => &["Yes", "No"]
        )
        .unwrap();
        assert!(matches!(normalize(&df), Err(CarPriceError::Parse { .. })));
    }

    #[test]
    fn test_normalize_requires_columns() {
        let df = df!("Levy" => &["-"]).unwrap();
        assert!(matches!(normalize(&df), Err(CarPriceError::MissingColumn(_))));
    }
}
