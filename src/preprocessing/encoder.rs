//! Categorical encoders
//!
//! Both encoders learn a sorted vocabulary per column at fit time. After
//! fitting they are immutable and are replayed as-is on inference records.

use crate::error::{CarPriceError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::require_column;

/// What the one-hot encoder does with a category it never saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Reject the record
    #[default]
    Error,
    /// Emit an all-zero indicator block
    Ignore,
}

fn sorted_vocabulary(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let values = require_column(df, column)?.cast(&DataType::String)?;
    let vocabulary: BTreeSet<String> = values
        .str()?
        .into_iter()
        .flatten()
        .map(String::from)
        .collect();
    Ok(vocabulary.into_iter().collect())
}

/// One-hot encoder over several columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    /// Sorted categories, one list per column
    categories: Vec<Vec<String>>,
    #[serde(default)]
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    /// Build an encoder from known vocabularies. Categories are sorted.
    pub fn new(columns: Vec<String>, mut categories: Vec<Vec<String>>) -> Result<Self> {
        if columns.len() != categories.len() {
            return Err(CarPriceError::Config(format!(
                "one-hot encoder has {} columns but {} category lists",
                columns.len(),
                categories.len()
            )));
        }
        for cats in &mut categories {
            cats.sort();
            cats.dedup();
        }
        Ok(Self {
            columns,
            categories,
            handle_unknown: HandleUnknown::default(),
        })
    }

    /// Learn the vocabulary of each column
    pub fn fit(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let categories = columns
            .iter()
            .map(|c| sorted_vocabulary(df, c))
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns.iter().map(|c| c.to_string()).collect(), categories)
    }

    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Names of the indicator columns, `<column>_<category>`, in output order
    pub fn feature_names_out(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(col, cats)| cats.iter().map(move |cat| format!("{}_{}", col, cat)))
            .collect()
    }

    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Encode one record. `values` holds one entry per encoder column, in
    /// encoder column order.
    pub fn transform_values(&self, values: &[&str]) -> Result<Vec<f64>> {
        if values.len() != self.columns.len() {
            return Err(CarPriceError::SchemaMismatch {
                expected: format!("{} one-hot inputs", self.columns.len()),
                actual: format!("{} values", values.len()),
            });
        }

        let mut encoded = Vec::with_capacity(self.n_features_out());
        for ((column, cats), value) in self.columns.iter().zip(&self.categories).zip(values) {
            let hit = cats.binary_search_by(|c| c.as_str().cmp(*value)).ok();
            if hit.is_none() && self.handle_unknown == HandleUnknown::Error {
                return Err(CarPriceError::unknown_category(column.as_str(), *value));
            }
            encoded.extend((0..cats.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
        }
        Ok(encoded)
    }

    /// Encode a whole table: append the indicator columns and drop the sources
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (column, cats) in self.columns.iter().zip(&self.categories) {
            let source = require_column(df, column)?.cast(&DataType::String)?;
            let ca = source.str()?;

            if self.handle_unknown == HandleUnknown::Error {
                if let Some(unknown) = ca
                    .into_iter()
                    .flatten()
                    .find(|v| cats.binary_search_by(|c| c.as_str().cmp(*v)).is_err())
                {
                    return Err(CarPriceError::unknown_category(column.as_str(), unknown));
                }
            }

            for cat in cats {
                let indicator: Vec<f64> = ca
                    .into_iter()
                    .map(|v| if v == Some(cat.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                result.with_column(Series::new(format!("{}_{}", column, cat).into(), indicator))?;
            }
            result = result.drop(column)?;
        }
        Ok(result)
    }
}

/// Label encoder for a single column: category -> position in sorted classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Build from known classes. Classes are sorted and deduplicated.
    pub fn new(mut classes: Vec<String>) -> Self {
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn fit(df: &DataFrame, column: &str) -> Result<Self> {
        Ok(Self {
            classes: sorted_vocabulary(df, column)?,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Whether classes are strictly ascending, as lookups require
    pub fn is_sorted(&self) -> bool {
        self.classes.windows(2).all(|w| w[0] < w[1])
    }

    /// Encode a value of `field`, failing on classes never seen at fit time
    pub fn transform(&self, field: &str, value: &str) -> Result<i64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .map(|idx| idx as i64)
            .map_err(|_| CarPriceError::unknown_category(field, value))
    }

    pub fn inverse_transform(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }
}

/// Per-column label encoders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelEncoders {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl LabelEncoders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let encoders = columns
            .iter()
            .map(|c| Ok((c.to_string(), LabelEncoder::fit(df, c)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { encoders })
    }

    pub fn insert(&mut self, column: impl Into<String>, encoder: LabelEncoder) {
        self.encoders.insert(column.into(), encoder);
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    /// Encode `value` with the encoder fitted on `column`
    pub fn encode(&self, column: &str, value: &str) -> Result<i64> {
        self.get(column)
            .ok_or_else(|| CarPriceError::Inference(format!("no label encoder for column '{}'", column)))?
            .transform(column, value)
    }

    /// Replace every encoded column of a table with its integer codes
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (column, encoder) in &self.encoders {
            let source = require_column(df, column)?.cast(&DataType::String)?;
            let codes = source
                .str()?
                .into_iter()
                .map(|v| v.map(|v| encoder.transform(column, v)).transpose())
                .collect::<Result<Vec<Option<i64>>>>()?;
            result.with_column(Series::new(column.as_str().into(), codes))?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "Gear box type" => &["Automatic", "Tiptronic", "Automatic", "Manual"],
            "Wheel" => &["Left wheel", "Left wheel", "Right-hand drive", "Left wheel"],
            "Manufacturer" => &["TOYOTA", "HONDA", "TOYOTA", "BMW"]
        )
        .unwrap()
    }

    #[test]
    fn test_one_hot_feature_names_sorted() {
        let encoder = OneHotEncoder::fit(&frame(), &["Gear box type", "Wheel"]).unwrap();
        assert_eq!(
            encoder.feature_names_out(),
            vec![
                "Gear box type_Automatic",
                "Gear box type_Manual",
                "Gear box type_Tiptronic",
                "Wheel_Left wheel",
                "Wheel_Right-hand drive",
            ]
        );
        assert_eq!(encoder.n_features_out(), 5);
    }

    #[test]
    fn test_one_hot_transform_values() {
        let encoder = OneHotEncoder::fit(&frame(), &["Gear box type", "Wheel"]).unwrap();
        let row = encoder.transform_values(&["Manual", "Right-hand drive"]).unwrap();
        assert_eq!(row, vec![0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_one_hot_unknown_category() {
        let encoder = OneHotEncoder::fit(&frame(), &["Gear box type", "Wheel"]).unwrap();
        let err = encoder.transform_values(&["Variator", "Left wheel"]).unwrap_err();
        assert!(matches!(err, CarPriceError::UnknownCategory { ref field, .. } if field == "Gear box type"));

        let lenient = encoder.with_handle_unknown(HandleUnknown::Ignore);
        let row = lenient.transform_values(&["Variator", "Left wheel"]).unwrap();
        assert_eq!(row, vec![0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_one_hot_frame_transform() {
        let df = frame();
        let encoder = OneHotEncoder::fit(&df, &["Wheel"]).unwrap();
        let result = encoder.transform(&df).unwrap();
        assert!(result.column("Wheel").is_err());
        let left = result.column("Wheel_Left wheel").unwrap().f64().unwrap();
        assert_eq!(left.sum(), Some(3.0));
    }

    #[test]
    fn test_label_encoder_sorted_codes() {
        let encoder = LabelEncoder::fit(&frame(), "Manufacturer").unwrap();
        assert_eq!(encoder.classes(), &["BMW", "HONDA", "TOYOTA"]);
        assert!(encoder.is_sorted());
        assert_eq!(encoder.transform("Manufacturer", "TOYOTA").unwrap(), 2);
        assert_eq!(encoder.inverse_transform(1), Some("HONDA"));
        assert!(matches!(
            encoder.transform("Manufacturer", "ZAZ"),
            Err(CarPriceError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_label_encoders_roundtrip_json() {
        let encoders = LabelEncoders::fit(&frame(), &["Manufacturer", "Wheel"]).unwrap();
        let json = serde_json::to_string(&encoders).unwrap();
        assert!(json.starts_with("{\"Manufacturer\""));
        let restored: LabelEncoders = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, encoders);
        assert_eq!(restored.encode("Wheel", "Right-hand drive").unwrap(), 1);
        assert!(restored.encode("Color", "Black").is_err());
    }
}
