//! Ordered feature schema and row assembly

use crate::error::{CarPriceError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// The exact feature names, in order, a model was trained on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

/// A single encoded record: named numeric cells in assembly order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.names.push(name.into());
        self.values.push(value);
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Verify that `names` matches the schema exactly, reporting the first
    /// divergence
    pub fn check(&self, names: &[String]) -> Result<()> {
        if let Some(i) = (0..self.len().max(names.len()))
            .find(|&i| self.names.get(i) != names.get(i))
        {
            return Err(CarPriceError::SchemaMismatch {
                expected: describe(self.names.len(), i, self.names.get(i)),
                actual: describe(names.len(), i, names.get(i)),
            });
        }
        Ok(())
    }

    /// Check the row against the schema and lay it out as a 1 x n matrix
    pub fn assemble(&self, row: &FeatureRow) -> Result<Array2<f64>> {
        self.check(row.names())?;
        Ok(Array2::from_shape_vec((1, row.len()), row.values().to_vec())?)
    }
}

fn describe(len: usize, at: usize, name: Option<&String>) -> String {
    match name {
        Some(name) => format!("{} features, '{}' at position {}", len, name, at),
        None => format!("{} features, nothing at position {}", len, at),
    }
}
