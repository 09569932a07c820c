//! Preprocessing configuration

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::columns;

/// Configuration for the training-time preprocessing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Year the vehicle age is measured against.
    /// `None` means the current calendar year at transform time.
    pub reference_year: Option<i32>,

    /// Drop exact duplicate rows before anything else
    pub drop_duplicates: bool,

    /// Columns screened for outliers, processed in this order
    pub outlier_columns: Vec<String>,

    /// IQR multiplier for the outlier bounds
    pub iqr_factor: f64,

    /// Production years must be strictly greater than this
    pub min_year_exclusive: i64,

    /// Production years must be strictly lower than this
    pub max_year_exclusive: i64,

    /// Manufacturers ranked within this many by total revenue are kept
    pub top_by_revenue: usize,

    /// Manufacturers ranked within this many by unit count are kept
    pub top_by_count: usize,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            reference_year: None,
            drop_duplicates: true,
            outlier_columns: columns::OUTLIER_SCREENED.iter().map(|c| c.to_string()).collect(),
            iqr_factor: 1.5,
            min_year_exclusive: 1991,
            max_year_exclusive: 2020,
            top_by_revenue: 36,
            top_by_count: 31,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the reference year used for the `Age` column
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Builder method to set the outlier-screened columns
    pub fn with_outlier_columns(mut self, cols: &[&str]) -> Self {
        self.outlier_columns = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Builder method to set the IQR multiplier
    pub fn with_iqr_factor(mut self, factor: f64) -> Self {
        self.iqr_factor = factor;
        self
    }

    /// Builder method to set the production-year window (both ends exclusive)
    pub fn with_year_window(mut self, min_exclusive: i64, max_exclusive: i64) -> Self {
        self.min_year_exclusive = min_exclusive;
        self.max_year_exclusive = max_exclusive;
        self
    }

    /// Builder method to set the manufacturer brackets
    pub fn with_manufacturer_brackets(mut self, top_by_revenue: usize, top_by_count: usize) -> Self {
        self.top_by_revenue = top_by_revenue;
        self.top_by_count = top_by_count;
        self
    }

    /// Builder method to toggle duplicate removal
    pub fn with_drop_duplicates(mut self, drop: bool) -> Self {
        self.drop_duplicates = drop;
        self
    }

    /// Resolve the reference year, falling back to the current year
    pub fn resolved_reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(current_year)
    }
}

/// Current calendar year in local time
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
