//! Outlier removal
//!
//! Removes rows whose value in a screened column falls outside the
//! interquartile-range fences of that column. Columns are processed one
//! after another: quartiles for a column are computed on the rows that
//! survived every previous column.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{float_values, quantile_linear};

/// Fences computed for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl OutlierBounds {
    /// Whether a value lies inside the fences (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Sequential IQR outlier filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierFilter {
    factor: f64,
    columns: Vec<String>,
}

impl OutlierFilter {
    /// Create a filter with the given IQR multiplier
    pub fn iqr(factor: f64) -> Self {
        Self {
            factor,
            columns: Vec::new(),
        }
    }

    /// Set the columns to screen, in processing order
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Remove outlier rows. Returns the filtered table and the fences used
    /// for every column, in processing order.
    pub fn filter(&self, df: &DataFrame) -> Result<(DataFrame, Vec<OutlierBounds>)> {
        let mut current = df.clone();
        let mut all_bounds = Vec::with_capacity(self.columns.len());

        for col_name in &self.columns {
            let values = float_values(&current, col_name)?;
            let (q1, q3) = quartiles(&values);
            let iqr = q3 - q1;

            let mut bounds = OutlierBounds {
                column: col_name.clone(),
                q1,
                q3,
                lower: q1 - self.factor * iqr,
                upper: q3 + self.factor * iqr,
                rows_before: current.height(),
                rows_after: 0,
            };

            // nulls never satisfy the fences
            let mask: BooleanChunked = values
                .iter()
                .map(|v| Some(v.map_or(false, |x| bounds.contains(x))))
                .collect();

            current = current.filter(&mask)?;
            bounds.rows_after = current.height();

            debug!(
                column = %col_name,
                lower = bounds.lower,
                upper = bounds.upper,
                removed = bounds.rows_before - bounds.rows_after,
                "Applied IQR fences"
            );
            all_bounds.push(bounds);
        }

        Ok((current, all_bounds))
    }
}

/// First and third quartile of the non-null values. An all-null column
/// yields NaN fences, which reject every row.
fn quartiles(values: &[Option<f64>]) -> (f64, f64) {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    sorted.sort_by(f64::total_cmp);
    (quantile_linear(&sorted, 0.25), quantile_linear(&sorted, 0.75))
}

/// Convenience wrapper: remove IQR outliers over `columns` with factor 1.5
pub fn remove_outliers(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let filter = OutlierFilter::iqr(1.5)
        .with_columns(columns.iter().map(|c| c.to_string()).collect());
    Ok(filter.filter(df)?.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_removes_extreme() {
        let df = df!(
            "Price" => &[10.0, 11.0, 12.0, 13.0, 14.0, 1000.0]
        )
        .unwrap();

        let result = remove_outliers(&df, &["Price"]).unwrap();
        assert_eq!(result.height(), 5);
        let max = result.column("Price").unwrap().f64().unwrap().max().unwrap();
        assert_eq!(max, 14.0);
    }

    #[test]
    fn test_sequential_not_simultaneous() {
        // `a` removes the last row. Without it, the quartiles of `b` tighten
        // and the 40.0 in the seventh row falls outside the fences, although
        // fences computed on the full `b` column would keep it.
        let df = df!(
            "a" => &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0],
            "b" => &[10.0, 10.0, 10.0, 10.0, 10.0, 30.0, 40.0, 40.0]
        )
        .unwrap();

        assert_eq!(remove_outliers(&df, &["b"]).unwrap().height(), 8);

        let filter = OutlierFilter::iqr(1.5)
            .with_columns(vec!["a".to_string(), "b".to_string()]);
        let (sequential, bounds) = filter.filter(&df).unwrap();

        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].rows_before, 8);
        assert_eq!(bounds[0].rows_after, 7);
        assert_eq!(bounds[1].rows_before, 7);
        assert!((bounds[1].q3 - 20.0).abs() < 1e-12);
        assert!((bounds[1].upper - 35.0).abs() < 1e-12);
        assert_eq!(sequential.height(), 6);

        // every survivor respects the fences computed on its population
        for b in &bounds {
            let col = sequential.column(b.column.as_str()).unwrap().f64().unwrap();
            assert!(col.into_iter().flatten().all(|v| b.contains(v)));
        }
    }

    #[test]
    fn test_nulls_are_removed() {
        let df = df!(
            "Levy" => &[Some(1.0), None, Some(2.0), Some(3.0)]
        )
        .unwrap();
        let result = remove_outliers(&df, &["Levy"]).unwrap();
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn test_output_never_grows() {
        let df = df!(
            "x" => &[5.0, 5.0, 5.0, 5.0],
            "y" => &[1i64, 2, 3, 4]
        )
        .unwrap();
        let result = remove_outliers(&df, &["x", "y"]).unwrap();
        assert!(result.height() <= df.height());
        assert_eq!(result.height(), 4);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let df = df!("x" => &[1.0]).unwrap();
        assert!(remove_outliers(&df, &["Price"]).is_err());
    }
}
