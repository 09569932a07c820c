//! Category curation
//!
//! Restricts the training table to the vintage window and drops the
//! manufacturers that sit outside both the top revenue bracket and the top
//! unit-count bracket.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use super::{columns, float_values, require_column, PreprocessingConfig};

/// Result of a curation pass
#[derive(Debug, Clone)]
pub struct CurationOutcome {
    pub frame: DataFrame,
    /// Manufacturers removed for falling in both tails, sorted by name
    pub removed_manufacturers: Vec<String>,
    pub rows_outside_window: usize,
}

/// Ranking entry for one manufacturer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerRank {
    pub manufacturer: String,
    pub value: f64,
}

/// Training-time category curator
#[derive(Debug, Clone)]
pub struct CategoryCurator {
    config: PreprocessingConfig,
}

impl CategoryCurator {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    /// Apply the vintage window, the manufacturer exclusion and the final
    /// column drops.
    pub fn curate(&self, df: &DataFrame) -> Result<CurationOutcome> {
        let windowed = self.filter_vintage(df)?;
        let rows_outside_window = df.height() - windowed.height();

        let by_revenue = rank_by_revenue(&windowed)?;
        let by_count = rank_by_count(&windowed)?;
        let removed = tail_intersection(
            &by_revenue,
            self.config.top_by_revenue,
            &by_count,
            self.config.top_by_count,
        );

        let kept = if removed.is_empty() {
            windowed
        } else {
            let mask: BooleanChunked = require_column(&windowed, columns::MANUFACTURER)?
                .str()?
                .into_iter()
                .map(|m| Some(m.map_or(true, |m| !removed.contains(m))))
                .collect();
            windowed.filter(&mask)?
        };

        info!(
            outside_window = rows_outside_window,
            removed_manufacturers = removed.len(),
            rows = kept.height(),
            "Curated categories"
        );

        Ok(CurationOutcome {
            frame: drop_present(kept, &columns::DROPPED_AFTER_CURATION)?,
            removed_manufacturers: removed.into_iter().collect(),
            rows_outside_window,
        })
    }

    /// Keep rows whose production year lies strictly inside the window
    pub fn filter_vintage(&self, df: &DataFrame) -> Result<DataFrame> {
        let (min, max) = (self.config.min_year_exclusive, self.config.max_year_exclusive);
        let years = require_column(df, columns::PROD_YEAR)?.cast(&DataType::Int64)?;
        let mask: BooleanChunked = years
            .i64()?
            .into_iter()
            .map(|y| Some(y.map_or(false, |y| y > min && y < max)))
            .collect();
        Ok(df.filter(&mask)?)
    }
}

/// Manufacturers ranked by total price, highest first
pub fn rank_by_revenue(df: &DataFrame) -> Result<Vec<ManufacturerRank>> {
    let prices = float_values(df, columns::PRICE)?;
    let manufacturers = require_column(df, columns::MANUFACTURER)?.str()?;

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for (m, p) in manufacturers.into_iter().zip(prices) {
        if let Some(m) = m {
            *totals.entry(m).or_insert(0.0) += p.unwrap_or(0.0);
        }
    }
    Ok(ranked(totals))
}

/// Manufacturers ranked by number of rows, highest first
pub fn rank_by_count(df: &DataFrame) -> Result<Vec<ManufacturerRank>> {
    let manufacturers = require_column(df, columns::MANUFACTURER)?.str()?;

    let mut counts: HashMap<&str, f64> = HashMap::new();
    for m in manufacturers.into_iter().flatten() {
        *counts.entry(m).or_insert(0.0) += 1.0;
    }
    Ok(ranked(counts))
}

// descending by value, ties by name ascending
fn ranked(totals: HashMap<&str, f64>) -> Vec<ManufacturerRank> {
    let mut ranks: Vec<ManufacturerRank> = totals
        .into_iter()
        .map(|(m, value)| ManufacturerRank {
            manufacturer: m.to_string(),
            value,
        })
        .collect();
    ranks.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.manufacturer.cmp(&b.manufacturer))
    });
    ranks
}

/// Manufacturers ranked past `top_revenue` by revenue AND past `top_count`
/// by count
pub fn tail_intersection(
    by_revenue: &[ManufacturerRank],
    top_revenue: usize,
    by_count: &[ManufacturerRank],
    top_count: usize,
) -> BTreeSet<String> {
    let revenue_tail: BTreeSet<&str> = by_revenue
        .iter()
        .skip(top_revenue)
        .map(|r| r.manufacturer.as_str())
        .collect();

    let removed: BTreeSet<String> = by_count
        .iter()
        .skip(top_count)
        .filter(|r| revenue_tail.contains(r.manufacturer.as_str()))
        .map(|r| r.manufacturer.clone())
        .collect();

    debug!(
        revenue_tail = revenue_tail.len(),
        removed = removed.len(),
        "Computed manufacturer tails"
    );
    removed
}

fn drop_present(mut df: DataFrame, names: &[&str]) -> Result<DataFrame> {
    for name in names {
        if df.column(name).is_ok() {
            df = df.drop(name)?;
        }
    }
    Ok(df)
}
