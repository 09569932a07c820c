//! Training-time preprocessing pipeline

use crate::error::Result;
use crate::inference::bundle::{self, ManufacturerModels};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::{
    columns,
    curation::CategoryCurator,
    encoder::{LabelEncoders, OneHotEncoder},
    normalize::normalize,
    outlier::{OutlierBounds, OutlierFilter},
    require_column,
    scaler::{Scaler, ScalerType},
    transforms, PreprocessingConfig,
};

/// Shape of the table after one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageShape {
    pub stage: String,
    pub rows: usize,
    pub columns: usize,
}

/// Diagnostics collected while the pipeline runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub stages: Vec<StageShape>,
    pub outlier_bounds: Vec<OutlierBounds>,
    pub removed_manufacturers: Vec<String>,
    pub reference_year: i32,
    pub elapsed_secs: f64,
}

impl PipelineReport {
    fn record(&mut self, stage: &str, df: &DataFrame) {
        info!(stage, rows = df.height(), columns = df.width(), "Pipeline stage done");
        self.stages.push(StageShape {
            stage: stage.to_string(),
            rows: df.height(),
            columns: df.width(),
        });
    }

    pub fn rows_in(&self) -> usize {
        self.stages.first().map_or(0, |s| s.rows)
    }

    pub fn rows_out(&self) -> usize {
        self.stages.last().map_or(0, |s| s.rows)
    }
}

/// Cleaned table plus diagnostics
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub frame: DataFrame,
    pub report: PipelineReport,
}

/// Encoders, scaler and lookup map fitted on a cleaned table
#[derive(Debug, Clone)]
pub struct FittedArtifacts {
    pub one_hot: OneHotEncoder,
    pub label_encoders: LabelEncoders,
    pub scaler: Scaler,
    pub manufacturer_models: ManufacturerModels,
}

impl FittedArtifacts {
    /// Write every artifact as JSON under `dir`. The regression model is
    /// not part of this set.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        bundle::write_json(&dir.join(bundle::ONE_HOT_FILE), &self.one_hot)?;
        bundle::write_json(&dir.join(bundle::LABEL_ENCODERS_FILE), &self.label_encoders)?;
        bundle::write_json(&dir.join(bundle::SCALER_FILE), &self.scaler)?;
        bundle::write_json(&dir.join(bundle::MANUFACTURER_MAP_FILE), &self.manufacturer_models)?;
        info!(dir = %dir.display(), "Wrote fitted artifacts");
        Ok(())
    }
}

/// Raw dataset -> cleaned training table
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: PreprocessingConfig,
}

impl TrainingPipeline {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Run every training-time stage in order
    pub fn run(&self, raw: &DataFrame) -> Result<PipelineOutput> {
        let start = Instant::now();
        let reference_year = self.config.resolved_reference_year();
        let mut report = PipelineReport {
            reference_year,
            ..Default::default()
        };
        report.record("input", raw);

        let mut df = if self.config.drop_duplicates {
            raw.unique_stable(None, UniqueKeepStrategy::First, None)?
        } else {
            raw.clone()
        };
        report.record("deduplicate", &df);

        df = normalize(&df)?;
        report.record("normalize", &df);

        let filter = OutlierFilter::iqr(self.config.iqr_factor)
            .with_columns(self.config.outlier_columns.clone());
        let (filtered, bounds) = filter.filter(&df)?;
        df = filtered;
        report.outlier_bounds = bounds;
        report.record("outliers", &df);

        df = transforms::transform(&df, reference_year)?;
        report.record("transform", &df);

        let outcome = CategoryCurator::new(self.config.clone()).curate(&df)?;
        df = outcome.frame;
        report.removed_manufacturers = outcome.removed_manufacturers;
        report.record("curate", &df);

        report.elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            rows_in = report.rows_in(),
            rows_out = report.rows_out(),
            elapsed_secs = report.elapsed_secs,
            "Training pipeline finished"
        );

        Ok(PipelineOutput { frame: df, report })
    }

    /// Fit the one-hot encoder, label encoders and standard scaler on a
    /// cleaned table, and collect the models offered per manufacturer.
    pub fn fit_artifacts(&self, cleaned: &DataFrame) -> Result<FittedArtifacts> {
        let one_hot = OneHotEncoder::fit(cleaned, &columns::ONE_HOT)?;
        let label_encoders = LabelEncoders::fit(cleaned, &columns::LABEL)?;
        let mut scaler = Scaler::new(ScalerType::Standard);
        scaler.fit(cleaned, &columns::SCALED)?;

        info!(
            one_hot_features = one_hot.n_features_out(),
            scaled = scaler.columns().len(),
            "Fitted encoders"
        );

        Ok(FittedArtifacts {
            one_hot,
            label_encoders,
            scaler,
            manufacturer_models: manufacturer_models(cleaned)?,
        })
    }
}

/// Sorted distinct models per manufacturer
pub fn manufacturer_models(df: &DataFrame) -> Result<ManufacturerModels> {
    let manufacturers = require_column(df, columns::MANUFACTURER)?.str()?;
    let models = require_column(df, columns::MODEL)?.cast(&DataType::String)?;

    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (m, model) in manufacturers.into_iter().zip(models.str()?) {
        if let (Some(m), Some(model)) = (m, model) {
            map.entry(m.to_string()).or_default().insert(model.to_string());
        }
    }
    Ok(map
        .into_iter()
        .map(|(m, models)| (m, models.into_iter().collect()))
        .collect())
}
