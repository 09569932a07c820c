//! Fitted artifact bundle
//!
//! Everything the inference path needs, loaded once and never mutated.

use crate::error::{CarPriceError, Result};
use crate::preprocessing::{columns, LabelEncoders, OneHotEncoder, Scaler};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::forest::ForestRegressor;
use super::replay::feature_layout;
use super::schema::FeatureSchema;

pub const ONE_HOT_FILE: &str = "one_hot_encoder.json";
pub const LABEL_ENCODERS_FILE: &str = "label_encoders.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const MANUFACTURER_MAP_FILE: &str = "manufacturer_model_map.json";

/// Manufacturer -> models offered for it
pub type ManufacturerModels = BTreeMap<String, Vec<String>>;

/// Serialize `value` as pretty JSON at `path`
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read and deserialize one artifact, reporting any failure against its path
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let load_error = |reason: String| CarPriceError::ArtifactLoad {
        path: path.display().to_string(),
        reason,
    };
    let content = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))
}

/// All fitted artifacts of one trained model
#[derive(Debug, Clone)]
pub struct ModelBundle {
    one_hot: OneHotEncoder,
    label_encoders: LabelEncoders,
    scaler: Scaler,
    forest: ForestRegressor,
    schema: FeatureSchema,
    manufacturer_models: ManufacturerModels,
}

impl ModelBundle {
    /// Load every artifact from `dir` and check that they fit together
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let path = |file: &str| -> PathBuf { dir.join(file) };

        let bundle = Self::from_parts(
            read_artifact(&path(ONE_HOT_FILE))?,
            read_artifact(&path(LABEL_ENCODERS_FILE))?,
            read_artifact(&path(SCALER_FILE))?,
            read_artifact(&path(MODEL_FILE))?,
            read_artifact(&path(MANUFACTURER_MAP_FILE))?,
        )
        .map_err(|e| match e {
            CarPriceError::ArtifactLoad { .. } => e,
            other => CarPriceError::ArtifactLoad {
                path: dir.display().to_string(),
                reason: other.to_string(),
            },
        })?;

        info!(
            dir = %dir.display(),
            features = bundle.schema.len(),
            trees = bundle.forest.n_trees(),
            manufacturers = bundle.manufacturers().len(),
            "Loaded model bundle"
        );
        Ok(bundle)
    }

    /// Assemble a bundle from in-memory artifacts
    pub fn from_parts(
        one_hot: OneHotEncoder,
        label_encoders: LabelEncoders,
        scaler: Scaler,
        forest: ForestRegressor,
        manufacturer_models: ManufacturerModels,
    ) -> Result<Self> {
        let schema = FeatureSchema::new(forest.feature_names().to_vec());
        let bundle = Self {
            one_hot,
            label_encoders,
            scaler,
            forest,
            schema,
            manufacturer_models,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Cross-check the artifacts against each other
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |file: &str, reason: String| CarPriceError::ArtifactLoad {
            path: file.to_string(),
            reason,
        };

        if self.one_hot.columns() != columns::ONE_HOT {
            return Err(inconsistent(
                ONE_HOT_FILE,
                format!(
                    "expected columns {:?}, found {:?}",
                    columns::ONE_HOT,
                    self.one_hot.columns()
                ),
            ));
        }

        for column in columns::LABEL {
            match self.label_encoders.get(column) {
                None => {
                    return Err(inconsistent(
                        LABEL_ENCODERS_FILE,
                        format!("no encoder for '{}'", column),
                    ))
                }
                Some(encoder) if !encoder.is_sorted() => {
                    return Err(inconsistent(
                        LABEL_ENCODERS_FILE,
                        format!("classes of '{}' are not sorted and unique", column),
                    ))
                }
                Some(_) => {}
            }
        }

        if self.scaler.columns() != columns::SCALED {
            return Err(inconsistent(
                SCALER_FILE,
                format!(
                    "expected columns {:?}, found {:?}",
                    columns::SCALED,
                    self.scaler.columns()
                ),
            ));
        }

        self.forest
            .validate()
            .map_err(|e| inconsistent(MODEL_FILE, e.to_string()))?;

        // the replay must produce exactly the model's schema
        self.schema
            .check(&feature_layout(&self.one_hot))
            .map_err(|e| inconsistent(MODEL_FILE, e.to_string()))?;

        Ok(())
    }

    pub fn one_hot(&self) -> &OneHotEncoder {
        &self.one_hot
    }

    pub fn label_encoders(&self) -> &LabelEncoders {
        &self.label_encoders
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn forest(&self) -> &ForestRegressor {
        &self.forest
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Manufacturers known to the label encoder
    pub fn manufacturers(&self) -> &[String] {
        self.label_encoders
            .get(columns::MANUFACTURER)
            .map(|e| e.classes())
            .unwrap_or(&[])
    }

    /// Models offered for a manufacturer; empty when it is unknown
    pub fn models_for(&self, manufacturer: &str) -> &[String] {
        self.manufacturer_models
            .get(manufacturer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
