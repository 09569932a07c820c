//! carprice - used-car price prediction
//!
//! This crate provides:
//! - Cleaning of the raw vehicle sales table (normalization, outlier
//!   removal, derived columns, category curation)
//! - Fitting of the one-hot/label encoders and the numeric scaler
//! - Replay of the fitted encodings on single inference records
//! - Evaluation of a serialized tree-ensemble regressor
//! - HTTP service and CLI interfaces
//!
//! # Modules
//!
//! - [`preprocessing`] - Training-time cleaning pipeline and encoder fitting
//! - [`record`] - Typed inference records and their validation
//! - [`inference`] - Encoding replay, schema check, model bundle and predictor
//! - [`server`] - HTTP service
//! - [`cli`] - Command-line interface

pub mod error;

pub mod preprocessing;
pub mod record;
pub mod inference;

pub mod server;
pub mod cli;

pub use error::{CarPriceError, Result};
pub use inference::{ModelBundle, Prediction, PricePredictor};
pub use preprocessing::{PreprocessingConfig, TrainingPipeline};
pub use record::{RawVehicleRecord, VehicleRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
