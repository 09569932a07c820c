//! Price predictor: validation, encoding replay, schema check and scoring

use crate::error::Result;
use crate::preprocessing::current_year;
use crate::record::VehicleRecord;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use super::bundle::ModelBundle;
use super::replay::EncodingReplay;

/// Outcome of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub price: f64,
    pub age: i64,
    pub reference_year: i32,
}

/// Scores vehicle records against a shared, immutable model bundle
#[derive(Debug, Clone)]
pub struct PricePredictor {
    bundle: Arc<ModelBundle>,
    reference_year: Option<i32>,
}

impl PricePredictor {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self {
            bundle,
            reference_year: None,
        }
    }

    /// Pin the year ages are measured against instead of using the clock
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(current_year)
    }

    /// Validate and encode a record into the model's 1 x n input
    pub fn encode(&self, record: &VehicleRecord) -> Result<(Array2<f64>, i64)> {
        self.encode_at(record, self.reference_year())
    }

    fn encode_at(&self, record: &VehicleRecord, reference_year: i32) -> Result<(Array2<f64>, i64)> {
        record.validate()?;
        let bundle = &*self.bundle;
        let replay = EncodingReplay::new(
            bundle.one_hot(),
            bundle.label_encoders(),
            bundle.scaler(),
            reference_year,
        );
        let encoded = replay.replay(record)?;

        let x = bundle.schema().assemble(&encoded.row).map_err(|e| {
            error!(error = %e, "Encoded row does not match the model schema");
            e
        })?;
        Ok((x, encoded.age))
    }

    /// Predict the price of one vehicle
    pub fn predict(&self, record: &VehicleRecord) -> Result<Prediction> {
        let reference_year = self.reference_year();
        let (x, age) = self.encode_at(record, reference_year)?;
        let prices = self.bundle.forest().predict(&x)?;

        let price = prices[0];
        debug!(manufacturer = %record.manufacturer, model = %record.model, price, "Predicted price");
        Ok(Prediction {
            price,
            age,
            reference_year,
        })
    }
}
