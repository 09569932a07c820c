//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::record::VehicleRecord;

use super::error::Result;
use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(rename = "Prediction")]
    pub prediction: f64,
}

#[derive(Debug, Serialize)]
pub struct ManufacturersResponse {
    pub manufacturers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// Price one vehicle
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<VehicleRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(record) = body?;
    let prediction = state.predictor.predict(&record)?;

    info!(
        manufacturer = %record.manufacturer,
        model = %record.model,
        age = prediction.age,
        price = prediction.price,
        "Served prediction"
    );
    Ok(Json(PredictResponse {
        prediction: prediction.price,
    }))
}

/// Manufacturers known to the fitted label encoder
pub async fn list_manufacturers(State(state): State<Arc<AppState>>) -> Json<ManufacturersResponse> {
    Json(ManufacturersResponse {
        manufacturers: state.bundle().manufacturers().to_vec(),
    })
}

/// Models offered for one manufacturer; empty when unknown
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    Path(manufacturer): Path<String>,
) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.bundle().models_for(&manufacturer).to_vec(),
    })
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let bundle = state.bundle();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "features": bundle.schema().len(),
        "trees": bundle.forest().n_trees(),
        "reference_year": state.predictor.reference_year(),
        "uptime_secs": chrono::Utc::now()
            .signed_duration_since(state.started_at)
            .num_seconds(),
    }))
}
