//! Application state management

use std::sync::Arc;

use crate::inference::{ModelBundle, PricePredictor};

use super::ServerConfig;

/// Application state shared across handlers. Read-only after startup.
pub struct AppState {
    pub config: ServerConfig,
    pub predictor: PricePredictor,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, bundle: Arc<ModelBundle>) -> Self {
        let predictor = match config.reference_year {
            Some(year) => PricePredictor::new(bundle).with_reference_year(year),
            None => PricePredictor::new(bundle),
        };
        Self {
            config,
            predictor,
            started_at: chrono::Utc::now(),
        }
    }

    pub fn bundle(&self) -> &ModelBundle {
        self.predictor.bundle()
    }
}
