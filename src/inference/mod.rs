//! Inference path
//!
//! Scores a single vehicle record against the fitted artifacts:
//! - Encoding replay (age, renames, one-hot, label codes, scaling, flags)
//! - Ordered feature schema checked at assembly time
//! - Tree-ensemble regressor evaluation
//! - Artifact bundle loaded once and shared behind an `Arc`

pub mod bundle;
mod engine;
pub mod forest;
pub mod replay;
mod schema;

pub use bundle::{ManufacturerModels, ModelBundle};
pub use engine::{Prediction, PricePredictor};
pub use forest::{ForestRegressor, TreeNode};
pub use replay::{feature_layout, EncodedRecord, EncodingReplay};
pub use schema::{FeatureRow, FeatureSchema};
