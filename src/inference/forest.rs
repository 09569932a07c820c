//! Serialized regression forest
//!
//! The ensemble is trained elsewhere and shipped as `model.json`. Only
//! evaluation lives here.

use crate::error::{CarPriceError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Node in a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        #[serde(default)]
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn leaf(value: f64) -> Self {
        TreeNode::Leaf { value, n_samples: 0 }
    }

    pub fn split(feature_idx: usize, threshold: f64, left: TreeNode, right: TreeNode) -> Self {
        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Route a sample to its leaf: left when `x[feature] <= threshold`
    pub fn predict_sample(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right } => {
                    node = if sample[*feature_idx] <= *threshold { left.as_ref() } else { right.as_ref() };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Largest feature index referenced by any split
    pub fn max_feature_index(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf { .. } => None,
            TreeNode::Split { feature_idx, left, right, .. } => [
                Some(*feature_idx),
                left.max_feature_index(),
                right.max_feature_index(),
            ]
            .into_iter()
            .flatten()
            .max(),
        }
    }
}

/// Random-forest style regressor: the prediction is the mean over trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    /// Ordered feature names the model was trained on
    feature_names: Vec<String>,
    trees: Vec<TreeNode>,
}

impl ForestRegressor {
    pub fn new(feature_names: Vec<String>, trees: Vec<TreeNode>) -> Self {
        Self { feature_names, trees }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Check that the model can be evaluated on rows of its own schema
    pub fn validate(&self) -> Result<()> {
        if self.feature_names.is_empty() {
            return Err(CarPriceError::Config("model has an empty feature schema".to_string()));
        }
        if self.trees.is_empty() {
            return Err(CarPriceError::Config("model has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if let Some(idx) = tree.max_feature_index() {
                if idx >= self.n_features() {
                    return Err(CarPriceError::Config(format!(
                        "tree {} splits on feature {} but the schema has {} features",
                        i,
                        idx,
                        self.n_features()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Predict one price per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(CarPriceError::Inference("model has no trees".to_string()));
        }
        if x.ncols() != self.n_features() {
            return Err(CarPriceError::SchemaMismatch {
                expected: format!("{} features", self.n_features()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_trees = self.trees.len() as f64;
        x.rows()
            .into_iter()
            .map(|row| {
                let price = self.trees.iter().map(|t| t.predict_sample(row)).sum::<f64>() / n_trees;
                if !price.is_finite() || price < 0.0 {
                    return Err(CarPriceError::Inference(format!(
                        "model produced an invalid price: {}",
                        price
                    )));
                }
                Ok(price)
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }
}
