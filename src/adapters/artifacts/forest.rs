//! Random forest classifier exported from the training pipeline.
//!
//! Trees use the flat-array layout of the training library: node `i` splits
//! on `feature[i]` at `threshold[i]` (`x <= threshold` goes left) and
//! `value[i]` holds per-class weights. Leaves have `-1` for both children.

use serde::{Deserialize, Serialize};

use crate::domain::ModelError;
use crate::ports::Classifier;

/// Child index marking a leaf.
pub const TREE_LEAF: i64 = -1;

/// One fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-class weights (counts or fractions) at each node
    pub value: Vec<Vec<f64>>,
}

impl TreeArtifact {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn children(&self, node: usize) -> Result<(i64, i64), ModelError> {
        match (self.children_left.get(node), self.children_right.get(node)) {
            (Some(&left), Some(&right)) => Ok((left, right)),
            _ => Err(ModelError::Prediction(format!("node {node} out of range"))),
        }
    }

    /// Check shapes, indices and weights.
    ///
    /// Children must point strictly forward, which rules out cycles and
    /// bounds traversal depth by the node count.
    fn validate(&self, tree_idx: usize, n_features: usize, n_classes: usize) -> Result<(), ModelError> {
        let corrupt = |msg: String| ModelError::Corrupt(format!("tree {tree_idx}: {msg}"));

        let n = self.node_count();
        if n == 0 {
            return Err(corrupt("no nodes".into()));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(corrupt("node array lengths differ".into()));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(corrupt(format!("node {node} has exactly one child")));
                }
                let weights = &self.value[node];
                if weights.len() != n_classes {
                    return Err(corrupt(format!(
                        "leaf {node} has {} class weights, expected {n_classes}",
                        weights.len()
                    )));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(corrupt(format!("leaf {node} has invalid class weights")));
                }
                if weights.iter().sum::<f64>() <= 0.0 {
                    return Err(corrupt(format!("leaf {node} has zero total weight")));
                }
                continue;
            }

            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(corrupt(format!("node {node} has invalid child {child}")));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(corrupt(format!("node {node} splits on unknown feature {feature}")));
            }
            if self.threshold[node].is_nan() {
                return Err(corrupt(format!("node {node} has NaN threshold")));
            }
        }

        Ok(())
    }

    /// Positive-class fraction at the leaf `x` falls into.
    ///
    /// Every lookup is bounds-checked, so a tree that skipped `validate`
    /// fails with `ModelError::Prediction` instead of panicking.
    fn positive_fraction(&self, x: &[f64], positive: usize) -> Result<f64, ModelError> {
        let broken = |msg: String| ModelError::Prediction(msg);

        let mut node = 0usize;
        // Forward-only children bound the walk by the node count.
        for _ in 0..self.node_count() {
            let (left, right) = self.children(node)?;
            if left == TREE_LEAF && right == TREE_LEAF {
                let weights = self
                    .value
                    .get(node)
                    .ok_or_else(|| broken(format!("leaf {node} has no class weights")))?;
                let weight = *weights.get(positive).ok_or_else(|| {
                    broken(format!("leaf {node} has no weight for class {positive}"))
                })?;
                let total: f64 = weights.iter().sum();
                if !total.is_finite() || total <= 0.0 {
                    return Err(broken(format!("leaf {node} has zero total weight")));
                }
                return Ok(weight / total);
            }

            let feature = self
                .feature
                .get(node)
                .and_then(|&f| usize::try_from(f).ok())
                .ok_or_else(|| broken(format!("node {node} has no valid split feature")))?;
            let threshold = *self
                .threshold
                .get(node)
                .ok_or_else(|| broken(format!("node {node} has no threshold")))?;
            let value = *x
                .get(feature)
                .ok_or_else(|| broken(format!("no input for feature {feature}")))?;
            let next = if value <= threshold { left } else { right };
            node = usize::try_from(next)
                .map_err(|_| broken(format!("invalid child index {next}")))?;
        }
        Err(broken("tree traversal did not reach a leaf".into()))
    }
}

/// Bagged ensemble of classification trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestArtifact {
    pub feature_names: Vec<String>,
    /// Class labels; must be `[0, 1]`
    pub classes: Vec<i64>,
    /// Impurity-based importances, one per feature
    pub feature_importances: Vec<f64>,
    pub trees: Vec<TreeArtifact>,
}

impl RandomForestArtifact {
    const POSITIVE_CLASS: usize = 1;

    /// Structural checks run once at load.
    ///
    /// # Errors
    /// Returns `ModelError::Corrupt` describing the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n_features = self.feature_names.len();
        if n_features == 0 {
            return Err(ModelError::Corrupt("model has no features".into()));
        }
        if self.classes != [0, 1] {
            return Err(ModelError::Corrupt(format!(
                "expected binary classes [0, 1], got {:?}",
                self.classes
            )));
        }
        if self.feature_importances.len() != n_features {
            return Err(ModelError::Corrupt(format!(
                "model has {} feature importances for {n_features} features",
                self.feature_importances.len()
            )));
        }
        if self
            .feature_importances
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(ModelError::Corrupt(
                "feature importances must be finite and non-negative".into(),
            ));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Corrupt("model has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, n_features, self.classes.len())?;
        }
        Ok(())
    }
}

impl Classifier for RandomForestArtifact {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_probability(&self, scaled: &[f64]) -> Result<f64, ModelError> {
        if scaled.len() != self.feature_names.len() {
            return Err(ModelError::Prediction(format!(
                "input has {} features, model expects {}",
                scaled.len(),
                self.feature_names.len()
            )));
        }
        if self.trees.is_empty() {
            return Err(ModelError::Prediction("model has no trees".into()));
        }

        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.positive_fraction(scaled, Self::POSITIVE_CLASS)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}
