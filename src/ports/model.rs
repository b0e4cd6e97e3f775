//! Model ports: Traits for the two pre-trained artifacts.
//!
//! The scorer only depends on these traits. The JSON artifact adapter
//! implements them for production; tests substitute stubs.

use crate::domain::{FeatureRow, InputError, ModelError};

/// Fitted input transform (e.g. a standard scaler).
pub trait Scaler: Send + Sync {
    /// Column names the transform was fitted on, in order.
    fn feature_names(&self) -> &[String];

    /// Transform a labeled row into the model's input vector.
    ///
    /// # Errors
    /// Returns `InputError` if the row's columns do not match
    /// [`Scaler::feature_names`] exactly.
    fn transform(&self, row: &FeatureRow) -> Result<Vec<f64>, InputError>;
}

/// Fitted binary classifier.
pub trait Classifier: Send + Sync {
    /// Column names the classifier was trained on, in order.
    fn feature_names(&self) -> &[String];

    /// Probability of the positive class for one scaled input vector.
    ///
    /// # Errors
    /// Returns `ModelError` if no probability can be produced.
    fn predict_probability(&self, scaled: &[f64]) -> Result<f64, ModelError>;

    /// Global per-feature importance weights, aligned with
    /// [`Classifier::feature_names`]. Fixed at training time.
    fn feature_importances(&self) -> &[f64];
}
