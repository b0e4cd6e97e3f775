//! Standard scaler exported from the training pipeline.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureRow, InputError, ModelError};
use crate::ports::Scaler;

/// `transform(x)_i = (x_i - mean_i) / scale_i`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScalerArtifact {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScalerArtifact {
    /// Structural checks run once at load.
    ///
    /// # Errors
    /// Returns `ModelError::Corrupt` on length mismatches, non-finite
    /// parameters or non-positive scales.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(ModelError::Corrupt("scaler has no features".into()));
        }
        if self.mean.len() != n || self.scale.len() != n {
            return Err(ModelError::Corrupt(format!(
                "scaler parameter lengths (mean={}, scale={}) do not match {n} features",
                self.mean.len(),
                self.scale.len()
            )));
        }
        for (i, name) in self.feature_names.iter().enumerate() {
            if !self.mean[i].is_finite() {
                return Err(ModelError::Corrupt(format!("scaler mean for {name} is not finite")));
            }
            if !self.scale[i].is_finite() || self.scale[i] <= 0.0 {
                return Err(ModelError::Corrupt(format!(
                    "scaler scale for {name} must be positive, got {}",
                    self.scale[i]
                )));
            }
        }
        Ok(())
    }
}

impl Scaler for StandardScalerArtifact {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, row: &FeatureRow) -> Result<Vec<f64>, InputError> {
        let raw = row.aligned_values(&self.feature_names)?;
        Ok(raw
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}
