//! Error types for the two ways an evaluation can fail.

/// The assembled row does not match what the artifacts expect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Unexpected feature: {0}")]
    UnexpectedFeature(String),

    #[error("Feature {name} at position {position}, expected {expected}")]
    OutOfOrder {
        name: String,
        position: usize,
        expected: String,
    },

    #[error("Feature count mismatch: got {got}, expected {expected}")]
    FeatureCount { got: usize, expected: usize },

    #[error("Feature {0} is not a finite number")]
    NonFinite(String),

    #[error("Feature {0} must be 0 or 1")]
    NotBinary(String),

    #[error("Feature {0} must be a whole number")]
    NotIntegral(String),

    #[error("Feature {name} value {value} out of range [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// An artifact could not be loaded or could not produce a score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to load artifact: {0}")]
    Load(String),

    #[error("Artifact is corrupt or incompatible: {0}")]
    Corrupt(String),

    #[error("Artifact integrity check failed: {0}")]
    Integrity(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Classifier returned invalid probability {0}")]
    InvalidProbability(f64),
}
