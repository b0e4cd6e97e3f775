//! # diabetes-risk
//!
//! Diabetes risk prediction from nine clinical and lifestyle measurements.
//!
//! This crate provides:
//! - A typed patient record and the feature schema the model was fitted on
//! - A risk scorer that runs a fitted scaler and classifier, bands the
//!   probability into four categories and ranks global feature importances
//! - Loading of JSON model artifacts with optional signature verification
//! - Terminal UI for entering measurements and reading the result
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (PatientRecord, RiskAssessment, schema)
//! - `ports`: Trait definitions for the scaler and classifier
//! - `adapters`: Concrete implementations (JSON artifacts, log sanitizing)
//! - `application`: The risk scoring use case
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{InputError, ModelError, PatientRecord, RiskAssessment, RiskCategory};

/// Result type for diabetes-risk operations
pub type Result<T> = std::result::Result<T, DiabetesRiskError>;

/// Main error type for diabetes-risk
#[derive(Debug, thiserror::Error)]
pub enum DiabetesRiskError {
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
