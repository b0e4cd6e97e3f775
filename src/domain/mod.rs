//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O: the feature schema, the patient record, the
//! assessment result and the two error kinds an evaluation can end in.

mod assessment;
mod error;
mod patient;
pub mod schema;

pub use assessment::{
    rank_factors, FactorImportance, RiskAssessment, RiskCategory, TimedAssessment,
    TOP_FACTOR_COUNT,
};
pub use error::{InputError, ModelError};
pub use patient::{FeatureRow, PatientRecord, YesNo};
pub use schema::{FeatureKind, FeatureSchema, FeatureSpec, FEATURE_COUNT, FEATURE_NAMES};
