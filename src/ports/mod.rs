//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the scoring logic and the serialized model artifacts.

mod model;

pub use model::{Classifier, Scaler};
