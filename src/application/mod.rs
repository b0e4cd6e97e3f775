//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the risk scoring use case.

mod scoring;

pub use scoring::RiskScorer;
