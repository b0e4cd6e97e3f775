//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON scaler and random forest, with signed-manifest loading
//! - `sanitize`: measurement/secret filtering for logs

pub mod artifacts;
pub mod sanitize;
