//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - Measurement entry form
//! - Risk result with contributing factors

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
