//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - The seven-field assessment form
//! - Risk headline and force plot for the last submission
//! - An error view when the model could not be loaded

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::ClinicalTheme;
