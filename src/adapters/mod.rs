//! Adapters layer: Concrete implementations of ports.
//!
//! - `xgboost`: native evaluation and TreeSHAP explanation of XGBoost JSON models

pub mod xgboost;

// Re-export the load error for lib.rs
pub use xgboost::ModelLoadError;
