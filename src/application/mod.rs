//! Application layer: Use cases and services.
//!
//! This module wires the domain types to the model ports:
//! the prediction pipeline and the process-wide model slot.

pub mod model;
mod prediction;

pub use prediction::PredictionPipeline;
