//! Domain layer: Core clinical types and logic.
//!
//! Pure Rust types with no I/O. The feature record, its projection into the
//! model's column order, and the shapes of prediction and explanation results.

mod explanation;
pub mod features;
mod frame;
mod prediction;

pub use explanation::{ClassAttribution, ExplainerOutput, ExplanationError, POSITIVE_CLASS};
pub use features::{
    ActivityLevel, CharlsonIndex, FeatureError, FeatureRecord, NutritionalStatus, Presence,
    CONSTRUCTION_COLUMNS, TRAINING_COLUMNS,
};
pub use frame::{FeatureFrame, SchemaMismatch};
pub use prediction::{to_percentage, Attribution, FeatureContribution, PredictionResult};
