//! Ports layer: Trait definitions for external operations.
//!
//! These traits are the boundary between the prediction pipeline and the
//! model runtime it scores and explains with.

mod classifier;
mod explainer;

pub use classifier::Classifier;
pub use explainer::TreeExplainer;
