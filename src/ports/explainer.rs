//! Explainer port: per-feature attributions for a tree model.

use crate::domain::{ExplainerOutput, FeatureFrame};

/// Computes SHAP values for one row of a tree ensemble.
///
/// Implementations report whatever shape their model produces; the pipeline
/// picks the positive class out of it.
pub trait TreeExplainer: Send + Sync {
    /// # Errors
    /// Returns a description of the failure when the row cannot be explained.
    fn explain(&self, row: &FeatureFrame) -> Result<ExplainerOutput, String>;
}
