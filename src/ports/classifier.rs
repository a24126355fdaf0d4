//! Classifier port: probability prediction over one feature row.
//!
//! Abstracts the gradient-boosting runtime from the pipeline.

use crate::domain::FeatureFrame;

/// A trained classifier that can score a single row.
pub trait Classifier: Send + Sync {
    /// Column names the model was trained on, when the artifact records them.
    ///
    /// The pipeline compares these by exact name against the projected frame.
    fn feature_names(&self) -> Option<&[String]>;

    /// Per-class probabilities for one row given in model column order.
    ///
    /// Index 1 is the positive class for binary models.
    ///
    /// # Errors
    /// Returns a description of the failure when the row cannot be scored.
    fn predict_proba(&self, row: &FeatureFrame) -> Result<Vec<f64>, String>;
}
