//! # Frailsight
//!
//! Frailty risk prediction for elderly patients with diabetes.
//!
//! This crate provides:
//! - A seven-field clinical feature record with closed domains
//! - Native evaluation of an XGBoost JSON classifier
//! - Exact TreeSHAP attributions and a force-plot layout
//! - Terminal UI for local-only use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (FeatureRecord, FeatureFrame, PredictionResult)
//! - `ports`: Trait definitions for the model runtime (Classifier, TreeExplainer)
//! - `adapters`: Concrete implementations (XGBoost JSON + TreeSHAP)
//! - `application`: The prediction pipeline and process-wide model state
//! - `render`: Force-plot layout
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod render;
pub mod tui;

pub use domain::{FeatureRecord, PredictionResult};

/// Result type for Frailsight operations
pub type Result<T> = std::result::Result<T, FrailsightError>;

/// Main error type for Frailsight
#[derive(Debug, thiserror::Error)]
pub enum FrailsightError {
    #[error("Model load failed: {0}")]
    ModelLoad(#[from] adapters::ModelLoadError),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(#[from] domain::SchemaMismatch),

    #[error("Invalid feature data: {0}")]
    Validation(String),

    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("Unexpected explainer output: {0}")]
    ExplainerShape(#[from] domain::ExplanationError),

    #[error("Explainer failed: {0}")]
    Explainer(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::xgboost::XgbModel;
    use adapters::ModelLoadError;

    #[test]
    fn test_read_and_parse_failures_are_model_load_errors() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = FrailsightError::from(ModelLoadError::from(denied));
        assert!(matches!(err, FrailsightError::ModelLoad(ModelLoadError::Io(_))));
        assert!(err.to_string().starts_with("Model load failed: failed to read model"));

        let Err(parse) = XgbModel::from_json_slice(b"not json") else {
            panic!("garbage must not parse as a model");
        };
        let err = FrailsightError::from(parse);
        assert!(matches!(err, FrailsightError::ModelLoad(ModelLoadError::Parse(_))));
    }
}
