//! Process-wide model slot.
//!
//! The model is loaded once and shared read-only for the life of the
//! process. There is no reload or teardown.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::adapters::xgboost::{IntegrityPolicy, XgbModel};
use crate::adapters::ModelLoadError;

static MODEL: OnceLock<Arc<XgbModel>> = OnceLock::new();

/// Load the model into the slot, or return the one already there.
///
/// A failed load leaves the slot empty so a later call may retry.
///
/// # Errors
/// Any [`ModelLoadError`] from reading or verifying the artifact.
pub fn init(path: &Path, policy: &IntegrityPolicy) -> Result<Arc<XgbModel>, ModelLoadError> {
    if let Some(model) = MODEL.get() {
        tracing::warn!("Model already loaded, ignoring {:?}", path);
        return Ok(Arc::clone(model));
    }

    let model = Arc::new(XgbModel::load(path, policy)?);
    Ok(Arc::clone(MODEL.get_or_init(|| model)))
}

/// The loaded model, if `init` has succeeded.
#[must_use]
pub fn loaded() -> Option<Arc<XgbModel>> {
    MODEL.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // Single test: the slot is shared by the whole test binary.
    #[test]
    fn test_failed_load_then_success_then_reuse() {
        let policy = IntegrityPolicy::permissive();

        let err = init(Path::new("/nonexistent/xgb_model.json"), &policy).unwrap_err();
        assert!(matches!(err, ModelLoadError::NotFound(_)));
        assert!(loaded().is_none());

        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/xgb_model.json");
        let first = init(&fixture, &policy).expect("Should load fixture model");
        let again = init(Path::new("/ignored"), &policy).expect("Should reuse loaded model");

        assert!(Arc::ptr_eq(&first, &again));
        assert!(loaded().is_some_and(|m| Arc::ptr_eq(&m, &first)));
    }
}
