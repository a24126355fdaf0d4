//! Explainer output shapes.
//!
//! Tree explainers answer in one of two shapes: one baseline/attribution pair
//! per class, or a single flat pair. The shape is a tagged variant so callers
//! dispatch on it explicitly.

use serde::{Deserialize, Serialize};

/// Index of the positive (frail) class in per-class outputs.
pub const POSITIVE_CLASS: usize = 1;

/// Baseline and per-feature attributions for one class and one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAttribution {
    /// Expected model output over the background distribution.
    pub expected_value: f64,
    /// One signed value per feature, in model column order.
    pub values: Vec<f64>,
}

impl ClassAttribution {
    #[must_use]
    pub fn new(expected_value: f64, values: Vec<f64>) -> Self {
        Self {
            expected_value,
            values,
        }
    }

    /// `expected_value + Σ values`, the explained model output.
    #[must_use]
    pub fn output_value(&self) -> f64 {
        self.expected_value + self.values.iter().sum::<f64>()
    }
}

/// Raw answer of a tree explainer for a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExplainerOutput {
    /// Nested output: one entry per class.
    PerClass(Vec<ClassAttribution>),
    /// Flat output for models with a single margin.
    Single(ClassAttribution),
}

/// The explainer answered in a shape we do not know how to read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplanationError {
    #[error("per-class explainer output has {0} classes, need at least 2")]
    MissingPositiveClass(usize),

    #[error("explainer returned {got} attributions for {expected} features")]
    LengthMismatch { expected: usize, got: usize },
}

impl ExplainerOutput {
    /// Attributions for the positive class.
    ///
    /// # Errors
    /// Fails when a per-class output has no positive-class entry, or when the
    /// attribution vector does not cover exactly `n_features` features.
    pub fn positive_class(self, n_features: usize) -> Result<ClassAttribution, ExplanationError> {
        let attribution = match self {
            Self::PerClass(mut classes) => {
                if classes.len() <= POSITIVE_CLASS {
                    return Err(ExplanationError::MissingPositiveClass(classes.len()));
                }
                classes.swap_remove(POSITIVE_CLASS)
            }
            Self::Single(attribution) => attribution,
        };

        if attribution.values.len() != n_features {
            return Err(ExplanationError::LengthMismatch {
                expected: n_features,
                got: attribution.values.len(),
            });
        }
        Ok(attribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_selects_index_one_like_flat() {
        let positive = ClassAttribution::new(-0.42, vec![0.1, -0.2, 0.3]);
        let nested = ExplainerOutput::PerClass(vec![
            ClassAttribution::new(0.42, vec![-0.1, 0.2, -0.3]),
            positive.clone(),
        ]);
        let flat = ExplainerOutput::Single(positive);

        let from_nested = nested.positive_class(3).expect("Should select class 1");
        let from_flat = flat.positive_class(3).expect("Should use flat output");

        assert_eq!(from_nested, from_flat);
        assert_eq!(from_nested.expected_value.to_bits(), (-0.42f64).to_bits());
    }

    #[test]
    fn test_nested_without_positive_class() {
        let nested = ExplainerOutput::PerClass(vec![ClassAttribution::new(0.0, vec![0.0])]);
        assert_eq!(
            nested.positive_class(1),
            Err(ExplanationError::MissingPositiveClass(1))
        );
    }

    #[test]
    fn test_length_mismatch() {
        let flat = ExplainerOutput::Single(ClassAttribution::new(0.0, vec![0.0, 1.0]));
        assert_eq!(
            flat.positive_class(7),
            Err(ExplanationError::LengthMismatch { expected: 7, got: 2 })
        );
    }

    #[test]
    fn test_output_value() {
        let a = ClassAttribution::new(-1.0, vec![0.5, 0.25, -0.25]);
        assert!((a.output_value() - (-0.5)).abs() < f64::EPSILON);
    }
}
