//! Prediction result types.
//!
//! Output of one form submission: the frailty risk percentage and the
//! per-feature attributions that explain it. Nothing here is persisted.

use serde::{Deserialize, Serialize};

use super::explanation::ClassAttribution;
use super::frame::FeatureFrame;

/// Convert a positive-class probability into a percentage rounded to 2 decimals.
///
/// Halfway cases round to even, matching numpy's `round`.
#[must_use]
pub fn to_percentage(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round_ties_even() / 100.0
}

/// Signed contribution of one feature to the explained output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    /// Input value of the feature for this row.
    pub value: f64,
    /// SHAP value (margin units).
    pub contribution: f64,
}

/// Baseline, contributions and explained output for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub base_value: f64,
    /// In model column order.
    pub features: Vec<FeatureContribution>,
}

impl Attribution {
    /// Pair explainer values with the frame the model saw.
    ///
    /// The caller guarantees `explained.values.len() == frame.len()`.
    #[must_use]
    pub fn from_explanation(frame: &FeatureFrame, explained: ClassAttribution) -> Self {
        let features = frame
            .iter()
            .zip(explained.values)
            .map(|((name, value), contribution)| FeatureContribution {
                name: name.to_string(),
                value,
                contribution,
            })
            .collect();

        Self {
            base_value: explained.expected_value,
            features,
        }
    }

    /// `base_value + Σ contributions`.
    #[must_use]
    pub fn output_value(&self) -> f64 {
        self.base_value + self.features.iter().map(|f| f.contribution).sum::<f64>()
    }

    #[must_use]
    pub fn contributions(&self) -> Vec<f64> {
        self.features.iter().map(|f| f.contribution).collect()
    }
}

/// Result of running the pipeline once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Correlates log lines of one submission.
    pub id: String,

    /// Frailty risk in percent, `[0, 100]`, 2 decimals.
    pub probability: f64,

    pub attribution: Attribution,

    pub computed_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    #[must_use]
    pub fn new(probability: f64, attribution: Attribution) -> Self {
        Self {
            id: uuid_v4(),
            probability,
            attribution,
            computed_at: chrono::Utc::now(),
        }
    }

    /// Text line shown under the form.
    #[must_use]
    pub fn headline(&self) -> String {
        format!("Predicted frailty risk: {:.2} %", self.probability)
    }
}

/// Random UUID v4 from a ChaCha20 CSPRNG seeded by the OS.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
