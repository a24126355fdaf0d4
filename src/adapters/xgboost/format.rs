//! Serde mirror of XGBoost's native JSON model format (`Booster.save_model("*.json")`).
//!
//! Only the fields needed for inference are declared; everything else in the
//! document is ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct ModelDocument {
    pub learner: LearnerDoc,
    #[serde(default)]
    pub version: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LearnerDoc {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub gradient_booster: GradientBoosterDoc,
    pub learner_model_param: LearnerModelParam,
    pub objective: ObjectiveDoc,
}

#[derive(Debug, Deserialize)]
pub(super) struct GradientBoosterDoc {
    pub name: String,
    #[serde(default)]
    pub model: Option<ForestDoc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ForestDoc {
    pub trees: Vec<TreeDoc>,
    #[serde(default)]
    pub tree_info: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TreeDoc {
    pub left_children: Vec<i64>,
    pub right_children: Vec<i64>,
    pub split_indices: Vec<i64>,
    pub split_conditions: Vec<f64>,
    pub default_left: Vec<Flag>,
    pub sum_hessian: Vec<f64>,
    #[serde(default)]
    pub split_type: Vec<u8>,
}

/// `default_left` is written as 0/1 by some XGBoost releases and as booleans by others.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub(super) enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}

/// Scalar parameters, all serialized as strings.
#[derive(Debug, Deserialize)]
pub(super) struct LearnerModelParam {
    pub base_score: String,
    #[serde(default = "zero_string")]
    pub num_class: String,
    pub num_feature: String,
}

fn zero_string() -> String {
    "0".to_string()
}

#[derive(Debug, Deserialize)]
pub(super) struct ObjectiveDoc {
    pub name: String,
}

/// Parse an XGBoost scalar parameter.
///
/// Newer releases wrap vector-valued parameters in brackets (`"[5E-1]"`).
pub(super) fn parse_scalar(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next()?.trim();
    first.parse::<f64>().ok()
}
