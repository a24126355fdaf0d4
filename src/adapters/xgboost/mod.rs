//! XGBoost adapter: Classifier and TreeExplainer over an XGBoost JSON model.
//!
//! Loads a booster saved with `save_model("xgb_model.json")` and evaluates it
//! natively: tree traversal for probabilities, exact TreeSHAP for attributions.
//!
//! # Supported models
//!
//! - `gbtree` boosters with numerical splits
//! - `binary:logistic` / `reg:logistic`: one margin, sigmoid link
//! - `multi:softprob` / `multi:softmax` with two classes: one margin per
//!   class, softmax link, per-class explanations
//!
//! # Security
//!
//! The artifact is checked against its manifest (and signature, when a
//! verifying key is configured) before it is parsed. See [`integrity`].

mod format;
pub mod integrity;
mod shap;
mod tree;

use std::path::{Path, PathBuf};

use crate::domain::{ClassAttribution, ExplainerOutput, FeatureFrame};
use crate::ports::{Classifier, TreeExplainer};

pub use integrity::{IntegrityPolicy, ModelManifest, Verification};
pub use tree::{Node, Tree};

use format::{parse_scalar, ModelDocument};

/// Reasons a model artifact cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file not found at {0:?}")]
    NotFound(PathBuf),

    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported objective {0:?}")]
    UnsupportedObjective(String),

    #[error("invalid model structure: {0}")]
    InvalidStructure(String),

    #[error("model integrity check failed: {0}")]
    Integrity(String),
}

/// Link function turning margins into class probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Single margin, `p = sigmoid(m)`, classes `[1 - p, p]`.
    Logistic,
    /// One margin per class, softmax.
    Softmax { num_class: usize },
}

impl Objective {
    fn parse(name: &str, num_class: usize) -> Result<Self, ModelLoadError> {
        match name {
            "binary:logistic" | "reg:logistic" => Ok(Self::Logistic),
            "multi:softprob" | "multi:softmax" if num_class == 2 => Ok(Self::Softmax { num_class }),
            other => Err(ModelLoadError::UnsupportedObjective(format!(
                "{other} (num_class={num_class})"
            ))),
        }
    }

    #[must_use]
    pub fn num_groups(self) -> usize {
        match self {
            Self::Logistic => 1,
            Self::Softmax { num_class } => num_class,
        }
    }

    /// Margin corresponding to the stored `base_score`.
    fn base_margin(self, base_score: f64) -> Result<f64, ModelLoadError> {
        match self {
            Self::Logistic => {
                if !(base_score > 0.0 && base_score < 1.0) {
                    return Err(ModelLoadError::InvalidStructure(format!(
                        "base_score {base_score} outside (0, 1) for a logistic objective"
                    )));
                }
                Ok((base_score / (1.0 - base_score)).ln())
            }
            Self::Softmax { .. } => Ok(base_score),
        }
    }
}

/// An immutable gradient-boosted tree ensemble.
#[derive(Debug, Clone)]
pub struct XgbModel {
    feature_names: Option<Vec<String>>,
    num_feature: usize,
    objective: Objective,
    base_margin: f64,
    trees: Vec<Tree>,
    /// Output group (class) of each tree.
    tree_group: Vec<usize>,
}

impl XgbModel {
    /// Load and verify a model file.
    ///
    /// # Errors
    /// `NotFound` when the file is absent, `Integrity` when verification
    /// fails, and parse/structure errors for malformed artifacts.
    pub fn load(path: &Path, policy: &IntegrityPolicy) -> Result<Self, ModelLoadError> {
        if !path.is_file() {
            tracing::error!("Model file not found at {:?}", path);
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let verification = integrity::verify(path, &bytes, policy)?;
        let model = Self::from_json_slice(&bytes)?;

        tracing::info!(
            "Loaded model from {:?} (objective={:?}, trees={}, n_features={}, integrity={:?})",
            path,
            model.objective,
            model.trees.len(),
            model.num_feature,
            verification
        );
        Ok(model)
    }

    /// Parse a model from XGBoost JSON bytes without integrity checks.
    ///
    /// # Errors
    /// Parse and structure errors.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let doc: ModelDocument = serde_json::from_slice(bytes)?;
        Self::from_document(doc)
    }

    fn from_document(doc: ModelDocument) -> Result<Self, ModelLoadError> {
        let learner = doc.learner;
        tracing::debug!("XGBoost model format version {:?}", doc.version);

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelLoadError::InvalidStructure(format!(
                "booster {:?} is not supported (expected gbtree)",
                learner.gradient_booster.name
            )));
        }
        let forest = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelLoadError::InvalidStructure("gbtree has no model".into()))?;

        let param = &learner.learner_model_param;
        let num_feature = parse_count(&param.num_feature, "num_feature")?;
        let num_class = parse_count(&param.num_class, "num_class")?;
        let base_score = parse_scalar(&param.base_score).ok_or_else(|| {
            ModelLoadError::InvalidStructure(format!("invalid base_score {:?}", param.base_score))
        })?;

        let objective = Objective::parse(&learner.objective.name, num_class)?;
        let base_margin = objective.base_margin(base_score)?;

        if num_feature == 0 {
            return Err(ModelLoadError::InvalidStructure("model has no features".into()));
        }
        if forest.trees.is_empty() {
            return Err(ModelLoadError::InvalidStructure("model has no trees".into()));
        }

        let feature_names = if learner.feature_names.is_empty() {
            None
        } else if learner.feature_names.len() == num_feature {
            Some(learner.feature_names)
        } else {
            return Err(ModelLoadError::InvalidStructure(format!(
                "{} feature names for {num_feature} features",
                learner.feature_names.len()
            )));
        };

        let tree_group = if forest.tree_info.is_empty() {
            vec![0; forest.trees.len()]
        } else {
            forest.tree_info
        };
        if tree_group.len() != forest.trees.len() {
            return Err(ModelLoadError::InvalidStructure(
                "tree_info length does not match number of trees".into(),
            ));
        }
        if let Some(&g) = tree_group.iter().find(|&&g| g >= objective.num_groups()) {
            return Err(ModelLoadError::InvalidStructure(format!(
                "tree assigned to group {g}, objective has {}",
                objective.num_groups()
            )));
        }

        let trees = forest
            .trees
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Tree::from_doc(t, num_feature)
                    .map_err(|e| ModelLoadError::InvalidStructure(format!("tree {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            feature_names,
            num_feature,
            objective,
            base_margin,
            trees,
            tree_group,
        })
    }

    /// Assemble a model from already-built trees.
    ///
    /// # Errors
    /// `InvalidStructure` when groups or features are inconsistent.
    pub fn from_parts(
        feature_names: Option<Vec<String>>,
        num_feature: usize,
        objective: Objective,
        base_margin: f64,
        trees: Vec<(usize, Tree)>,
    ) -> Result<Self, ModelLoadError> {
        if trees.iter().any(|(g, _)| *g >= objective.num_groups()) {
            return Err(ModelLoadError::InvalidStructure("tree group out of range".into()));
        }
        if feature_names.as_ref().is_some_and(|n| n.len() != num_feature) {
            return Err(ModelLoadError::InvalidStructure("feature name count mismatch".into()));
        }
        let (tree_group, trees) = trees.into_iter().unzip();
        Ok(Self {
            feature_names,
            num_feature,
            objective,
            base_margin,
            trees,
            tree_group,
        })
    }

    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.num_feature
    }

    #[must_use]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw margin per output group.
    #[must_use]
    pub fn margins(&self, x: &[f64]) -> Vec<f64> {
        let mut out = vec![self.base_margin; self.objective.num_groups()];
        for (tree, &group) in self.trees.iter().zip(&self.tree_group) {
            out[group] += tree.predict(x);
        }
        out
    }

    fn row_values(&self, row: &FeatureFrame) -> Result<Vec<f64>, String> {
        if row.len() != self.num_feature {
            return Err(format!(
                "row has {} features, model expects {}",
                row.len(),
                self.num_feature
            ));
        }
        Ok(row.values())
    }
}

fn parse_count(raw: &str, what: &str) -> Result<usize, ModelLoadError> {
    parse_scalar(raw)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as usize)
        .ok_or_else(|| ModelLoadError::InvalidStructure(format!("invalid {what} {raw:?}")))
}

fn sigmoid(m: f64) -> f64 {
    1.0 / (1.0 + (-m).exp())
}

fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl Classifier for XgbModel {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, row: &FeatureFrame) -> Result<Vec<f64>, String> {
        let x = self.row_values(row)?;
        let margins = self.margins(&x);
        Ok(match self.objective {
            Objective::Logistic => {
                let p = sigmoid(margins[0]);
                vec![1.0 - p, p]
            }
            Objective::Softmax { .. } => softmax(&margins),
        })
    }
}

impl TreeExplainer for XgbModel {
    fn explain(&self, row: &FeatureFrame) -> Result<ExplainerOutput, String> {
        let x = self.row_values(row)?;
        let groups = self.objective.num_groups();

        let mut per_group: Vec<ClassAttribution> = (0..groups)
            .map(|_| ClassAttribution::new(self.base_margin, vec![0.0; self.num_feature]))
            .collect();

        for (tree, &group) in self.trees.iter().zip(&self.tree_group) {
            let slot = &mut per_group[group];
            slot.expected_value += tree.expected_value();
            shap::accumulate(tree, &x, &mut slot.values);
        }

        Ok(match self.objective {
            Objective::Logistic => ExplainerOutput::Single(per_group.remove(0)),
            Objective::Softmax { .. } => ExplainerOutput::PerClass(per_group),
        })
    }
}
