//! Prediction pipeline: Turns one form submission into a risk estimate.
//!
//! This service coordinates:
//! - Feature frame construction
//! - Projection into the training column order
//! - Positive-class probability
//! - SHAP attribution for the same row

use std::path::Path;
use std::sync::Arc;

use crate::adapters::xgboost::{IntegrityPolicy, XgbModel};
use crate::domain::{
    to_percentage, Attribution, FeatureFrame, FeatureRecord, PredictionResult, SchemaMismatch,
    POSITIVE_CLASS, TRAINING_COLUMNS,
};
use crate::ports::{Classifier, TreeExplainer};
use crate::FrailsightError;

/// Single-shot scoring and explanation of a feature record.
///
/// Holds shared, read-only handles to the model runtime. Every call runs the
/// full pipeline; nothing is cached between calls.
pub struct PredictionPipeline<C, E>
where
    C: Classifier,
    E: TreeExplainer,
{
    classifier: Arc<C>,
    explainer: Arc<E>,
}

impl<C, E> PredictionPipeline<C, E>
where
    C: Classifier,
    E: TreeExplainer,
{
    /// Create a pipeline over the given classifier and explainer.
    pub fn new(classifier: Arc<C>, explainer: Arc<E>) -> Self {
        Self {
            classifier,
            explainer,
        }
    }

    /// Score and explain one record.
    ///
    /// Performs the full pipeline:
    /// 1. Build the frame under canonical column names
    /// 2. Project it into the training column order
    /// 3. Positive-class probability, as a percentage with 2 decimals
    /// 4. Positive-class attributions
    ///
    /// # Errors
    /// `SchemaMismatch` if the projection or the model's own column names
    /// disagree with the training order; classifier and explainer failures
    /// are propagated as-is.
    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, FrailsightError> {
        tracing::debug!("Step 1: Building feature frame...");
        let frame = FeatureFrame::from_record(record);

        tracing::debug!("Step 2: Projecting onto training column order...");
        let row = frame.select(&TRAINING_COLUMNS)?;
        self.check_model_columns(&row)?;
        tracing::debug!("Model row: {:?}", row.values());

        tracing::debug!("Step 3: Computing positive-class probability...");
        let proba = self
            .classifier
            .predict_proba(&row)
            .map_err(FrailsightError::Classifier)?;
        let positive = proba.get(POSITIVE_CLASS).copied().ok_or_else(|| {
            FrailsightError::Classifier(format!(
                "classifier returned {} class probabilities",
                proba.len()
            ))
        })?;
        let probability = to_percentage(positive);

        tracing::debug!("Step 4: Computing feature attributions...");
        let explained = self
            .explainer
            .explain(&row)
            .map_err(FrailsightError::Explainer)?
            .positive_class(row.len())?;
        let attribution = Attribution::from_explanation(&row, explained);

        let result = PredictionResult::new(probability, attribution);
        tracing::info!("Prediction complete (request {})", result.id);
        tracing::debug!(
            "Request {}: probability={:.2}%, base={:.4}, output={:.4}",
            result.id,
            result.probability,
            result.attribution.base_value,
            result.attribution.output_value()
        );

        Ok(result)
    }

    /// Score raw integer codes given in construction order.
    ///
    /// # Errors
    /// `Validation` listing every out-of-domain code, then as [`Self::predict`].
    pub fn predict_codes(&self, codes: [i64; 7]) -> Result<PredictionResult, FrailsightError> {
        let record = FeatureRecord::from_codes(codes).map_err(|errors| {
            FrailsightError::Validation(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        self.predict(&record)
    }

    /// Exact name check against the column names stored in the model, if any.
    fn check_model_columns(&self, row: &FeatureFrame) -> Result<(), SchemaMismatch> {
        let Some(trained) = self.classifier.feature_names() else {
            return Ok(());
        };

        let names = row.names();
        for (i, expected) in trained.iter().enumerate() {
            if names.get(i).copied() != Some(expected.as_str()) {
                tracing::error!(
                    "Model column {} is {:?}, pipeline produced {:?}",
                    i,
                    expected,
                    names.get(i)
                );
                return Err(SchemaMismatch {
                    column: expected.clone(),
                });
            }
        }
        if names.len() != trained.len() {
            return Err(SchemaMismatch {
                column: names[trained.len()..].join(", "),
            });
        }
        Ok(())
    }
}

impl PredictionPipeline<XgbModel, XgbModel> {
    /// Pipeline where one XGBoost model both scores and explains.
    #[must_use]
    pub fn from_model(model: Arc<XgbModel>) -> Self {
        Self::new(Arc::clone(&model), model)
    }

    /// Load the model at `path` into the process-wide slot and build a pipeline on it.
    ///
    /// # Errors
    /// `ModelLoad` when the model is missing, corrupt or fails verification.
    pub fn load(path: &Path, policy: &IntegrityPolicy) -> Result<Self, FrailsightError> {
        let model = super::model::init(path, policy)?;
        Ok(Self::from_model(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::xgboost::{Node, Objective, Tree};
    use crate::domain::{ClassAttribution, ExplainerOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Model splitting on "Charlson Comorbidity Index" (column 5) and
    /// "Sarcopenia" (column 6) of the training order.
    fn fixture_model(names: Option<Vec<String>>) -> XgbModel {
        let charlson = Tree::new(
            vec![
                Node::Split {
                    feature: 5,
                    threshold: 3.5,
                    left: 1,
                    right: 2,
                    default_left: false,
                    cover: 10.0,
                },
                Node::Leaf { value: -0.3, cover: 7.0 },
                Node::Leaf { value: 0.6, cover: 3.0 },
            ],
            7,
        )
        .expect("valid");
        let sarcopenia = Tree::new(
            vec![
                Node::Split {
                    feature: 6,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                    default_left: false,
                    cover: 10.0,
                },
                Node::Leaf { value: -0.1, cover: 8.0 },
                Node::Leaf { value: 0.4, cover: 2.0 },
            ],
            7,
        )
        .expect("valid");

        XgbModel::from_parts(
            names,
            7,
            Objective::Logistic,
            -0.5,
            vec![(0, charlson), (0, sarcopenia)],
        )
        .expect("valid model")
    }

    fn training_names() -> Vec<String> {
        TRAINING_COLUMNS.iter().map(|s| (*s).to_string()).collect()
    }

    fn scenario() -> FeatureRecord {
        FeatureRecord::from_codes([0, 1, 0, 1, 0, 2, 0]).expect("in domain")
    }

    #[test]
    fn test_scenario_routes_without_schema_mismatch() {
        let model = fixture_model(Some(training_names()));
        let pipeline = PredictionPipeline::from_model(Arc::new(model));
        let result = pipeline.predict(&scenario()).expect("Should predict");

        assert!((0.0..=100.0).contains(&result.probability));
        assert_eq!(result.attribution.features.len(), 7);
        let names: Vec<&str> = result
            .attribution
            .features
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, TRAINING_COLUMNS.to_vec());
    }

    #[test]
    fn test_probability_matches_margin() {
        let model = fixture_model(None);
        let pipeline = PredictionPipeline::from_model(Arc::new(model));
        // Charlson 2 → -0.3, no sarcopenia → -0.1, base -0.5
        let expected = to_percentage(1.0 / (1.0 + (0.9f64).exp()));
        let result = pipeline.predict(&scenario()).expect("Should predict");
        assert_eq!(result.probability, expected);
    }

    #[test]
    fn test_reordering_feeds_training_positions() {
        // Sarcopenia is last in training order but fifth in construction order.
        let pipeline = PredictionPipeline::from_model(Arc::new(fixture_model(None)));
        let record = FeatureRecord::from_codes([0, 1, 0, 1, 1, 2, 0]).expect("in domain");
        let result = pipeline.predict(&record).expect("Should predict");

        let sarcopenia = &result.attribution.features[6];
        assert_eq!(sarcopenia.name, "Sarcopenia");
        assert_eq!(sarcopenia.value, 1.0);
        assert!(sarcopenia.contribution > 0.0);
    }

    #[test]
    fn test_attributions_explain_the_margin() {
        let pipeline = PredictionPipeline::from_model(Arc::new(fixture_model(None)));
        let result = pipeline.predict(&scenario()).expect("Should predict");
        assert!((result.attribution.output_value() - (-0.9)).abs() < 1e-12);
        // Cover-weighted means: (7·-0.3 + 3·0.6)/10 and (8·-0.1 + 2·0.4)/10
        assert!((result.attribution.base_value - (-0.5 - 0.03 + 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let pipeline = PredictionPipeline::from_model(Arc::new(fixture_model(None)));
        let a = pipeline.predict(&scenario()).expect("Should predict");
        let b = pipeline.predict(&scenario()).expect("Should predict");

        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
        assert_eq!(a.attribution.base_value.to_bits(), b.attribution.base_value.to_bits());
        let bits = |r: &PredictionResult| -> Vec<u64> {
            r.attribution.contributions().iter().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_probability_within_range_for_whole_domain() {
        let pipeline = PredictionPipeline::from_model(Arc::new(fixture_model(None)));
        for record in FeatureRecord::domain() {
            let result = pipeline.predict(&record).expect("Should predict");
            assert!((0.0..=100.0).contains(&result.probability));
            assert_eq!(result.probability, to_percentage(result.probability / 100.0));
        }
    }

    #[test]
    fn test_model_with_other_schema_is_rejected() {
        let mut names = training_names();
        names.swap(4, 6);
        let pipeline = PredictionPipeline::from_model(Arc::new(fixture_model(Some(names))));

        let err = pipeline.predict(&scenario()).unwrap_err();
        match err {
            FrailsightError::SchemaMismatch(m) => assert_eq!(m.column, "Sarcopenia"),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_domain_codes_are_rejected_before_scoring() {
        let pipeline = PredictionPipeline::from_model(Arc::new(fixture_model(None)));
        let err = pipeline.predict_codes([2, 1, 0, 1, 0, 31, 0]).unwrap_err();

        let message = match err {
            FrailsightError::Validation(message) => message,
            other => panic!("expected Validation, got {other:?}"),
        };
        assert!(message.contains("Cognition impaired"));
        assert!(message.contains("Charlson Comorbidity Index"));

        let ok = pipeline.predict_codes([0, 1, 0, 1, 0, 2, 0]).expect("Should predict");
        let direct = pipeline.predict(&scenario()).expect("Should predict");
        assert_eq!(ok.probability, direct.probability);
    }

    struct NestedExplainer {
        calls: AtomicUsize,
    }

    impl TreeExplainer for NestedExplainer {
        fn explain(&self, _row: &FeatureFrame) -> Result<ExplainerOutput, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExplainerOutput::PerClass(vec![
                ClassAttribution::new(0.7, vec![-0.1; 7]),
                ClassAttribution::new(-0.7, vec![0.1; 7]),
            ]))
        }
    }

    #[test]
    fn test_nested_explainer_output_uses_positive_class() {
        let explainer = Arc::new(NestedExplainer {
            calls: AtomicUsize::new(0),
        });
        let pipeline =
            PredictionPipeline::new(Arc::new(fixture_model(None)), Arc::clone(&explainer));
        let result = pipeline.predict(&scenario()).expect("Should predict");

        assert_eq!(explainer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.attribution.base_value, -0.7);
        assert!(result.attribution.contributions().iter().all(|&v| v == 0.1));
    }

    struct OneClass;

    impl Classifier for OneClass {
        fn feature_names(&self) -> Option<&[String]> {
            None
        }

        fn predict_proba(&self, _row: &FeatureFrame) -> Result<Vec<f64>, String> {
            Ok(vec![0.3])
        }
    }

    #[test]
    fn test_single_class_probability_is_an_error() {
        let pipeline = PredictionPipeline::new(Arc::new(OneClass), Arc::new(fixture_model(None)));
        assert!(matches!(
            pipeline.predict(&scenario()),
            Err(FrailsightError::Classifier(_))
        ));
    }
}
