//! Trait classifier: one trained forest bound to the marker panel it was trained on.

pub mod confidence;
pub mod evaluation;
mod persistence;
pub mod prediction;

pub use confidence::{level, ConfidenceLevel, ConfidenceThresholds};
pub use evaluation::{ConfusionMatrix, Evaluation, TrainingReport};
pub use prediction::{Distribution, SinglePrediction, TraitPrediction};

use crate::error::{EngineError, Result};
use crate::features::{FeatureMatrix, FeatureVector};
use crate::forest::{train_test_split, ForestParams, RandomForest};
use crate::genotype::GenotypeEncoder;
use crate::observation::Observation;
use crate::panel::MarkerPanel;
use crate::types::{OutputShape, TraitKind};
use std::sync::Arc;

/// Fraction of rows held out by [`TraitClassifier::train_with_holdout`] by default.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Prediction never mutates the classifier, so a loaded instance can be
/// shared across threads for concurrent reads. Training takes `&mut self`.
#[derive(Debug, Clone)]
pub struct TraitClassifier {
    trait_kind: TraitKind,
    panel: MarkerPanel,
    encoder: Arc<GenotypeEncoder>,
    model: Option<RandomForest>,
}

impl TraitClassifier {
    /// Unloaded classifier using the shipped panel for `trait_kind`.
    pub fn new(trait_kind: TraitKind, encoder: Arc<GenotypeEncoder>) -> Self {
        Self::with_panel(MarkerPanel::for_trait(trait_kind), encoder)
    }

    pub fn with_panel(panel: MarkerPanel, encoder: Arc<GenotypeEncoder>) -> Self {
        Self {
            trait_kind: panel.trait_kind(),
            panel,
            encoder,
            model: None,
        }
    }

    /// Binds an already trained forest. Its width must match the panel.
    pub fn with_model(mut self, model: RandomForest) -> Result<Self> {
        if model.n_features() != self.panel.len() {
            return Err(EngineError::ShapeMismatch {
                expected: self.panel.len(),
                actual: model.n_features(),
            });
        }
        self.model = Some(model);
        Ok(self)
    }

    pub fn trait_kind(&self) -> TraitKind {
        self.trait_kind
    }

    pub fn panel(&self) -> &MarkerPanel {
        &self.panel
    }

    pub fn encoder(&self) -> &GenotypeEncoder {
        &self.encoder
    }

    pub fn model(&self) -> Option<&RandomForest> {
        self.model.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    fn forest(&self) -> Result<&RandomForest> {
        self.model
            .as_ref()
            .ok_or(EngineError::ModelNotLoaded(self.trait_kind))
    }

    pub fn feature_vector(&self, observation: &Observation) -> Result<FeatureVector> {
        FeatureVector::build(&self.panel, observation, &self.encoder)
    }

    /// Forest that accepts `features`, or the error explaining why none does.
    fn forest_for(&self, features: &FeatureVector) -> Result<&RandomForest> {
        let forest = self.forest()?;
        if features.len() != forest.n_features() {
            return Err(EngineError::ShapeMismatch {
                expected: forest.n_features(),
                actual: features.len(),
            });
        }
        Ok(forest)
    }

    /// Top class for an already built feature vector.
    pub fn predict_features(&self, features: &FeatureVector) -> Result<SinglePrediction> {
        let (label, confidence) = self
            .forest_for(features)?
            .predict_with_confidence(features.as_slice())?;
        Ok(SinglePrediction::new(label, confidence))
    }

    /// Full class distribution for an already built feature vector.
    pub fn distribution_for(&self, features: &FeatureVector) -> Result<Distribution> {
        let forest = self.forest_for(features)?;
        let proba = forest.predict_proba(features.as_slice())?;
        Ok(forest.classes().iter().cloned().zip(proba).collect())
    }

    /// Predicted label plus its probability as the confidence.
    pub fn predict_single(&self, observation: &Observation) -> Result<SinglePrediction> {
        self.forest()?;
        let features = self.feature_vector(observation)?;
        self.predict_features(&features)
    }

    pub fn predict_distribution(&self, observation: &Observation) -> Result<Distribution> {
        self.forest()?;
        let features = self.feature_vector(observation)?;
        self.distribution_for(&features)
    }

    /// Prediction in the shape the trait reports: a label for eye/hair, a
    /// distribution for ancestry.
    pub fn predict(&self, observation: &Observation) -> Result<TraitPrediction> {
        match self.trait_kind.output_shape() {
            OutputShape::SingleLabel => self
                .predict_single(observation)
                .map(TraitPrediction::SingleLabel),
            OutputShape::Distribution => self
                .predict_distribution(observation)
                .map(TraitPrediction::Distribution),
        }
    }

    /// Fits a new forest on every given row, replacing any previous model.
    pub fn train(
        &mut self,
        features: &FeatureMatrix,
        labels: &[String],
        params: &ForestParams,
    ) -> Result<()> {
        self.train_with_progress(features, labels, params, || {})
    }

    pub fn train_with_progress<F>(
        &mut self,
        features: &FeatureMatrix,
        labels: &[String],
        params: &ForestParams,
        on_tree: F,
    ) -> Result<()>
    where
        F: Fn() + Sync,
    {
        if features.n_features() != self.panel.len() {
            return Err(EngineError::ShapeMismatch {
                expected: self.panel.len(),
                actual: features.n_features(),
            });
        }
        let forest = RandomForest::fit_with_progress(params, features.rows(), labels, on_tree)?;
        tracing::info!(
            trait_kind = %self.trait_kind,
            rows = features.n_rows(),
            classes = forest.classes().len(),
            "trained classifier"
        );
        self.model = Some(forest);
        Ok(())
    }

    /// Accuracy and confusion matrix on held-out rows.
    pub fn evaluate(
        &self,
        test_features: &FeatureMatrix,
        test_labels: &[String],
    ) -> Result<Evaluation> {
        if test_features.n_rows() != test_labels.len() {
            return Err(EngineError::InvalidTrainingData(format!(
                "{} test rows but {} test labels",
                test_features.n_rows(),
                test_labels.len()
            )));
        }
        let predicted = self.predict_rows(test_features)?;
        Ok(Evaluation::from_predictions(test_labels, &predicted))
    }

    fn predict_rows(&self, features: &FeatureMatrix) -> Result<Vec<String>> {
        features
            .rows()
            .iter()
            .map(|row| {
                self.predict_features(&FeatureVector::from(row.clone()))
                    .map(|p| p.label)
            })
            .collect()
    }

    /// Shuffles with `params.seed`, holds out `test_fraction` of the rows,
    /// trains on the rest and scores both sides.
    pub fn train_with_holdout<F>(
        &mut self,
        features: &FeatureMatrix,
        labels: &[String],
        params: &ForestParams,
        test_fraction: f64,
        on_tree: F,
    ) -> Result<TrainingReport>
    where
        F: Fn() + Sync,
    {
        if features.n_rows() != labels.len() {
            return Err(EngineError::InvalidTrainingData(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.len()
            )));
        }

        let (train_idx, test_idx) = train_test_split(features.n_rows(), test_fraction, params.seed);
        if train_idx.is_empty() {
            return Err(EngineError::InvalidTrainingData(format!(
                "{} rows leave nothing to train on after holding out {:.0}%",
                features.n_rows(),
                test_fraction * 100.0
            )));
        }

        let pick =
            |idx: &[usize]| -> Vec<String> { idx.iter().map(|&i| labels[i].clone()).collect() };
        let train_x = features.select(&train_idx);
        let train_y = pick(&train_idx);
        self.train_with_progress(&train_x, &train_y, params, on_tree)?;

        let train_accuracy = self.evaluate(&train_x, &train_y)?.accuracy;
        let test = if test_idx.is_empty() {
            None
        } else {
            Some(self.evaluate(&features.select(&test_idx), &pick(&test_idx))?)
        };

        Ok(TrainingReport {
            n_train: train_idx.len(),
            n_test: test_idx.len(),
            train_accuracy,
            test,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> Arc<GenotypeEncoder> {
        Arc::new(GenotypeEncoder::new())
    }

    fn eye_training_set() -> (FeatureMatrix, Vec<String>) {
        // HERC2 (feature 0) decides the label.
        let mut matrix = FeatureMatrix::new(6);
        let mut labels = Vec::new();
        for i in 0..60u8 {
            let herc2 = i % 3;
            matrix
                .push(vec![herc2, (i / 3) % 3, (i / 9) % 3, i % 2, (i / 2) % 3, (i / 5) % 3])
                .unwrap();
            labels.push(match herc2 {
                0 => "brown",
                1 => "hazel",
                _ => "blue",
            }
            .to_string());
        }
        (matrix, labels)
    }

    // Every split sees every feature, so HERC2 is always chosen first.
    fn quick_params() -> ForestParams {
        ForestParams {
            n_estimators: 20,
            max_features: Some(6),
            ..ForestParams::default()
        }
    }

    fn trained_eye() -> TraitClassifier {
        let (x, y) = eye_training_set();
        let mut clf = TraitClassifier::new(TraitKind::EyeColor, encoder());
        clf.train(&x, &y, &quick_params()).unwrap();
        clf
    }

    #[test]
    fn test_unloaded_classifier_reports_model_not_loaded() {
        let clf = TraitClassifier::new(TraitKind::HairColor, encoder());
        assert!(!clf.is_loaded());
        assert_eq!(
            clf.predict_single(&Observation::new()).unwrap_err(),
            EngineError::ModelNotLoaded(TraitKind::HairColor)
        );
        assert_eq!(
            clf.predict_distribution(&Observation::new()).unwrap_err(),
            EngineError::ModelNotLoaded(TraitKind::HairColor)
        );
    }

    #[test]
    fn test_single_prediction_confidence_is_max_probability() {
        let clf = trained_eye();
        let obs: Observation = [("rs12913832", "GG")].into_iter().collect();
        let single = clf.predict_single(&obs).unwrap();
        let dist = clf.predict_distribution(&obs).unwrap();

        let max = dist.values().cloned().fold(f64::MIN, f64::max);
        assert_eq!(single.confidence, max);
        assert_eq!(dist[&single.label], max);
        assert!((0.0..=1.0).contains(&single.confidence));
        assert_eq!(single.label, "blue");
        assert!(single.confidence_level.is_none());
    }

    #[test]
    fn test_wrong_width_vector_is_a_shape_mismatch() {
        let clf = trained_eye();
        let short = FeatureVector::from(vec![1, 2, 0]);
        assert_eq!(
            clf.predict_features(&short).unwrap_err(),
            EngineError::ShapeMismatch { expected: 6, actual: 3 }
        );
    }

    #[test]
    fn test_forest_bound_to_wrong_panel_is_rejected() {
        let clf = trained_eye();
        let forest = clf.model().unwrap().clone();
        let hair = TraitClassifier::new(TraitKind::HairColor, encoder());
        assert_eq!(
            hair.with_model(forest).unwrap_err(),
            EngineError::ShapeMismatch { expected: 5, actual: 6 }
        );
    }

    #[test]
    fn test_training_matrix_width_is_checked() {
        let mut clf = TraitClassifier::new(TraitKind::Ancestry, encoder());
        let (x, y) = eye_training_set();
        assert_eq!(
            clf.train(&x, &y, &quick_params()).unwrap_err(),
            EngineError::ShapeMismatch { expected: 5, actual: 6 }
        );
    }

    #[test]
    fn test_empty_observation_still_predicts() {
        let clf = trained_eye();
        let fv = clf.feature_vector(&Observation::new()).unwrap();
        assert_eq!(fv.as_slice(), &[0; 6]);
        assert!(clf.predict_single(&Observation::new()).is_ok());
    }

    #[test]
    fn test_predict_dispatches_on_output_shape() {
        let clf = trained_eye();
        assert!(matches!(
            clf.predict(&Observation::new()).unwrap(),
            TraitPrediction::SingleLabel(_)
        ));
    }

    #[test]
    fn test_holdout_split_and_evaluation() {
        let (x, y) = eye_training_set();
        let mut clf = TraitClassifier::new(TraitKind::EyeColor, encoder());
        let report = clf
            .train_with_holdout(&x, &y, &quick_params(), DEFAULT_TEST_FRACTION, || {})
            .unwrap();

        assert_eq!(report.n_train, 48);
        assert_eq!(report.n_test, 12);
        let test = report.test.unwrap();
        assert_eq!(test.n_samples, 12);
        assert_eq!(test.confusion.total(), 12);
        assert!((test.accuracy - 1.0).abs() < 1e-12);
        assert!((report.train_accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_holdout_needs_training_rows() {
        let mut x = FeatureMatrix::new(6);
        x.push(vec![0; 6]).unwrap();
        let mut clf = TraitClassifier::new(TraitKind::EyeColor, encoder());
        let err = clf
            .train_with_holdout(&x, &["blue".to_string()], &quick_params(), 0.2, || {})
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTrainingData(_)));
    }

    #[test]
    fn test_evaluate_requires_matching_labels() {
        let clf = trained_eye();
        let (x, _) = eye_training_set();
        assert!(clf.evaluate(&x, &["blue".to_string()]).is_err());
    }
}
