//! Unified multi-trait prediction.
//!
//! The pipeline owns up to one classifier per trait and runs every loaded one
//! against an observation. Traits are independent: a failing classifier is
//! recorded in the report's error list while the others still produce results.

use crate::classifier::{ConfidenceThresholds, TraitClassifier, TraitPrediction};
use crate::error::EngineError;
use crate::genotype::GenotypeEncoder;
use crate::observation::Observation;
use crate::types::TraitKind;
use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Per-observation results keyed by trait, plus per-trait failures.
///
/// Only traits whose classifier was loaded appear in either map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedReport {
    traits: BTreeMap<TraitKind, TraitPrediction>,
    errors: BTreeMap<TraitKind, EngineError>,
}

impl UnifiedReport {
    pub fn insert(&mut self, trait_kind: TraitKind, prediction: TraitPrediction) {
        self.errors.remove(&trait_kind);
        self.traits.insert(trait_kind, prediction);
    }

    pub fn insert_error(&mut self, trait_kind: TraitKind, error: EngineError) {
        self.traits.remove(&trait_kind);
        self.errors.insert(trait_kind, error);
    }

    pub fn get(&self, trait_kind: TraitKind) -> Option<&TraitPrediction> {
        self.traits.get(&trait_kind)
    }

    pub fn error(&self, trait_kind: TraitKind) -> Option<&EngineError> {
        self.errors.get(&trait_kind)
    }

    pub fn traits(&self) -> impl Iterator<Item = (TraitKind, &TraitPrediction)> {
        self.traits.iter().map(|(k, v)| (*k, v))
    }

    pub fn errors(&self) -> impl Iterator<Item = (TraitKind, &EngineError)> {
        self.errors.iter().map(|(k, v)| (*k, v))
    }

    /// Report keys in order, e.g. `["eye_color", "ancestry"]`.
    pub fn keys(&self) -> Vec<&'static str> {
        self.traits.keys().map(TraitKind::key).collect()
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Serialize for UnifiedReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let with_errors = usize::from(!self.errors.is_empty());
        let mut map = serializer.serialize_map(Some(self.traits.len() + with_errors))?;
        for (kind, prediction) in &self.traits {
            map.serialize_entry(kind.key(), prediction)?;
        }
        if !self.errors.is_empty() {
            let errors: BTreeMap<&str, String> = self
                .errors
                .iter()
                .map(|(kind, err)| (kind.key(), err.to_string()))
                .collect();
            map.serialize_entry("errors", &errors)?;
        }
        map.end()
    }
}

/// Attaches a confidence level to every single-label result.
///
/// Distributions are left untouched. Levels are recomputed from the stored
/// confidence, so annotating twice gives the same report.
pub fn annotate_confidence(
    mut report: UnifiedReport,
    thresholds: &ConfidenceThresholds,
) -> UnifiedReport {
    for prediction in report.traits.values_mut() {
        if let TraitPrediction::SingleLabel(single) = prediction {
            single.confidence_level = Some(thresholds.classify(single.confidence));
        }
    }
    report
}

#[derive(Debug, Clone, Default)]
pub struct UnifiedPipeline {
    eye_color: Option<TraitClassifier>,
    hair_color: Option<TraitClassifier>,
    ancestry: Option<TraitClassifier>,
    thresholds: ConfidenceThresholds,
}

impl UnifiedPipeline {
    /// An empty pipeline; it predicts nothing until classifiers are added.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eye_color(self, classifier: TraitClassifier) -> crate::error::Result<Self> {
        self.with_checked(TraitKind::EyeColor, classifier)
    }

    pub fn with_hair_color(self, classifier: TraitClassifier) -> crate::error::Result<Self> {
        self.with_checked(TraitKind::HairColor, classifier)
    }

    pub fn with_ancestry(self, classifier: TraitClassifier) -> crate::error::Result<Self> {
        self.with_checked(TraitKind::Ancestry, classifier)
    }

    fn with_checked(
        self,
        expected: TraitKind,
        classifier: TraitClassifier,
    ) -> crate::error::Result<Self> {
        if classifier.trait_kind() != expected {
            return Err(EngineError::TraitMismatch {
                expected,
                found: classifier.trait_kind(),
            });
        }
        Ok(self.with_classifier(classifier))
    }

    /// Places `classifier` in the slot for its own trait.
    pub fn with_classifier(mut self, classifier: TraitClassifier) -> Self {
        let slot = match classifier.trait_kind() {
            TraitKind::EyeColor => &mut self.eye_color,
            TraitKind::HairColor => &mut self.hair_color,
            TraitKind::Ancestry => &mut self.ancestry,
        };
        *slot = Some(classifier);
        self
    }

    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    /// Loads every `<trait>_model.json` present in `dir`.
    ///
    /// Missing files leave the trait out. A file that exists but cannot be
    /// restored is an error.
    pub fn from_model_dir(dir: &Path, encoder: Arc<GenotypeEncoder>) -> Result<Self> {
        let mut pipeline = UnifiedPipeline::new();
        for kind in TraitKind::ALL {
            let path = dir.join(kind.model_file_name());
            if !path.exists() {
                tracing::warn!(
                    trait_kind = %kind,
                    path = %path.display(),
                    "no model file, trait skipped"
                );
                continue;
            }
            let classifier = TraitClassifier::load(kind, &path, Arc::clone(&encoder))
                .with_context(|| format!("Failed to load {} model from {}", kind, path.display()))?;
            pipeline = pipeline.with_classifier(classifier);
        }
        Ok(pipeline)
    }

    fn slot(&self, kind: TraitKind) -> Option<&TraitClassifier> {
        match kind {
            TraitKind::EyeColor => self.eye_color.as_ref(),
            TraitKind::HairColor => self.hair_color.as_ref(),
            TraitKind::Ancestry => self.ancestry.as_ref(),
        }
    }

    pub fn loaded_traits(&self) -> Vec<TraitKind> {
        TraitKind::ALL
            .into_iter()
            .filter(|kind| self.slot(*kind).is_some())
            .collect()
    }

    /// Runs every loaded classifier on `observation`.
    pub fn predict_all(&self, observation: &Observation) -> UnifiedReport {
        let mut report = UnifiedReport::default();
        for kind in TraitKind::ALL {
            let Some(classifier) = self.slot(kind) else {
                continue;
            };
            match classifier.predict(observation) {
                Ok(prediction) => report.insert(kind, prediction),
                Err(err) => {
                    tracing::warn!(trait_kind = %kind, error = %err, "trait prediction failed");
                    report.insert_error(kind, err);
                }
            }
        }
        report
    }

    pub fn annotate_confidence(&self, report: UnifiedReport) -> UnifiedReport {
        annotate_confidence(report, &self.thresholds)
    }

    /// `predict_all` followed by `annotate_confidence`.
    pub fn run(&self, observation: &Observation) -> UnifiedReport {
        self.annotate_confidence(self.predict_all(observation))
    }
}
