//! Saving and restoring trained classifiers.
//!
//! A model file is a JSON envelope holding the forest together with the marker
//! panel and genotype-encoding digest it was trained with. Loading checks both
//! against what the caller expects before the model is usable.

use super::TraitClassifier;
use crate::error::{EngineError, Result};
use crate::forest::RandomForest;
use crate::genotype::GenotypeEncoder;
use crate::panel::MarkerPanel;
use crate::types::TraitKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    tool_version: String,
    trait_kind: TraitKind,
    encoding_version: String,
    encoding_digest: String,
    panel: MarkerPanel,
    forest: RandomForest,
}

fn check_panel(expected: &MarkerPanel, found: &MarkerPanel) -> Result<()> {
    if expected.len() != found.len() {
        return Err(EngineError::ShapeMismatch {
            expected: expected.len(),
            actual: found.len(),
        });
    }
    if expected.markers() != found.markers() {
        return Err(EngineError::PanelMismatch {
            expected: expected.markers().to_vec(),
            found: found.markers().to_vec(),
        });
    }
    Ok(())
}

impl TraitClassifier {
    /// Serializes the trained model with its panel and encoding digest.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        let forest = self.forest()?;
        let envelope = ModelEnvelope {
            format_version: MODEL_FORMAT_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            trait_kind: self.trait_kind,
            encoding_version: self.encoder.version().to_string(),
            encoding_digest: self.encoder.digest(),
            panel: self.panel.clone(),
            forest: forest.clone(),
        };
        serde_json::to_vec(&envelope).map_err(|e| EngineError::Persistence(e.to_string()))
    }

    /// Restores a classifier for `trait_kind` using its shipped marker panel.
    pub fn from_blob(
        trait_kind: TraitKind,
        blob: &[u8],
        encoder: Arc<GenotypeEncoder>,
    ) -> Result<Self> {
        Self::from_blob_with_panel(MarkerPanel::for_trait(trait_kind), blob, encoder)
    }

    /// Restores a classifier, failing if the stored panel or encoding differ
    /// from `panel` and `encoder`.
    pub fn from_blob_with_panel(
        panel: MarkerPanel,
        blob: &[u8],
        encoder: Arc<GenotypeEncoder>,
    ) -> Result<Self> {
        let envelope: ModelEnvelope =
            serde_json::from_slice(blob).map_err(|e| EngineError::Persistence(e.to_string()))?;

        if envelope.format_version != MODEL_FORMAT_VERSION {
            return Err(EngineError::Persistence(format!(
                "unsupported model format version {} (expected {})",
                envelope.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if envelope.trait_kind != panel.trait_kind() {
            return Err(EngineError::TraitMismatch {
                expected: panel.trait_kind(),
                found: envelope.trait_kind,
            });
        }
        check_panel(&panel, &envelope.panel)?;

        let digest = encoder.digest();
        if envelope.encoding_digest != digest {
            return Err(EngineError::EncodingMismatch {
                expected: format!("{} ({})", envelope.encoding_version, envelope.encoding_digest),
                found: format!("{} ({})", encoder.version(), digest),
            });
        }

        envelope
            .forest
            .validate()
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        tracing::debug!(
            trait_kind = %panel.trait_kind(),
            trees = envelope.forest.n_trees(),
            tool_version = %envelope.tool_version,
            "model restored"
        );
        TraitClassifier::with_panel(panel, encoder).with_model(envelope.forest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let blob = self.to_blob()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| EngineError::Persistence(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(path, blob)
            .map_err(|e| EngineError::Persistence(format!("{}: {}", path.display(), e)))?;
        tracing::info!(trait_kind = %self.trait_kind, path = %path.display(), "model saved");
        Ok(())
    }

    pub fn load(trait_kind: TraitKind, path: &Path, encoder: Arc<GenotypeEncoder>) -> Result<Self> {
        let blob = fs::read(path)
            .map_err(|e| EngineError::Persistence(format!("{}: {}", path.display(), e)))?;
        Self::from_blob(trait_kind, &blob, encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureMatrix;
    use crate::forest::ForestParams;
    use crate::observation::Observation;

    fn trained(kind: TraitKind) -> TraitClassifier {
        let panel = MarkerPanel::for_trait(kind);
        let mut x = FeatureMatrix::new(panel.len());
        let mut y = Vec::new();
        for i in 0..30u8 {
            let mut row = vec![0; panel.len()];
            row[0] = i % 3;
            row[1] = (i / 3) % 3;
            x.push(row).unwrap();
            y.push(format!("class_{}", i % 3));
        }
        let mut clf = TraitClassifier::new(kind, Arc::new(GenotypeEncoder::new()));
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };
        clf.train(&x, &y, &params).unwrap();
        clf
    }

    #[test]
    fn test_blob_round_trip_reproduces_predictions() {
        let clf = trained(TraitKind::Ancestry);
        let blob = clf.to_blob().unwrap();
        let encoder = Arc::new(GenotypeEncoder::new());
        let restored = TraitClassifier::from_blob(TraitKind::Ancestry, &blob, encoder).unwrap();

        let obs: Observation = [("rs3827760", "AG"), ("rs2814778", "GG")].into_iter().collect();
        assert_eq!(
            clf.predict_distribution(&obs).unwrap(),
            restored.predict_distribution(&obs).unwrap()
        );
    }

    #[test]
    fn test_unloaded_classifier_cannot_be_saved() {
        let clf = TraitClassifier::new(TraitKind::EyeColor, Arc::new(GenotypeEncoder::new()));
        assert_eq!(clf.to_blob().unwrap_err(), EngineError::ModelNotLoaded(TraitKind::EyeColor));
    }

    #[test]
    fn test_reordered_panel_is_rejected() {
        let blob = trained(TraitKind::HairColor).to_blob().unwrap();
        let mut markers: Vec<String> =
            MarkerPanel::for_trait(TraitKind::HairColor).markers().to_vec();
        markers.swap(0, 1);
        let reordered = MarkerPanel::new(TraitKind::HairColor, markers);

        let encoder = Arc::new(GenotypeEncoder::new());
        let err = TraitClassifier::from_blob_with_panel(reordered, &blob, encoder).unwrap_err();
        assert!(matches!(err, EngineError::PanelMismatch { .. }));
    }

    #[test]
    fn test_shorter_panel_is_a_shape_mismatch() {
        let blob = trained(TraitKind::EyeColor).to_blob().unwrap();
        let short = MarkerPanel::new(TraitKind::EyeColor, ["rs12913832", "rs1800407"]);
        let encoder = Arc::new(GenotypeEncoder::new());
        let err = TraitClassifier::from_blob_with_panel(short, &blob, encoder).unwrap_err();
        assert_eq!(err, EngineError::ShapeMismatch { expected: 2, actual: 6 });
    }

    #[test]
    fn test_other_trait_model_is_rejected() {
        let blob = trained(TraitKind::HairColor).to_blob().unwrap();
        let encoder = Arc::new(GenotypeEncoder::new());
        let err = TraitClassifier::from_blob(TraitKind::Ancestry, &blob, encoder).unwrap_err();
        assert_eq!(
            err,
            EngineError::TraitMismatch {
                expected: TraitKind::Ancestry,
                found: TraitKind::HairColor
            }
        );
    }

    #[test]
    fn test_changed_encoding_is_rejected() {
        let blob = trained(TraitKind::EyeColor).to_blob().unwrap();
        let other = Arc::new(GenotypeEncoder::new().with_default_value(1).unwrap());
        let err = TraitClassifier::from_blob(TraitKind::EyeColor, &blob, other).unwrap_err();
        assert!(matches!(err, EngineError::EncodingMismatch { .. }));
    }

    /// Serializes a trained model, applies `edit` to the JSON and restores it.
    fn restore_edited(edit: impl FnOnce(&mut serde_json::Value)) -> Result<TraitClassifier> {
        let blob = trained(TraitKind::EyeColor).to_blob().unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        edit(&mut json["forest"]);
        let edited = serde_json::to_vec(&json).unwrap();
        TraitClassifier::from_blob(TraitKind::EyeColor, &edited, Arc::new(GenotypeEncoder::new()))
    }

    fn first_split(forest: &mut serde_json::Value) -> &mut serde_json::Value {
        forest["trees"][0]["nodes"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|node| node.get("Split").is_some())
            .map(|node| &mut node["Split"])
            .unwrap()
    }

    fn assert_malformed(result: Result<TraitClassifier>) {
        match result {
            Err(EngineError::Persistence(msg)) => {
                assert!(msg.contains("malformed forest"), "{}", msg)
            }
            other => panic!("expected a malformed-forest error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_untouched_blob_still_loads() {
        assert!(restore_edited(|_| {}).is_ok());
    }

    #[test]
    fn test_forest_without_trees_is_rejected() {
        assert_malformed(restore_edited(|forest| forest["trees"] = serde_json::json!([])));
    }

    #[test]
    fn test_forest_without_classes_is_rejected() {
        assert_malformed(restore_edited(|forest| forest["classes"] = serde_json::json!([])));
    }

    #[test]
    fn test_split_on_missing_feature_is_rejected() {
        assert_malformed(restore_edited(|forest| {
            first_split(forest)["feature"] = serde_json::json!(99);
        }));
    }

    #[test]
    fn test_self_referencing_split_is_rejected() {
        assert_malformed(restore_edited(|forest| {
            let nodes = forest["trees"][0]["nodes"].as_array().unwrap();
            let split_at = nodes.iter().position(|n| n.get("Split").is_some()).unwrap();
            first_split(forest)["left"] = serde_json::json!(split_at);
        }));
    }

    #[test]
    fn test_dangling_child_is_rejected() {
        assert_malformed(restore_edited(|forest| {
            first_split(forest)["right"] = serde_json::json!(100_000);
        }));
    }

    #[test]
    fn test_short_leaf_distribution_is_rejected() {
        assert_malformed(restore_edited(|forest| {
            let leaf = forest["trees"][0]["nodes"]
                .as_array_mut()
                .unwrap()
                .iter_mut()
                .find(|node| node.get("Leaf").is_some())
                .unwrap();
            leaf["Leaf"]["distribution"] = serde_json::json!([1.0]);
        }));
    }

    #[test]
    fn test_garbage_blob() {
        let encoder = Arc::new(GenotypeEncoder::new());
        let err =
            TraitClassifier::from_blob(TraitKind::EyeColor, b"not json", encoder).unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));
    }
}
