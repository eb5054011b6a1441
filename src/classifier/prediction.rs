use super::confidence::ConfidenceLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top class of a single-label trait and its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePrediction {
    #[serde(rename = "prediction")]
    pub label: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<ConfidenceLevel>,
}

impl SinglePrediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            confidence_level: None,
        }
    }
}

/// Per-class probabilities, keyed by class label.
pub type Distribution = BTreeMap<String, f64>;

/// Result for one trait in a unified report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitPrediction {
    SingleLabel(SinglePrediction),
    Distribution(Distribution),
}

impl TraitPrediction {
    pub fn as_single(&self) -> Option<&SinglePrediction> {
        match self {
            TraitPrediction::SingleLabel(single) => Some(single),
            TraitPrediction::Distribution(_) => None,
        }
    }

    pub fn as_distribution(&self) -> Option<&Distribution> {
        match self {
            TraitPrediction::Distribution(dist) => Some(dist),
            TraitPrediction::SingleLabel(_) => None,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_label_json_shape() {
        let mut single = SinglePrediction::new("brown", 0.87);
        single.confidence_level = Some(ConfidenceLevel::High);
        let json = serde_json::to_value(TraitPrediction::SingleLabel(single)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "prediction": "brown",
                "confidence": 0.87,
                "confidence_level": "High"
            })
        );
    }

    #[test]
    fn test_distribution_json_shape() {
        let dist: Distribution = [("African".to_string(), 0.25), ("European".to_string(), 0.75)]
            .into_iter()
            .collect();
        let prediction = TraitPrediction::Distribution(dist);
        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json, serde_json::json!({"African": 0.25, "European": 0.75}));
    }

    #[test]
    fn test_untagged_round_trip_keeps_shape() {
        let single = TraitPrediction::SingleLabel(SinglePrediction::new("red", 0.5));
        let json = serde_json::to_string(&single).unwrap();
        let back: TraitPrediction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, single);
    }
}
