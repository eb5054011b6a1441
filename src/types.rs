use serde::{Deserialize, Serialize};
use std::fmt;

/// The phenotypic traits the engine knows how to predict.
#[derive(
    clap::ValueEnum,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TraitKind {
    #[value(name = "eye_color")]
    EyeColor,
    #[value(name = "hair_color")]
    HairColor,
    #[value(name = "ancestry")]
    Ancestry,
}

/// How a trait's answer is shaped in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// One label plus the probability of that label.
    SingleLabel,
    /// The full class distribution is the answer.
    Distribution,
}

impl TraitKind {
    pub const ALL: [TraitKind; 3] =
        [TraitKind::EyeColor, TraitKind::HairColor, TraitKind::Ancestry];

    /// Key used in reports and as the label column of training tables.
    pub fn key(&self) -> &'static str {
        match self {
            TraitKind::EyeColor => "eye_color",
            TraitKind::HairColor => "hair_color",
            TraitKind::Ancestry => "ancestry",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TraitKind::EyeColor => "Eye Color",
            TraitKind::HairColor => "Hair Color",
            TraitKind::Ancestry => "Ancestry",
        }
    }

    pub fn output_shape(&self) -> OutputShape {
        match self {
            TraitKind::EyeColor | TraitKind::HairColor => OutputShape::SingleLabel,
            TraitKind::Ancestry => OutputShape::Distribution,
        }
    }

    pub fn model_file_name(&self) -> String {
        format!("{}_model.json", self.key())
    }

    pub fn training_file_name(&self) -> String {
        format!("{}_training.csv", self.key())
    }

    pub fn labels_file_name(&self) -> String {
        format!("{}_labels.csv", self.key())
    }
}

impl fmt::Display for TraitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_file_names() {
        assert_eq!(TraitKind::EyeColor.model_file_name(), "eye_color_model.json");
        assert_eq!(TraitKind::HairColor.training_file_name(), "hair_color_training.csv");
        assert_eq!(TraitKind::Ancestry.labels_file_name(), "ancestry_labels.csv");
    }

    #[test]
    fn test_only_ancestry_is_distributional() {
        let shapes: Vec<_> = TraitKind::ALL.iter().map(|t| t.output_shape()).collect();
        assert_eq!(
            shapes,
            vec![OutputShape::SingleLabel, OutputShape::SingleLabel, OutputShape::Distribution]
        );
    }

    #[test]
    fn test_serde_key_matches_report_key() {
        for kind in TraitKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
        }
    }
}
