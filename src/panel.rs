use crate::types::TraitKind;
use serde::{Deserialize, Serialize};

pub const EYE_COLOR_MARKERS: [&str; 6] = [
    "rs12913832", // HERC2
    "rs1800407",  // OCA2
    "rs12896399", // SLC24A4
    "rs16891982", // SLC45A2
    "rs1393350",  // TYR
    "rs12203592", // IRF4
];

pub const HAIR_COLOR_MARKERS: [&str; 5] = [
    "rs1805007", // MC1R
    "rs1805008", // MC1R
    "rs1805009", // MC1R
    "rs1042602", // TYR
    "rs2228479", // OCA2
];

pub const ANCESTRY_MARKERS: [&str; 5] = [
    "rs3827760",  // EDAR
    "rs2814778",  // DARC
    "rs16891982", // SLC45A2, shared with eye color
    "rs1426654",  // SLC24A5
    "rs12913832", // HERC2, shared with eye color
];

/// Ordered marker list a trait model is trained against.
///
/// Position `i` in the panel is feature `i` of every feature vector built for
/// the trait, so the order must not change between training and inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPanel {
    trait_kind: TraitKind,
    markers: Vec<String>,
}

impl MarkerPanel {
    pub fn new<I, S>(trait_kind: TraitKind, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trait_kind,
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// The panel shipped for `trait_kind`.
    pub fn for_trait(trait_kind: TraitKind) -> Self {
        match trait_kind {
            TraitKind::EyeColor => Self::new(trait_kind, EYE_COLOR_MARKERS),
            TraitKind::HairColor => Self::new(trait_kind, HAIR_COLOR_MARKERS),
            TraitKind::Ancestry => Self::new(trait_kind, ANCESTRY_MARKERS),
        }
    }

    pub fn trait_kind(&self) -> TraitKind {
        self.trait_kind
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl<'a> IntoIterator for &'a MarkerPanel {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.iter()
    }
}
