use crate::forest::ForestError;
use crate::types::TraitKind;
use thiserror::Error;

/// Errors raised by the inference engine.
///
/// Every variant is scoped to a single trait: the unified pipeline records
/// them per trait and keeps going with the remaining classifiers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no trained model is loaded for {0}")]
    ModelNotLoaded(TraitKind),

    #[error("feature vector has {actual} entries but the classifier expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error(
        "marker panel {found:?} does not match the panel the model was trained on {expected:?}"
    )]
    PanelMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("model was trained with genotype encoding {expected}, current encoding is {found}")]
    EncodingMismatch { expected: String, found: String },

    #[error("model file holds a {found} model, expected {expected}")]
    TraitMismatch { expected: TraitKind, found: TraitKind },

    #[error("unrecognized genotype '{genotype}' at {marker}")]
    UnrecognizedGenotype { marker: String, genotype: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid training data: {0}")]
    InvalidTrainingData(String),

    #[error(transparent)]
    Forest(#[from] ForestError),

    #[error("model persistence failed: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
