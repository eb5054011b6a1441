pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod features;
pub mod forest;
pub mod genotype;
pub mod observation;
pub mod panel;
pub mod pipeline;
pub mod types;
mod utils;

// Re-export main API
pub use classifier::{
    ConfidenceLevel, ConfidenceThresholds, Distribution, SinglePrediction, TraitClassifier,
    TraitPrediction,
};
pub use error::{EngineError, Result};
pub use features::{FeatureMatrix, FeatureVector};
pub use genotype::{GenotypeEncoder, UnrecognizedPolicy};
pub use observation::Observation;
pub use panel::MarkerPanel;
pub use pipeline::{annotate_confidence, UnifiedPipeline, UnifiedReport};
pub use types::{OutputShape, TraitKind};
