use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Coarse bucket for a classifier's top-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::High => "High",
        };
        f.write_str(name)
    }
}

/// Bucket boundaries: above `high` is High, above `medium` is Medium, the rest Low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: HIGH_CONFIDENCE_THRESHOLD,
            medium: MEDIUM_CONFIDENCE_THRESHOLD,
        }
    }
}

impl ConfidenceThresholds {
    pub fn new(high: f64, medium: f64) -> Result<Self> {
        let thresholds = Self { high, medium };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.medium)
            || !(0.0..=1.0).contains(&self.high)
            || self.medium > self.high
        {
            return Err(EngineError::InvalidConfiguration(format!(
                "confidence thresholds must satisfy 0 <= medium <= high <= 1 (medium={}, high={})",
                self.medium, self.high
            )));
        }
        Ok(())
    }

    pub fn classify(&self, confidence: f64) -> ConfidenceLevel {
        if confidence > self.high {
            ConfidenceLevel::High
        } else if confidence > self.medium {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Confidence level under the standard 0.8 / 0.6 thresholds.
pub fn level(confidence: f64) -> ConfidenceLevel {
    ConfidenceThresholds::default().classify(confidence)
}
