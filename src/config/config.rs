use crate::classifier::{ConfidenceThresholds, DEFAULT_TEST_FRACTION};
use crate::error::EngineError;
use crate::forest::ForestParams;
use crate::genotype::{GenotypeEncoder, UnrecognizedPolicy, DEFAULT_ORDINAL};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "traitpredictor";
const APPLICATION: &str = "trait-predictor";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where trained models are read from and written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,

    #[serde(default = "default_genotype_value")]
    pub default_genotype_value: u8,

    #[serde(default)]
    pub unrecognized_genotype: UnrecognizedPolicy,

    #[serde(default)]
    pub confidence: ConfidenceThresholds,

    #[serde(default)]
    pub forest: ForestSettings,
}

/// `[forest]` table: learner hyper-parameters plus the held-out fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    pub n_estimators: usize,
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_features: Option<usize>,
    pub test_fraction: f64,
}

fn default_genotype_value() -> u8 {
    DEFAULT_ORDINAL
}

impl Default for ForestSettings {
    fn default() -> Self {
        let params = ForestParams::default();
        Self {
            n_estimators: params.n_estimators,
            seed: params.seed,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: params.max_features,
            test_fraction: DEFAULT_TEST_FRACTION,
        }
    }
}

impl ForestSettings {
    pub fn params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            seed: self.seed,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: None,
            default_genotype_value: default_genotype_value(),
            unrecognized_genotype: UnrecognizedPolicy::default(),
            confidence: ConfidenceThresholds::default(),
            forest: ForestSettings::default(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

impl Config {
    /// Path of the per-user config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Reads the per-user config file, falling back to defaults when it is
    /// absent or unreadable.
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                match Self::from_path(&config_path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            error = %format!("{:#}", e),
                            "ignoring config file"
                        )
                    }
                }
            }
        }
        Config::default()
    }

    /// Reads an explicitly given config file. Unlike [`load`](Self::load),
    /// a missing or malformed file is an error.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.confidence.validate()?;
        if !(0.0..1.0).contains(&self.forest.test_fraction) {
            return Err(EngineError::InvalidConfiguration(format!(
                "forest.test_fraction must be in [0, 1), got {}",
                self.forest.test_fraction
            )));
        }
        if self.forest.n_estimators == 0 {
            return Err(EngineError::InvalidConfiguration(
                "forest.n_estimators must be at least 1".to_string(),
            ));
        }
        self.encoder().map(|_| ())
    }

    /// Configured model directory, or `models/` under the per-user data directory.
    pub fn model_dir(&self) -> PathBuf {
        if let Some(dir) = &self.model_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("models"))
            .unwrap_or_else(|| PathBuf::from("models"))
    }

    pub fn encoder(&self) -> Result<GenotypeEncoder, EngineError> {
        Ok(GenotypeEncoder::new()
            .with_default_value(self.default_genotype_value)?
            .with_policy(self.unrecognized_genotype))
    }
}
