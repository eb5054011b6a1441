//! Genotype to ordinal encoding.
//!
//! A genotype is an unordered pair of alleles written as two letters ("AG" and
//! "GA" are the same genotype). The encoder maps it onto the number of copies
//! of the variant allele: 0 for homozygous reference, 1 for heterozygous and 2
//! for homozygous alternate.
//!
//! One table is shared by every marker panel. The reference/alternate
//! assignment is global, not per marker.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const ENCODING_TABLE_VERSION: &str = "v1";

/// Ordinal given to absent markers and unrecognized genotypes unless configured otherwise.
pub const DEFAULT_ORDINAL: u8 = 0;

pub const MAX_ORDINAL: u8 = 2;

// One orientation per pair; the reverse orientation is derived.
const CANONICAL_GENOTYPES: [(&str, u8); 10] = [
    ("AA", 0),
    ("AG", 1),
    ("GG", 2),
    ("AC", 1),
    ("CC", 2),
    ("AT", 1),
    ("TT", 2),
    ("CT", 1),
    ("GT", 1),
    ("CG", 2),
];

/// What to do with a genotype string that is present but not in the table.
#[derive(
    clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedPolicy {
    /// Fall back to the default ordinal without comment.
    #[default]
    Silent,
    /// Fall back to the default ordinal and log a warning.
    Warn,
    /// Refuse to build a feature vector.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeEncoder {
    table: BTreeMap<String, u8>,
    default_value: u8,
    policy: UnrecognizedPolicy,
}

impl Default for GenotypeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GenotypeEncoder {
    pub fn new() -> Self {
        let mut table = BTreeMap::new();
        for (genotype, ordinal) in CANONICAL_GENOTYPES {
            let reversed: String = genotype.chars().rev().collect();
            table.insert(genotype.to_string(), ordinal);
            table.insert(reversed, ordinal);
        }

        Self {
            table,
            default_value: DEFAULT_ORDINAL,
            policy: UnrecognizedPolicy::default(),
        }
    }

    /// Sets the fallback ordinal. Values above 2 would leave the feature range.
    pub fn with_default_value(mut self, value: u8) -> Result<Self> {
        if value > MAX_ORDINAL {
            return Err(EngineError::InvalidConfiguration(format!(
                "default genotype ordinal must be between 0 and {}, got {}",
                MAX_ORDINAL, value
            )));
        }
        self.default_value = value;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: UnrecognizedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn default_value(&self) -> u8 {
        self.default_value
    }

    pub fn policy(&self) -> UnrecognizedPolicy {
        self.policy
    }

    pub fn version(&self) -> &'static str {
        ENCODING_TABLE_VERSION
    }

    fn normalize(genotype: &str) -> String {
        genotype.trim().to_ascii_uppercase()
    }

    fn lookup(&self, genotype: &str) -> Option<u8> {
        self.table.get(&Self::normalize(genotype)).copied()
    }

    pub fn is_recognized(&self, genotype: &str) -> bool {
        self.lookup(genotype).is_some()
    }

    /// Encodes a genotype. Never fails: unknown strings map to the default ordinal.
    pub fn encode(&self, genotype: &str) -> u8 {
        self.lookup(genotype).unwrap_or(self.default_value)
    }

    /// Encodes the genotype observed at `marker`, honouring the unrecognized-genotype policy.
    ///
    /// An absent marker is missing data rather than a malformed call and always
    /// encodes to the default ordinal.
    pub fn encode_marker(&self, marker: &str, genotype: Option<&str>) -> Result<u8> {
        let Some(genotype) = genotype else {
            return Ok(self.default_value);
        };

        match self.lookup(genotype) {
            Some(ordinal) => Ok(ordinal),
            None => match self.policy {
                UnrecognizedPolicy::Silent => Ok(self.default_value),
                UnrecognizedPolicy::Warn => {
                    tracing::warn!(
                        marker,
                        genotype,
                        fallback = self.default_value,
                        "unrecognized genotype, using default ordinal"
                    );
                    Ok(self.default_value)
                }
                UnrecognizedPolicy::Reject => Err(EngineError::UnrecognizedGenotype {
                    marker: marker.to_string(),
                    genotype: genotype.to_string(),
                }),
            },
        }
    }

    /// SHA-256 over the table version, every entry and the default ordinal.
    ///
    /// Stored next to trained models. The unrecognized-genotype policy is not
    /// part of it.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(ENCODING_TABLE_VERSION.as_bytes());
        for (genotype, ordinal) in &self.table {
            hasher.update(genotype.as_bytes());
            hasher.update([*ordinal]);
        }
        hasher.update([self.default_value]);
        format!("{:x}", hasher.finalize())
    }
}
