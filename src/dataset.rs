//! Training-set assembly from a genotype table and a label table.
//!
//! A data directory holds, per trait, `<key>_training.csv` with one row per
//! (sample, marker) call and `<key>_labels.csv` with one row per sample. The
//! feature matrix is laid out in label-file order.

use crate::error::EngineError;
use crate::features::{FeatureMatrix, FeatureVector};
use crate::genotype::GenotypeEncoder;
use crate::observation::Observation;
use crate::panel::MarkerPanel;
use crate::types::TraitKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Deserialize)]
struct CallRecord {
    sample_id: String,
    #[serde(alias = "snp", alias = "marker")]
    rsid: String,
    genotype: String,
}

/// Encoded rows and their labels for one trait.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub trait_kind: TraitKind,
    pub sample_ids: Vec<String>,
    pub features: FeatureMatrix,
    pub labels: Vec<String>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of rows per label, sorted by label.
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> =
            counts.into_iter().map(|(l, n)| (l.to_string(), n)).collect();
        counts.sort();
        counts
    }
}

/// Whether both training files for `trait_kind` exist in `data_dir`.
pub fn has_training_files(data_dir: &Path, trait_kind: TraitKind) -> bool {
    data_dir.join(trait_kind.training_file_name()).is_file()
        && data_dir.join(trait_kind.labels_file_name()).is_file()
}

/// Groups genotype calls by sample. The first call for a marker wins.
fn read_calls<R: Read>(reader: R) -> Result<HashMap<String, Observation>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut by_sample: HashMap<String, Observation> = HashMap::new();
    for (line, record) in csv_reader.deserialize::<CallRecord>().enumerate() {
        let record = record.with_context(|| format!("Malformed training row {}", line + 2))?;
        let observation = by_sample.entry(record.sample_id).or_default();
        if !observation.contains(&record.rsid) {
            observation.insert(record.rsid, record.genotype);
        }
    }
    Ok(by_sample)
}

fn read_labels<R: Read>(reader: R, trait_kind: TraitKind) -> Result<Vec<(String, String)>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let sample_col = column("sample_id").ok_or_else(|| {
        EngineError::InvalidTrainingData("labels table has no 'sample_id' column".to_string())
    })?;
    let label_col = column(trait_kind.key()).ok_or_else(|| {
        EngineError::InvalidTrainingData(format!(
            "labels table has no '{}' column",
            trait_kind.key()
        ))
    })?;

    let mut labels = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed label row {}", line + 2))?;
        let sample = record.get(sample_col).unwrap_or_default();
        let label = record.get(label_col).unwrap_or_default();
        if sample.is_empty() || label.is_empty() {
            return Err(EngineError::InvalidTrainingData(format!(
                "label row {} is missing a sample id or a {} value",
                line + 2,
                trait_kind.key()
            ))
            .into());
        }
        labels.push((sample.to_string(), label.to_string()));
    }
    Ok(labels)
}

/// Builds a training set from in-memory genotype and label tables.
///
/// Samples with no calls for a panel marker get the encoder's default there.
pub fn from_readers<R1: Read, R2: Read>(
    trait_kind: TraitKind,
    calls: R1,
    labels: R2,
    encoder: &GenotypeEncoder,
) -> Result<TrainingSet> {
    let panel = MarkerPanel::for_trait(trait_kind);
    let calls = read_calls(calls)?;
    let labels = read_labels(labels, trait_kind)?;
    if labels.is_empty() {
        return Err(EngineError::InvalidTrainingData(format!(
            "no labelled samples for {}",
            trait_kind
        ))
        .into());
    }

    let empty = Observation::new();
    let mut features = FeatureMatrix::new(panel.len());
    let mut sample_ids = Vec::with_capacity(labels.len());
    let mut label_values = Vec::with_capacity(labels.len());
    let mut without_calls = 0usize;

    for (sample, label) in labels {
        let observation = calls.get(&sample).unwrap_or_else(|| {
            without_calls += 1;
            &empty
        });
        let row = FeatureVector::build(&panel, observation, encoder)
            .with_context(|| format!("Failed to encode sample {}", sample))?;
        features.push(row)?;
        sample_ids.push(sample);
        label_values.push(label);
    }

    if without_calls > 0 {
        tracing::warn!(
            trait_kind = %trait_kind,
            samples = without_calls,
            "labelled samples without genotype calls encoded with default values"
        );
    }

    Ok(TrainingSet {
        trait_kind,
        sample_ids,
        features,
        labels: label_values,
    })
}

/// Loads `<key>_training.csv` and `<key>_labels.csv` from `data_dir`.
pub fn load(
    data_dir: &Path,
    trait_kind: TraitKind,
    encoder: &GenotypeEncoder,
) -> Result<TrainingSet> {
    let calls_path = data_dir.join(trait_kind.training_file_name());
    let labels_path = data_dir.join(trait_kind.labels_file_name());

    let calls = std::fs::File::open(&calls_path)
        .with_context(|| format!("Failed to open {}", calls_path.display()))?;
    let labels = std::fs::File::open(&labels_path)
        .with_context(|| format!("Failed to open {}", labels_path.display()))?;

    let set = from_readers(trait_kind, calls, labels, encoder)
        .with_context(|| format!("Failed to assemble {} training data", trait_kind))?;
    tracing::info!(trait_kind = %trait_kind, samples = set.len(), "training data loaded");
    Ok(set)
}
