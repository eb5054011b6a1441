use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Genotype calls for one subject, keyed by marker id. Need not be complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    genotypes: HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
struct GenotypeRecord {
    #[serde(default)]
    sample_id: Option<String>,
    #[serde(alias = "snp", alias = "marker")]
    rsid: String,
    genotype: String,
}

impl Observation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, marker: impl Into<String>, genotype: impl Into<String>) {
        self.genotypes.insert(marker.into(), genotype.into());
    }

    pub fn get(&self, marker: &str) -> Option<&str> {
        self.genotypes.get(marker).map(String::as_str)
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.genotypes.contains_key(marker)
    }

    pub fn len(&self) -> usize {
        self.genotypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genotypes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.genotypes.iter().map(|(m, g)| (m.as_str(), g.as_str()))
    }

    /// Reads an observation from CSV with `rsid` and `genotype` columns.
    ///
    /// Other columns are ignored. When `sample_id` is given, only rows for
    /// that sample are kept; later rows win on duplicate markers.
    pub fn from_csv_reader<R: Read>(reader: R, sample_id: Option<&str>) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut observation = Observation::new();
        for (line, record) in csv_reader.deserialize::<GenotypeRecord>().enumerate() {
            let record = record.with_context(|| format!("Malformed genotype row {}", line + 2))?;

            if let Some(wanted) = sample_id {
                if record.sample_id.as_deref() != Some(wanted) {
                    continue;
                }
            }
            observation.insert(record.rsid, record.genotype);
        }

        if let Some(wanted) = sample_id {
            if observation.is_empty() {
                anyhow::bail!("No genotype rows found for sample '{}'", wanted);
            }
        }

        Ok(observation)
    }

    pub fn from_csv_path(path: &Path, sample_id: Option<&str>) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open genotype file {}", path.display()))?;
        Self::from_csv_reader(file, sample_id)
            .with_context(|| format!("Failed to read genotype file {}", path.display()))
    }
}

impl<K, V> FromIterator<(K, V)> for Observation
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut observation = Observation::new();
        for (marker, genotype) in iter {
            observation.insert(marker, genotype);
        }
        observation
    }
}
