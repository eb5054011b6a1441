use crate::genotype::ENCODING_TABLE_VERSION;
use crate::pipeline::UnifiedReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fs;
use std::path::Path;

pub const RECORD_TYPE: &str = "genomics.traits.prediction";
pub const EXPORT_VERSION: &str = "1.0";

/// Root structure written by `--predict --output`.
#[derive(Debug, Serialize)]
pub struct ReportExport<'a> {
    #[serde(rename = "$type")]
    pub record_type: String,

    pub version: String,
    #[serde(serialize_with = "serialize_datetime")]
    pub created_at: DateTime<Utc>,
    pub tool_version: String,
    pub encoding_version: String,

    pub metadata: ExportMetadata,

    pub traits: &'a UnifiedReport,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExportMetadata {
    pub sample_id: Option<String>,
    /// Input file the observation was read from.
    pub source: Option<String>,
}

fn serialize_datetime<S>(
    date: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339())
}

impl<'a> ReportExport<'a> {
    pub fn new(traits: &'a UnifiedReport, metadata: ExportMetadata) -> Self {
        Self {
            record_type: RECORD_TYPE.to_string(),
            version: EXPORT_VERSION.to_string(),
            created_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            encoding_version: ENCODING_TABLE_VERSION.to_string(),
            metadata,
            traits,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory {}", parent.display())
            })?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_envelope_fields() {
        let report = UnifiedReport::default();
        let export = ReportExport::new(
            &report,
            ExportMetadata {
                sample_id: Some("SAMPLE_001".to_string()),
                source: Some("genotypes.csv".to_string()),
            },
        );
        let json: Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();

        assert_eq!(json["$type"], RECORD_TYPE);
        assert_eq!(json["encoding_version"], "v1");
        assert_eq!(json["metadata"]["sample_id"], "SAMPLE_001");
        assert_eq!(json["traits"], serde_json::json!({}));
    }

    #[test]
    fn test_created_at_is_rfc3339() {
        let report = UnifiedReport::default();
        let export = ReportExport::new(&report, ExportMetadata::default());
        let json: Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        let stamp = DateTime::parse_from_rfc3339(json["created_at"].as_str().unwrap()).unwrap();
        assert_eq!(stamp.timestamp(), export.created_at.timestamp());
    }

    #[test]
    fn test_write_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = UnifiedReport::default();
        ReportExport::new(&report, ExportMetadata::default())
            .write_to(&path)
            .unwrap();
        assert!(path.exists());
    }
}
