pub mod demo;
pub mod predict;
pub mod train;

use crate::classifier::TraitPrediction;
use crate::config::Config;
use crate::pipeline::{UnifiedPipeline, UnifiedReport};
use crate::types::TraitKind;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

const RULE_WIDTH: usize = 60;

/// Settings shared by every mode after the config file and CLI overrides are merged.
pub struct RunContext {
    pub config: Config,
    pub model_dir: PathBuf,
}

impl RunContext {
    pub fn new(config: Config, model_dir_override: Option<PathBuf>) -> Self {
        let model_dir = model_dir_override.unwrap_or_else(|| config.model_dir());
        Self { config, model_dir }
    }

    /// Builds a pipeline from whatever models exist in the model directory.
    pub fn pipeline(&self) -> Result<UnifiedPipeline> {
        let encoder = Arc::new(self.config.encoder()?);
        let pipeline = UnifiedPipeline::from_model_dir(&self.model_dir, encoder)?
            .with_thresholds(self.config.confidence);
        if pipeline.loaded_traits().is_empty() {
            anyhow::bail!(
                "No trained models found in {}. Run with --train <data_dir> first.",
                self.model_dir.display()
            );
        }
        Ok(pipeline)
    }
}

pub(crate) fn print_header(title: &str) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{}", title);
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Human-readable rendering of an annotated report.
pub(crate) fn render_report(report: &UnifiedReport) -> String {
    let mut lines = Vec::new();
    for (kind, prediction) in report.traits() {
        match prediction {
            TraitPrediction::SingleLabel(single) => {
                let level = single
                    .confidence_level
                    .map(|l| format!(" - {}", l))
                    .unwrap_or_default();
                lines.push(format!(
                    "  {}: {} ({:.1}%{})",
                    kind.display_name(),
                    single.label,
                    single.confidence * 100.0,
                    level
                ));
            }
            TraitPrediction::Distribution(dist) => {
                lines.push(format!("  {}:", kind.display_name()));
                let mut ranked: Vec<(&String, &f64)> = dist.iter().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
                for (label, p) in ranked {
                    lines.push(format!("      {}: {:.1}%", label, p * 100.0));
                }
            }
        }
    }
    for (kind, err) in report.errors() {
        lines.push(format!("  {}: failed ({})", kind.display_name(), err));
    }
    let missing: Vec<&str> = TraitKind::ALL
        .iter()
        .filter(|k| report.get(**k).is_none() && report.error(**k).is_none())
        .map(|k| k.display_name())
        .collect();
    if !missing.is_empty() {
        lines.push(format!("  (no model loaded for: {})", missing.join(", ")));
    }
    lines.join("\n")
}

pub(crate) fn print_report(report: &UnifiedReport) {
    println!("\nPredictions:");
    println!("{}", render_report(report));
    println!("{}", "=".repeat(RULE_WIDTH));
}

pub(crate) fn print_json(report: &UnifiedReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
