use crate::types::TraitKind;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Predict eye color, hair color and ancestry from SNP genotypes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["demo", "predict", "train"]),
))]
pub struct Args {
    /// Run a prediction on a built-in sample genotype set
    #[arg(long)]
    pub demo: bool,

    /// Predict traits from a genotype CSV (columns: rsid, genotype; optional sample_id)
    #[arg(long, value_name = "FILE")]
    pub predict: Option<PathBuf>,

    /// Train models from <key>_training.csv / <key>_labels.csv files in DATA_DIR
    #[arg(long, value_name = "DATA_DIR")]
    pub train: Option<PathBuf>,

    /// Directory holding trained models (overrides the config file)
    #[arg(short = 'm', long = "models", value_name = "DIR")]
    pub models: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config.toml)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only use rows for this sample id from the genotype file
    #[arg(long, value_name = "ID", requires = "predict")]
    pub sample: Option<String>,

    /// Also write the report as a JSON export to this file
    #[arg(short = 'o', long = "output", value_name = "FILE", requires = "predict")]
    pub output: Option<PathBuf>,

    /// Train a single trait instead of every trait with data
    #[arg(long = "trait", value_enum, value_name = "TRAIT", requires = "train")]
    pub only_trait: Option<TraitKind>,

    /// Print the report as JSON instead of text
    #[arg(long, conflicts_with = "train")]
    pub json: bool,
}
