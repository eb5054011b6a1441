use super::{print_header, print_json, print_report, RunContext};
use crate::export::{ExportMetadata, ReportExport};
use crate::observation::Observation;
use anyhow::Result;
use std::path::Path;

pub fn run(
    ctx: &RunContext,
    input: &Path,
    sample_id: Option<&str>,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let observation = Observation::from_csv_path(input, sample_id)?;
    tracing::info!(markers = observation.len(), input = %input.display(), "observation loaded");

    let pipeline = ctx.pipeline()?;
    let report = pipeline.run(&observation);

    if json {
        print_json(&report)?;
    } else {
        print_header(&format!("Prediction for {}", sample_id.unwrap_or("sample")));
        println!("\nLoaded {} genotypes from {}", observation.len(), input.display());
        print_report(&report);
    }

    if let Some(output) = output {
        let metadata = ExportMetadata {
            sample_id: sample_id.map(str::to_string),
            source: Some(input.display().to_string()),
        };
        ReportExport::new(&report, metadata).write_to(output)?;
        if !json {
            println!("Report written to {}", output.display());
        }
    }
    Ok(())
}
