use super::{print_header, RunContext};
use crate::classifier::{TraitClassifier, TrainingReport};
use crate::dataset;
use crate::types::TraitKind;
use crate::utils::progress_bar_builder::{ProgressBarBuilder, TRAINING_TEMPLATE};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Trains every trait whose training files are present in `data_dir` and
/// saves the models into the context's model directory.
pub fn run(ctx: &RunContext, data_dir: &Path, only: Option<TraitKind>) -> Result<()> {
    if !data_dir.is_dir() {
        anyhow::bail!("Training data directory {} does not exist", data_dir.display());
    }

    let encoder = Arc::new(ctx.config.encoder()?);
    let params = ctx.config.forest.params();
    let test_fraction = ctx.config.forest.test_fraction;

    let kinds: Vec<TraitKind> = TraitKind::ALL
        .into_iter()
        .filter(|k| only.map_or(true, |o| o == *k))
        .collect();

    print_header("Training Trait Models");
    let mut trained = 0usize;
    for kind in kinds {
        if !dataset::has_training_files(data_dir, kind) {
            println!(
                "\nSkipping {}: {} / {} not found",
                kind.display_name(),
                kind.training_file_name(),
                kind.labels_file_name()
            );
            continue;
        }

        let set = dataset::load(data_dir, kind, &encoder)?;
        println!("\n{} ({} samples)", kind.display_name(), set.len());
        for (label, count) in set.class_counts() {
            println!("  {}: {}", label, count);
        }

        let progress = ProgressBarBuilder::new(kind.key())
            .with_template(TRAINING_TEMPLATE)
            .with_length(params.n_estimators as u64)
            .with_tick()
            .build()?;

        let mut classifier = TraitClassifier::new(kind, Arc::clone(&encoder));
        let report = classifier
            .train_with_holdout(&set.features, &set.labels, &params, test_fraction, || {
                progress.inc(1)
            })
            .with_context(|| format!("Failed to train {} model", kind))?;
        progress.finish_with_message("done");

        print_training_report(&report);

        let path = ctx.model_dir.join(kind.model_file_name());
        classifier
            .save(&path)
            .with_context(|| format!("Failed to save {} model", kind))?;
        println!("  Saved to {}", path.display());
        trained += 1;
    }

    if trained == 0 {
        anyhow::bail!("No training data found in {}", data_dir.display());
    }
    println!("\nTrained {} model(s) into {}", trained, ctx.model_dir.display());
    Ok(())
}

fn print_training_report(report: &TrainingReport) {
    println!(
        "  Train: {:.2}% on {} samples",
        report.train_accuracy * 100.0,
        report.n_train
    );
    match &report.test {
        Some(test) => {
            println!("  Test:  {:.2}% on {} samples", test.accuracy * 100.0, test.n_samples);
            println!("  Confusion matrix (held out):");
            for line in test.confusion.to_string().lines() {
                println!("    {}", line);
            }
        }
        None => println!("  Test:  no rows held out"),
    }
}
