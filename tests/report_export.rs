use std::sync::Arc;
use trait_predictor::export::{ExportMetadata, ReportExport};
use trait_predictor::features::FeatureMatrix;
use trait_predictor::forest::ForestParams;
use trait_predictor::{GenotypeEncoder, Observation, TraitClassifier, TraitKind, UnifiedPipeline};

// Reads a multi-sample genotype CSV the way `--predict FILE --sample ID`
// does, runs an ancestry-only pipeline and writes the JSON export.

const GENOTYPE_FILE: &str = "sample_id,rsid,chromosome,position,genotype\n\
    SAMPLE_000,rs3827760,2,109513601,GG\n\
    SAMPLE_000,rs2814778,1,159174683,AA\n\
    SAMPLE_001,rs3827760,2,109513601,AA\n\
    SAMPLE_001,rs2814778,1,159174683,GG\n\
    SAMPLE_001,rs1426654,15,48426484,AA\n";

fn ancestry_classifier() -> TraitClassifier {
    let mut x = FeatureMatrix::new(5);
    let mut y = Vec::new();
    for i in 0..45u8 {
        x.push(vec![i % 3, (i / 3) % 3, 0, (i / 9) % 3, 0]).unwrap();
        y.push(["African", "East_Asian", "European"][(i % 3) as usize].to_string());
    }
    let mut clf = TraitClassifier::new(TraitKind::Ancestry, Arc::new(GenotypeEncoder::new()));
    let params = ForestParams {
        n_estimators: 15,
        ..ForestParams::default()
    };
    clf.train(&x, &y, &params).unwrap();
    clf
}

#[test]
fn sample_rows_are_selected_from_a_shared_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("genotypes.csv");
    std::fs::write(&input, GENOTYPE_FILE).unwrap();

    let obs = Observation::from_csv_path(&input, Some("SAMPLE_001")).unwrap();
    assert_eq!(obs.len(), 3);
    assert_eq!(obs.get("rs3827760"), Some("AA"));

    assert!(Observation::from_csv_path(&input, Some("SAMPLE_404")).is_err());
    assert!(Observation::from_csv_path(&dir.path().join("missing.csv"), None).is_err());
}

#[test]
fn export_holds_metadata_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("genotypes.csv");
    std::fs::write(&input, GENOTYPE_FILE).unwrap();
    let obs = Observation::from_csv_path(&input, Some("SAMPLE_001")).unwrap();

    let pipeline = UnifiedPipeline::new()
        .with_ancestry(ancestry_classifier())
        .unwrap();
    let report = pipeline.run(&obs);

    let output = dir.path().join("reports").join("SAMPLE_001.json");
    let metadata = ExportMetadata {
        sample_id: Some("SAMPLE_001".to_string()),
        source: Some(input.display().to_string()),
    };
    ReportExport::new(&report, metadata).write_to(&output).unwrap();

    let json: serde_json::Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(json["metadata"]["sample_id"], "SAMPLE_001");
    assert_eq!(json["encoding_version"], "v1");
    assert!(json["created_at"].is_string());

    let ancestry = json["traits"]["ancestry"].as_object().unwrap();
    assert_eq!(ancestry.len(), 3);
    let total: f64 = ancestry.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert!(json["traits"].get("eye_color").is_none());
}
