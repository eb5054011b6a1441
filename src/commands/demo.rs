use super::{print_header, print_json, print_report, RunContext};
use crate::observation::Observation;
use anyhow::Result;

/// Fixed sample covering every eye, hair and ancestry marker.
pub const DEMO_GENOTYPES: [(&str, &str); 14] = [
    ("rs12913832", "AG"),
    ("rs1800407", "GG"),
    ("rs12896399", "GG"),
    ("rs16891982", "GG"),
    ("rs1393350", "AA"),
    ("rs12203592", "GG"),
    ("rs1805007", "CC"),
    ("rs1805008", "CC"),
    ("rs1805009", "GG"),
    ("rs1042602", "AA"),
    ("rs2228479", "GG"),
    ("rs3827760", "AA"),
    ("rs2814778", "GG"),
    ("rs1426654", "AA"),
];

pub fn demo_observation() -> Observation {
    DEMO_GENOTYPES.into_iter().collect()
}

pub fn run(ctx: &RunContext, json: bool) -> Result<()> {
    let pipeline = ctx.pipeline()?;
    let observation = demo_observation();
    let report = pipeline.run(&observation);

    if json {
        return print_json(&report);
    }

    print_header("Demo Prediction");
    println!("\nInput SNPs:");
    for (rsid, genotype) in DEMO_GENOTYPES.iter().take(5) {
        println!("  {}: {}", rsid, genotype);
    }
    println!("  ... ({} markers total)", DEMO_GENOTYPES.len());
    print_report(&report);
    Ok(())
}
