use anyhow::Result;
use clap::Parser;
use trait_predictor::cli::Args;
use trait_predictor::commands::{self, RunContext};
use trait_predictor::config::Config;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trait_predictor=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load(),
    };
    let ctx = RunContext::new(config, args.models.clone());

    if args.demo {
        commands::demo::run(&ctx, args.json)
    } else if let Some(input) = &args.predict {
        commands::predict::run(
            &ctx,
            input,
            args.sample.as_deref(),
            args.output.as_deref(),
            args.json,
        )
    } else if let Some(data_dir) = &args.train {
        commands::train::run(&ctx, data_dir, args.only_trait)
    } else {
        anyhow::bail!("one of --demo, --predict or --train is required")
    }
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
