//! Training entry point: fit the feature pipeline, train and compare the
//! candidate models, and persist every artifact.

use anyhow::Context;
use clap::Parser;
use homeval::train::{report, run_full_training};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train and select a sale price model")]
struct Args {
    /// Training CSV (must contain the SalePrice column).
    #[arg(long)]
    train: PathBuf,

    /// Optional held-out CSV, transformed through the fitted pipeline as
    /// a schema check.
    #[arg(long)]
    test: Option<PathBuf>,

    /// Directory for trained model artifacts.
    #[arg(long, default_value = "models")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let run = run_full_training(&args.train, args.test.as_deref(), &args.out_dir)
        .context("training run failed")?;

    println!("\n{}", report::render_table(&run));
    println!(
        "best model: {} (artifacts in {})",
        run.best().name,
        args.out_dir.display()
    );
    Ok(())
}
