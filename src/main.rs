//! Target encoder CLI
//!
//! Fits a target encoder on a CSV file and writes the artifact sections to a
//! directory, or scores a CSV file with a previously written artifact.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use target_encoding::artifact::{write_artifact, DirectoryStore};
use target_encoding::config::TargetEncoderConfig;
use target_encoding::dataset::{Frame, TableSource};
use target_encoding::encoding::{TargetEncoder, TransformOptions};
use target_encoding::logging;
use target_encoding::scorer::Scorer;
use target_encoding::traits::Transformer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "target-encoder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fit and apply target encodings of categorical columns", long_about = None)]
struct Args {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit an encoder and write its artifact
    Fit {
        /// Training CSV with a header row
        #[arg(long)]
        train: PathBuf,

        /// Encoder configuration (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Directory receiving the artifact sections
        #[arg(long)]
        artifact: PathBuf,

        /// Write the training-time encoding of the training set here
        #[arg(long)]
        transformed: Option<PathBuf>,

        /// Columns to read as categorical even if every value is numeric
        #[arg(long, num_args = 1..)]
        categorical: Vec<String>,
    },
    /// Score a CSV with a previously written artifact
    Transform {
        /// Directory holding the artifact sections
        #[arg(long)]
        artifact: PathBuf,

        /// Input CSV with a header row
        #[arg(long)]
        input: PathBuf,

        /// Output CSV
        #[arg(long)]
        output: PathBuf,

        /// Columns to read as categorical even if every value is numeric
        #[arg(long, num_args = 1..)]
        categorical: Vec<String>,
    },
}

fn categorical_refs(columns: &[String]) -> Vec<&str> {
    columns.iter().map(String::as_str).collect()
}

fn fit(
    train: PathBuf,
    config: PathBuf,
    artifact: PathBuf,
    transformed: Option<PathBuf>,
    categorical: Vec<String>,
) -> Result<()> {
    let config = TargetEncoderConfig::from_toml_file(&config)
        .with_context(|| format!("Failed to load config {}", config.display()))?;
    let frame = Frame::from_csv(&train, &categorical_refs(&categorical))
        .with_context(|| format!("Failed to load training data {}", train.display()))?;
    info!(rows = frame.n_rows(), columns = frame.n_cols(), "loaded training data");

    let fitted = TargetEncoder::new(config)
        .fit(&frame)
        .context("Failed to fit target encoder")?;

    if let Some(path) = transformed {
        let encoded = fitted
            .transform_training(&frame, &TransformOptions::default())
            .context("Failed to encode training data")?;
        encoded
            .to_csv(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote training-time encoding");
    }

    let summary = fitted.summary();
    let artifact_value = fitted.into_artifact();
    let mut store = DirectoryStore::new(&artifact);
    write_artifact(&artifact_value, &mut store)
        .with_context(|| format!("Failed to write artifact to {}", artifact.display()))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn transform(
    artifact: PathBuf,
    input: PathBuf,
    output: PathBuf,
    categorical: Vec<String>,
) -> Result<()> {
    let scorer = Scorer::from_reader(&DirectoryStore::new(&artifact))
        .with_context(|| format!("Failed to load artifact {}", artifact.display()))?;
    let frame = Frame::from_csv(&input, &categorical_refs(&categorical))
        .with_context(|| format!("Failed to load input data {}", input.display()))?;
    let scored = scorer.score_frame(&frame)?;
    scored
        .to_csv(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(rows = scored.n_rows(), path = %output.display(), "wrote scored data");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    logging::init_with_default(default_level).context("Failed to set tracing subscriber")?;

    match args.command {
        Command::Fit {
            train,
            config,
            artifact,
            transformed,
            categorical,
        } => fit(train, config, artifact, transformed, categorical),
        Command::Transform {
            artifact,
            input,
            output,
            categorical,
        } => transform(artifact, input, output, categorical),
    }
}
