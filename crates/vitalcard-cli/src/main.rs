// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vitalcard — command-line attestation renderer.
//
// Entry point. Initialises logging, reads the insured record and optional
// render configuration, then renders the attestation page to a PDF file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use vitalcard_core::error::Result;
use vitalcard_core::{AssetSet, DocumentRecord, RenderConfig, RenderOptions};
use vitalcard_document::{CardTemplate, DocumentAssembler, SvgSnapshotSource, VectorSnapshotSource};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render insurance ID-card attestations to PDF")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an attestation page for one insured record.
    Render(RenderArgs),
    /// Print the built-in card template SVG for a record.
    Template {
        /// Insured record (JSON).
        #[arg(short, long)]
        record: PathBuf,
        /// Render configuration (JSON); defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Insured record (JSON).
    #[arg(short, long)]
    record: PathBuf,

    /// Output PDF path.
    #[arg(short, long, default_value = "attestation.pdf")]
    output: PathBuf,

    /// Render configuration (JSON); defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// National emblem: URL, data URI or file path.
    #[arg(long)]
    emblem: Option<String>,

    /// Institution logo: URL, data URI or file path.
    #[arg(long)]
    logo: Option<String>,

    /// Insured photo: URL, data URI or file path.
    #[arg(long)]
    photo: Option<String>,

    /// Card template SVG to capture as the card base.
    #[arg(short, long, conflicts_with = "builtin_template")]
    template: Option<PathBuf>,

    /// Capture the built-in card template instead of drawing the vector fallback.
    #[arg(long)]
    builtin_template: bool,

    /// Issue date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    issued_on: Option<NaiveDate>,

    /// Overlay a millimetre grid for print calibration.
    #[arg(long)]
    debug_grid: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Render(args) => render(args).await,
        Command::Template { record, config } => print_template(&record, config.as_deref()),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn render(args: RenderArgs) -> Result<ExitCode> {
    let record = read_record(&args.record)?;
    let config = read_config(args.config.as_deref())?;
    let assets = AssetSet {
        emblem: args.emblem.clone(),
        logo: args.logo.clone(),
        photo: args.photo.clone(),
    };
    let options = RenderOptions {
        debug_grid: args.debug_grid,
        filename: Some(args.output.clone()),
        issued_on: args.issued_on,
    };

    let assembler = DocumentAssembler::new(config);
    if let Some(path) = &args.template {
        let markup = tokio::fs::read_to_string(path).await?;
        let source = SvgSnapshotSource::for_card(markup, assembler.geometry(), assembler.config());
        generate(assembler.with_template(source), &record, &assets, &options).await
    } else if args.builtin_template {
        let source =
            CardTemplate::new(assembler.geometry(), assembler.config()).snapshot_source(&record);
        generate(assembler.with_template(source), &record, &assets, &options).await
    } else {
        generate(assembler, &record, &assets, &options).await
    }
}

async fn generate<T: VectorSnapshotSource>(
    assembler: DocumentAssembler<vitalcard_document::DefaultFetcher, T>,
    record: &DocumentRecord,
    assets: &AssetSet,
    options: &RenderOptions,
) -> Result<ExitCode> {
    let assets = (!assets.is_empty()).then_some(assets);
    let artifact = assembler.generate(record, assets, options).await;

    if artifact.layout.hidden_coverages > 0 {
        info!(
            hidden = artifact.layout.hidden_coverages,
            "Coverage table truncated to fit the page"
        );
    }
    if let Some(reason) = &artifact.save_error {
        error!(bytes = artifact.bytes.len(), "PDF rendered but not saved: {reason}");
        return Ok(ExitCode::FAILURE);
    }
    if let Some(path) = &artifact.saved_to {
        println!("{}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn print_template(record: &Path, config: Option<&Path>) -> Result<ExitCode> {
    let record = read_record(record)?;
    let config = read_config(config)?;
    let geometry = vitalcard_core::Geometry::ID1_ON_A4;
    println!("{}", CardTemplate::new(&geometry, &config).markup(&record));
    Ok(ExitCode::SUCCESS)
}

fn read_record(path: &Path) -> Result<DocumentRecord> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn read_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(path) => RenderConfig::from_json_file(path),
        None => Ok(RenderConfig::default()),
    }
}
