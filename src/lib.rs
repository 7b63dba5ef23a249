//! Altoconv: normalize ALTO XML from OCR tools for eScriptorium import.
//!
//! OCR and transcription tools all emit ALTO, but not the ALTO the
//! eScriptorium import module accepts. Altoconv takes a Transkribus export,
//! a LIMB output directory, or a pdfalto output directory and rewrites each
//! file into the eScriptorium-flavoured ALTO v4 dialect: schema declaration,
//! image reference, coordinates, baselines, and block structure.
//!
//! # Modules
//!
//! - [`dom`]: mutable XML tree used for the in-place rewrites
//! - [`alto`]: the per-document transforms (schema, namespace, image,
//!   geometry, structure)
//! - [`scenario`]: one batch driver per source format
//! - [`archive`] / [`mets`]: zip and manifest plumbing
//! - [`error`] / [`report`] / [`config`]: errors, logging, run configuration

pub mod alto;
pub mod archive;
pub mod config;
pub mod dom;
pub mod error;
pub mod mets;
pub mod report;
pub mod scenario;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use config::{RunConfig, Scenario};
pub use error::AltoConvError;
pub use report::Reporter;
pub use scenario::{RunOutcome, RunStatus};

/// The altoconv CLI application.
#[derive(Parser)]
#[command(name = "altoconv")]
#[command(version, author, about)]
struct Cli {
    /// Location of the source files (directory, or a zip archive for the
    /// tkb scenario).
    #[arg(short = 'i', long)]
    source: PathBuf,

    /// Transformation scenario to apply.
    #[arg(short = 's', long, value_enum)]
    scenario: Scenario,

    /// Where resulting files are stored; defaults to an
    /// 'alto_escriptorium' directory inside the source.
    #[arg(short = 'o', long)]
    destination: Option<PathBuf>,

    /// Display highlighted step-by-step messages and replay the full log.
    #[arg(short = 't', long)]
    talktome: bool,

    /// [pdfalto, limb] vertical offset added to every String VPOS.
    #[arg(long, default_value_t = 0)]
    vpadding: i64,

    /// Run mode; 'test' parses arguments and exits.
    #[arg(short = 'm', long, value_enum, default_value_t = Mode::Default)]
    mode: Mode,
}

/// CLI run mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Default,
    Test,
}

/// Run the altoconv CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AltoConvError> {
    let cli = Cli::parse();

    if cli.mode == Mode::Test {
        return Ok(());
    }

    let mut reporter = Reporter::new(cli.talktome);
    if cli.vpadding != 0 && !cli.scenario.supports_padding() {
        reporter.warn("vpadding option is only valid for PDFALTO and LIMB scenarios");
    }

    let config = RunConfig {
        scenario: cli.scenario,
        source: cli.source,
        destination: cli.destination,
        talkative: cli.talktome,
        vpadding: cli.vpadding,
    };
    let outcome = scenario::run(&config, &mut reporter);

    if config.talkative {
        println!("Displaying execution log (status: {}):", outcome.status);
        for entry in reporter.entries() {
            println!("{entry}");
        }
    }
    println!("Execution status: {} - {}", outcome.status, outcome.message);
    Ok(())
}
