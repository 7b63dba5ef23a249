//! Run configuration, fixed once at batch start.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::report::Reporter;

/// Default output subdirectory when no destination is given (or the given
/// one is unusable).
pub const DEFAULT_DESTINATION_DIR: &str = "alto_escriptorium";

/// Source format of the ALTO files to normalize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Transkribus export: `mets.xml` + `alto/` directory, or a zip of it.
    #[value(name = "tkb")]
    Transkribus,
    /// LIMB output: a flat directory of paired XML and image files.
    #[value(name = "limb")]
    Limb,
    /// pdfalto output: an `out/` directory with per-document `_data` dirs.
    #[value(name = "pdfalto")]
    Pdfalto,
}

impl Scenario {
    /// Whether `--vpadding` has any effect for this scenario.
    pub fn supports_padding(self) -> bool {
        matches!(self, Scenario::Limb | Scenario::Pdfalto)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Scenario::Transkribus => "tkb",
            Scenario::Limb => "limb",
            Scenario::Pdfalto => "pdfalto",
        }
    }
}

/// Immutable configuration for one batch run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub scenario: Scenario,
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub talkative: bool,
    /// Vertical offset added to every `String/@VPOS` (limb/pdfalto only).
    pub vpadding: i64,
}

impl RunConfig {
    /// Resolve the output directory: the configured destination when it is a
    /// usable directory path, otherwise `<source>/alto_escriptorium`.
    ///
    /// `source` is passed explicitly because the Transkribus scenario swaps
    /// the source for the unpacked archive directory first.
    pub fn resolve_destination(&self, source: &Path, reporter: &mut Reporter) -> PathBuf {
        match &self.destination {
            Some(dest) if dest.is_dir() || !dest.exists() => dest.clone(),
            Some(dest) => {
                let fallback = source.join(DEFAULT_DESTINATION_DIR);
                reporter.warn(format!(
                    "'{}' is not a valid path, will save output in default location: {}",
                    dest.display(),
                    fallback.display()
                ));
                fallback
            }
            None => source.join(DEFAULT_DESTINATION_DIR),
        }
    }
}
