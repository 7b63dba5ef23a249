//! Scenario drivers: one conversion pipeline per source format.
//!
//! Each driver owns the whole batch for its scenario: discovery, the
//! per-file pipeline, and the final status. Batch-level preconditions (no
//! manifest, no files, unreadable archive) abort the run before any file is
//! touched; everything that goes wrong inside the per-file loop is caught
//! there, counted, and the loop moves on.

pub mod limb;
pub mod pdfalto;
pub mod transkribus;

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use serde::Serialize;

use crate::config::{RunConfig, Scenario};
use crate::error::AltoConvError;
use crate::report::Reporter;

/// Execution status of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunStatus::Running => "running",
            RunStatus::Finished => "finished",
            RunStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Structured result of one batch run.
#[derive(Clone, Debug, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub message: String,
    /// Files converted and written to the destination.
    pub processed: usize,
    /// Files that hit an unexpected per-file error.
    pub failed: usize,
    /// Files skipped because their schema version is unsupported.
    pub skipped: usize,
}

impl RunOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            message: message.into(),
            processed: 0,
            failed: 0,
            skipped: 0,
        }
    }

    pub fn has_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }
}

/// Result of one file going through a driver pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Converted,
    /// Unsupported schema version; the file is left alone.
    Skipped,
}

/// Run the scenario selected in the configuration.
pub fn run(config: &RunConfig, reporter: &mut Reporter) -> RunOutcome {
    match config.scenario {
        Scenario::Transkribus => transkribus::run(config, reporter),
        Scenario::Limb => limb::run(config, reporter),
        Scenario::Pdfalto => pdfalto::run(config, reporter),
    }
}

/// Classification failures are file-local by design: the file is skipped and
/// the batch continues.
fn is_classification_error(err: &AltoConvError) -> bool {
    matches!(
        err,
        AltoConvError::NotAlto { .. }
            | AltoConvError::MalformedDocument { .. }
            | AltoConvError::XmlParse { .. }
    )
}

/// Drive the per-file loop: every file is handled to completion or to its
/// own failure before the next one starts. The success counter lives here,
/// initialized once for the whole batch.
fn process_files<F>(files: &[PathBuf], reporter: &mut Reporter, mut handle: F) -> RunOutcome
where
    F: FnMut(&Path, &mut Reporter) -> Result<FileOutcome, AltoConvError>,
{
    let mut processed = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    let progress = ProgressBar::new(files.len() as u64);
    for file in files {
        match handle(file, reporter) {
            Ok(FileOutcome::Converted) => processed += 1,
            Ok(FileOutcome::Skipped) => skipped += 1,
            Err(err) if is_classification_error(&err) => {
                reporter.error(err.to_string());
                skipped += 1;
            }
            Err(err) => {
                reporter.error(format!("Failed to process '{}': {}", file.display(), err));
                failed += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if processed == 0 && failed > 0 {
        let message = format!("All {} file(s) failed during conversion.", failed);
        reporter.error(message.clone());
        return RunOutcome {
            status: RunStatus::Failed,
            message,
            processed,
            failed,
            skipped,
        };
    }

    if failed > 0 {
        reporter.warn(format!(
            "{} of {} file(s) failed; the rest were converted.",
            failed,
            files.len()
        ));
    }
    reporter.success("Finished!");
    RunOutcome {
        status: RunStatus::Finished,
        message: "Conversion ran successfully.".to_string(),
        processed,
        failed,
        skipped,
    }
}

/// Turn a batch-level precondition error into a failed outcome with the
/// user-facing message.
fn precondition_failure(err: AltoConvError, reporter: &mut Reporter) -> RunOutcome {
    let message = match &err {
        AltoConvError::NoImageReferences(_) => {
            "There is no reference to images in the METS XML file you provided. \
             Make sure to check the \"Export Image\" option in Transkribus."
                .to_string()
        }
        AltoConvError::NoAltoFiles(_) => {
            "There is no ALTO XML file in the data you provided.".to_string()
        }
        AltoConvError::NoImageFiles(_) => {
            "There is no image file in the data you provided.".to_string()
        }
        AltoConvError::MissingManifest(path) => format!(
            "There is no 'mets.xml' file in the indicated location. \
             Are you sure '{}' is an export from Transkribus?",
            path.display()
        ),
        AltoConvError::ArchiveMissingManifest(_) | AltoConvError::ArchiveExtension(_) => {
            "Something went wrong unpacking the source.".to_string()
        }
        other => other.to_string(),
    };
    reporter.error(err.to_string());
    reporter.error("Interrupting execution");
    RunOutcome::failed(message)
}

/// List a directory's entries, sorted for deterministic processing order.
fn list_directory(path: &Path) -> Result<Vec<PathBuf>, AltoConvError> {
    if !path.is_dir() {
        return Err(AltoConvError::NotADirectory(path.to_path_buf()));
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n != ".DS_Store")
                .unwrap_or(true)
        })
        .collect();
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_failures_fail_the_batch() {
        let files = vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")];
        let mut reporter = Reporter::new(false);
        let outcome = process_files(&files, &mut reporter, |path, _| {
            Err(AltoConvError::MissingImagePair {
                path: path.to_path_buf(),
            })
        });
        assert_eq!(outcome.status, RunStatus::Failed);
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.processed, 0);
    }

    #[test]
    fn partial_success_finishes_with_counts() {
        let files = vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")];
        let mut reporter = Reporter::new(false);
        let mut first = true;
        let outcome = process_files(&files, &mut reporter, |path, _| {
            if std::mem::take(&mut first) {
                Ok(FileOutcome::Converted)
            } else {
                Err(AltoConvError::MissingImagePair {
                    path: path.to_path_buf(),
                })
            }
        });
        assert_eq!(outcome.status, RunStatus::Finished);
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.failed, 1);
    }

    #[test]
    fn success_counter_accumulates_across_the_loop() {
        let files = vec![
            PathBuf::from("a.xml"),
            PathBuf::from("b.xml"),
            PathBuf::from("c.xml"),
        ];
        let mut reporter = Reporter::new(false);
        let outcome = process_files(&files, &mut reporter, |_, _| Ok(FileOutcome::Converted));
        assert_eq!(outcome.processed, 3);
    }

    #[test]
    fn classification_errors_count_as_skips() {
        let files = vec![PathBuf::from("a.xml")];
        let mut reporter = Reporter::new(false);
        let outcome = process_files(&files, &mut reporter, |path, _| {
            Err(AltoConvError::NotAlto {
                path: path.to_path_buf(),
            })
        });
        assert_eq!(outcome.status, RunStatus::Finished);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);
    }
}
