//! Stage 4: notebook-to-script conversion.
//!
//! Every notebook gets a typed per-file outcome instead of a thrown
//! error: encoding is normalized in place, empty and undersized files are
//! skipped, parse failures are recorded, and successful parses are
//! rendered to a sibling `.py` script. No single notebook can abort the
//! stage.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{NormalizerConfig, SCRIPT_EXTENSION};
use crate::encoding;
use crate::notebook::{self, Notebook};

/// Why a notebook was skipped without being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    TooSmall { size: u64 },
}

/// Per-notebook conversion outcome.
#[derive(Debug)]
pub enum Outcome {
    Converted { script: PathBuf },
    Skipped(SkipReason),
    Failed { error: anyhow::Error },
}

/// One notebook's path and what happened to it.
#[derive(Debug)]
pub struct NotebookReport {
    pub notebook: PathBuf,
    pub outcome: Outcome,
}

/// Convert every notebook under the root, in tree order.
///
/// Returns the per-file reports; the `Result` is only an `Err` for
/// stage-level problems (an invalid canonical encoding label), never for
/// an individual notebook.
pub fn convert(root: &Path, config: &NormalizerConfig) -> Result<Vec<NotebookReport>> {
    let canonical = config.canonical_encoding()?;
    let mut reports = Vec::new();
    for path in find_notebooks(root) {
        let outcome = match convert_one(&path, canonical, config.min_notebook_bytes) {
            Ok(outcome) => outcome,
            Err(error) => Outcome::Failed { error },
        };
        log_outcome(&path, &outcome);
        reports.push(NotebookReport {
            notebook: path,
            outcome,
        });
    }
    Ok(reports)
}

fn find_notebooks(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| notebook::has_notebook_extension(&entry.file_name().to_string_lossy()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn convert_one(
    path: &Path,
    canonical: &'static Encoding,
    min_notebook_bytes: u64,
) -> Result<Outcome> {
    encoding::normalize_file(path, canonical)?;

    let size = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    if size == 0 {
        return Ok(Outcome::Skipped(SkipReason::Empty));
    }
    if size < min_notebook_bytes {
        return Ok(Outcome::Skipped(SkipReason::TooSmall { size }));
    }

    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let parsed = Notebook::parse(&raw).with_context(|| format!("parse {}", path.display()))?;

    let script_path = path.with_extension(SCRIPT_EXTENSION);
    let script = notebook::render_script(&parsed);
    let (bytes, _, _) = canonical.encode(&script);
    fs::write(&script_path, bytes.as_ref())
        .with_context(|| format!("write {}", script_path.display()))?;
    Ok(Outcome::Converted {
        script: script_path,
    })
}

fn log_outcome(path: &Path, outcome: &Outcome) {
    match outcome {
        Outcome::Converted { script } => {
            info!(notebook = %path.display(), script = %script.display(), "converted notebook");
        }
        Outcome::Skipped(SkipReason::Empty) => {
            warn!(notebook = %path.display(), "skipping empty notebook");
        }
        Outcome::Skipped(SkipReason::TooSmall { size }) => {
            warn!(notebook = %path.display(), size, "skipping undersized notebook");
        }
        Outcome::Failed { error } => {
            warn!(
                notebook = %path.display(),
                error = %format!("{error:#}"),
                "skipping unconvertible notebook"
            );
        }
    }
}
