//! Stage 1: archive expansion.
//!
//! Unpacks the top-level submissions archive into the working root, then
//! repeatedly walks the root unpacking every nested `.zip` into a sibling
//! directory named after the archive minus its extension, until a pass
//! extracts nothing new. Each archive is extracted into a staging
//! directory that is renamed into place only when extraction completes,
//! so malformed archives (detected up front or mid-extraction) leave
//! nothing behind and stay in place for the next run. A nested archive
//! whose destination directory already exists is skipped, which is what
//! makes re-runs extract each archive exactly once.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::config::{ARCHIVE_EXTENSION, NormalizerConfig};

/// Run the full expansion stage: top-level archive, then nested archives.
pub fn expand(archive: &Path, root: &Path, config: &NormalizerConfig) -> Result<()> {
    expand_root(archive, root)?;
    expand_nested(root, config)
}

/// Extract the top-level archive into the working root.
///
/// Creates the root if absent. A missing top-level archive skips the
/// extraction (the root may already hold a previous run's tree); a
/// present but unreadable one is fatal.
pub fn expand_root(archive: &Path, root: &Path) -> Result<()> {
    fs::create_dir_all(root)
        .with_context(|| format!("create working root {}", root.display()))?;
    if !archive.exists() {
        debug!(archive = %archive.display(), "top-level archive missing, skipping extraction");
        return Ok(());
    }
    info!(archive = %archive.display(), root = %root.display(), "extracting top-level archive");
    extract_archive(archive, root)
        .with_context(|| format!("extract top-level archive {}", archive.display()))
}

/// Extract every nested submission archive under the root.
pub fn expand_nested(root: &Path, config: &NormalizerConfig) -> Result<()> {
    // Extraction can surface further archives (a zip inside a student's
    // zip), so keep walking until a pass extracts nothing.
    loop {
        let mut extracted = 0;
        for path in find_nested_archives(root, config) {
            let destination = path.with_extension("");
            if destination.exists() {
                debug!(
                    archive = %path.display(),
                    destination = %destination.display(),
                    "destination already exists, skipping nested archive"
                );
                continue;
            }
            info!(
                archive = %path.display(),
                destination = %destination.display(),
                "extracting nested archive"
            );
            // Extract into a staging directory and rename into place only
            // on success, so a zip that fails mid-extraction leaves no
            // partial destination behind and the next run retries it.
            let staging = path.with_extension("extracting");
            if staging.exists() {
                fs::remove_dir_all(&staging)
                    .with_context(|| format!("remove stale {}", staging.display()))?;
            }
            fs::create_dir_all(&staging)
                .with_context(|| format!("create directory {}", staging.display()))?;
            match extract_archive(&path, &staging) {
                Ok(()) => {
                    fs::rename(&staging, &destination).with_context(|| {
                        format!(
                            "move {} to {}",
                            staging.display(),
                            destination.display()
                        )
                    })?;
                    extracted += 1;
                }
                Err(error) => {
                    warn!(
                        archive = %path.display(),
                        error = %format!("{error:#}"),
                        "skipping malformed nested archive"
                    );
                    fs::remove_dir_all(&staging)
                        .with_context(|| format!("remove {}", staging.display()))?;
                }
            }
        }
        if extracted == 0 {
            return Ok(());
        }
    }
}

fn find_nested_archives(root: &Path, config: &NormalizerConfig) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.ends_with(ARCHIVE_EXTENSION)
                && !config
                    .strip_file_prefixes
                    .iter()
                    .any(|prefix| name.starts_with(prefix.as_str()))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Extract all entries of a zip archive into `destination`.
///
/// Entries without a safe enclosed name (absolute paths, `..` traversal)
/// are skipped with a log line. The archive handle is dropped on return,
/// success or failure.
fn extract_archive(archive_path: &Path, destination: &Path) -> Result<()> {
    let file =
        File::open(archive_path).with_context(|| format!("open {}", archive_path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("read {}", archive_path.display()))?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("read entry {index} of {}", archive_path.display()))?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(
                archive = %archive_path.display(),
                entry = entry.name(),
                "skipping archive entry with unsafe path"
            );
            continue;
        };
        let out_path = destination.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("create directory {}", out_path.display()))?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create directory {}", parent.display()))?;
            }
            let mut out = File::create(&out_path)
                .with_context(|| format!("create {}", out_path.display()))?;
            std::io::copy(&mut entry, &mut out)
                .with_context(|| format!("write {}", out_path.display()))?;
        }
    }
    Ok(())
}
