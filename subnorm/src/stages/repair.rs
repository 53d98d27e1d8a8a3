//! Stage 3: directory-name repair.
//!
//! Some zip tools turn a notebook selected for compression into a
//! directory named after it, so submissions arrive with directories like
//! `hw1.ipynb/`. Each such directory is renamed to the extension-free
//! name, or merged into an already-existing directory of that name. The
//! walk is deepest-first so a parent's rename cannot invalidate child
//! paths that still need repairing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;
use walkdir::WalkDir;

use crate::config::NOTEBOOK_EXTENSION;

pub fn repair(root: &Path) -> Result<()> {
    let misnamed: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with(NOTEBOOK_EXTENSION)
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    for dir in misnamed {
        repair_dir(&dir)?;
    }
    Ok(())
}

fn repair_dir(dir: &Path) -> Result<()> {
    // An earlier merge may already have consumed this directory.
    if !dir.is_dir() {
        return Ok(());
    }
    let name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(target_name) = name.strip_suffix(NOTEBOOK_EXTENSION) else {
        return Ok(());
    };
    let target = dir.with_file_name(target_name);

    if !target.exists() {
        info!(from = %dir.display(), to = %target.display(), "renaming directory");
        fs::rename(dir, &target)
            .with_context(|| format!("rename {} to {}", dir.display(), target.display()))?;
        return Ok(());
    }
    if !target.is_dir() {
        bail!(
            "cannot repair {}: {} already exists and is not a directory",
            dir.display(),
            target.display()
        );
    }

    info!(from = %dir.display(), into = %target.display(), "merging directory");
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let source = entry.path();
        let destination = target.join(entry.file_name());
        if destination.exists() {
            bail!(
                "cannot merge {}: {} already exists",
                source.display(),
                destination.display()
            );
        }
        fs::rename(&source, &destination).with_context(|| {
            format!("move {} to {}", source.display(), destination.display())
        })?;
    }
    fs::remove_dir(dir).with_context(|| format!("remove {}", dir.display()))
}
