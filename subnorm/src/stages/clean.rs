//! Stage 2: artifact cleanup.
//!
//! Deletes files matching the strip rules (rendered-document extensions,
//! OS metadata prefixes) and junk directories by exact name. Matches are
//! collected during the walk and deleted afterwards; junk directories are
//! pruned from the walk so their contents are never visited, let alone
//! visited after deletion.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use walkdir::WalkDir;

use crate::config::NormalizerConfig;

pub fn clean(root: &Path, config: &NormalizerConfig) -> Result<()> {
    let mut strip_files: Vec<PathBuf> = Vec::new();
    let mut junk_dirs: Vec<PathBuf> = Vec::new();

    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_dir() {
            if config.strip_dir_names.iter().any(|junk| *junk == name) {
                junk_dirs.push(entry.into_path());
                walker.skip_current_dir();
            }
        } else if matches_strip_rule(&name, config) {
            strip_files.push(entry.into_path());
        }
    }

    for file in strip_files {
        info!(file = %file.display(), "deleting file");
        fs::remove_file(&file).with_context(|| format!("delete {}", file.display()))?;
    }
    for dir in junk_dirs {
        info!(dir = %dir.display(), "deleting directory");
        fs::remove_dir_all(&dir).with_context(|| format!("delete {}", dir.display()))?;
    }
    Ok(())
}

fn matches_strip_rule(name: &str, config: &NormalizerConfig) -> bool {
    config
        .strip_file_extensions
        .iter()
        .any(|extension| name.ends_with(extension.as_str()))
        || config
            .strip_file_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;

    #[test]
    fn strip_rule_files_are_deleted_everywhere() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_file(&root.join("alice/report.pdf"), b"%PDF-1.4");
        write_file(&root.join("alice/deep/nested/._hw.ipynb"), b"\x00");
        write_file(&root.join("alice/hw.ipynb"), b"{}");

        clean(root, &NormalizerConfig::default()).expect("clean");

        assert!(!root.join("alice/report.pdf").exists());
        assert!(!root.join("alice/deep/nested/._hw.ipynb").exists());
        assert!(root.join("alice/hw.ipynb").is_file());
    }

    #[test]
    fn junk_directories_are_deleted_with_contents() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_file(
            &root.join("bob/.ipynb_checkpoints/hw-checkpoint.ipynb"),
            b"{}",
        );
        write_file(&root.join("bob/venv/lib/site.py"), b"# site");
        write_file(&root.join("bob/hw.ipynb"), b"{}");

        clean(root, &NormalizerConfig::default()).expect("clean");

        assert!(!root.join("bob/.ipynb_checkpoints").exists());
        assert!(!root.join("bob/venv").exists());
        assert!(root.join("bob/hw.ipynb").is_file());
    }

    #[test]
    fn junk_directory_inside_junk_directory_is_handled() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_file(&root.join("__MACOSX/.ipynb_checkpoints/x.ipynb"), b"{}");

        clean(root, &NormalizerConfig::default()).expect("clean");

        assert!(!root.join("__MACOSX").exists());
    }

    #[test]
    fn clean_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        write_file(&root.join("carol/report.pdf"), b"%PDF-1.4");
        write_file(&root.join("carol/hw.ipynb"), b"{}");

        let config = NormalizerConfig::default();
        clean(root, &config).expect("first clean");
        clean(root, &config).expect("second clean");

        assert!(root.join("carol/hw.ipynb").is_file());
    }
}
