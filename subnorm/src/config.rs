//! Normalizer configuration, optionally loaded from a TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

/// Extension nested submission archives are recognized by.
pub const ARCHIVE_EXTENSION: &str = ".zip";
/// Extension notebook files (and misnamed directories) are recognized by.
pub const NOTEBOOK_EXTENSION: &str = ".ipynb";
/// Extension (without dot) of generated script files.
pub const SCRIPT_EXTENSION: &str = "py";

/// Normalizer configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable.
/// Missing fields default to the values the tool was written for: Jupyter
/// notebooks zipped up by common student tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Encoding all notebook files are normalized to before parsing.
    pub canonical_encoding: String,

    /// Notebooks smaller than this many bytes are skipped as invalid.
    pub min_notebook_bytes: u64,

    /// Files with these extensions are deleted by the cleaner.
    pub strip_file_extensions: Vec<String>,

    /// Files with these name prefixes are deleted by the cleaner and
    /// never treated as archives by the expander (macOS `._` companions).
    pub strip_file_prefixes: Vec<String>,

    /// Directories with exactly these names are deleted with their
    /// entire contents.
    pub strip_dir_names: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            canonical_encoding: "utf-8".to_string(),
            min_notebook_bytes: 10,
            strip_file_extensions: vec![".pdf".to_string()],
            strip_file_prefixes: vec!["._".to_string()],
            strip_dir_names: [
                ".ipynb_checkpoints",
                "__MACOSX",
                ".venv",
                ".env",
                "venv",
                "env",
                "virtualenv",
            ]
            .iter()
            .map(|name| (*name).to_string())
            .collect(),
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<()> {
        if Encoding::for_label(self.canonical_encoding.as_bytes()).is_none() {
            return Err(anyhow!(
                "canonical_encoding {:?} is not a known encoding label",
                self.canonical_encoding
            ));
        }
        if self.min_notebook_bytes == 0 {
            return Err(anyhow!("min_notebook_bytes must be > 0"));
        }
        if self.strip_file_extensions.iter().any(String::is_empty)
            || self.strip_file_prefixes.iter().any(String::is_empty)
            || self.strip_dir_names.iter().any(String::is_empty)
        {
            return Err(anyhow!("strip rules must not contain empty strings"));
        }
        Ok(())
    }

    /// Resolve the canonical encoding label.
    pub fn canonical_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.canonical_encoding.as_bytes()).ok_or_else(|| {
            anyhow!(
                "canonical_encoding {:?} is not a known encoding label",
                self.canonical_encoding
            )
        })
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `NormalizerConfig::default()`.
pub fn load_config(path: &Path) -> Result<NormalizerConfig> {
    if !path.exists() {
        let cfg = NormalizerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: NormalizerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, NormalizerConfig::default());
    }

    #[test]
    fn load_partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("subnorm.toml");
        std::fs::write(&path, "min_notebook_bytes = 32\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.min_notebook_bytes, 32);
        assert_eq!(cfg.strip_file_extensions, vec![".pdf".to_string()]);
    }

    #[test]
    fn validate_rejects_unknown_encoding() {
        let cfg = NormalizerConfig {
            canonical_encoding: "not-an-encoding".to_string(),
            ..NormalizerConfig::default()
        };
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("not a known encoding label"));
    }

    #[test]
    fn validate_rejects_zero_min_size() {
        let cfg = NormalizerConfig {
            min_notebook_bytes: 0,
            ..NormalizerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn canonical_encoding_resolves_default_label() {
        let cfg = NormalizerConfig::default();
        let encoding = cfg.canonical_encoding().expect("resolve");
        assert_eq!(encoding, encoding_rs::UTF_8);
    }
}
