//! Encoding detection and in-place normalization for notebook files.
//!
//! Detection is delegated to `chardetng`; both the decode of the detected
//! encoding and the encode of the canonical one are lossy (replacement
//! characters instead of errors), so normalization never fails on bad
//! bytes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use tracing::{debug, info};

/// Best-guess encoding of the given raw bytes.
pub fn detect(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// Rewrite `path` in the canonical encoding if its bytes differ from it.
///
/// Returns whether the file was rewritten. Plain-ASCII files detect as a
/// legacy encoding but re-encode to identical bytes, so they are left
/// untouched.
pub fn normalize_file(path: &Path, canonical: &'static Encoding) -> Result<bool> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let detected = detect(&bytes);
    debug!(file = %path.display(), encoding = detected.name(), "detected encoding");
    if detected == canonical {
        return Ok(false);
    }

    let (text, _, _) = detected.decode(&bytes);
    let (normalized, _, _) = canonical.encode(&text);
    if normalized.as_ref() == bytes.as_slice() {
        return Ok(false);
    }

    info!(
        file = %path.display(),
        from = detected.name(),
        to = canonical.name(),
        "normalizing encoding"
    );
    fs::write(path, normalized.as_ref()).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_recognizes_utf8() {
        assert_eq!(detect("velocité café".as_bytes()), encoding_rs::UTF_8);
    }

    #[test]
    fn normalize_leaves_ascii_untouched() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("plain.ipynb");
        fs::write(&path, b"{\"cells\": []}").expect("write");

        let rewritten = normalize_file(&path, encoding_rs::UTF_8).expect("normalize");

        assert!(!rewritten);
        assert_eq!(fs::read(&path).expect("read"), b"{\"cells\": []}");
    }

    #[test]
    fn normalize_rewrites_legacy_bytes_as_utf8() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("legacy.ipynb");
        // "café" in windows-1252: the 0xE9 byte is not valid UTF-8.
        fs::write(&path, b"this submission mentions caf\xe9 many times")
            .expect("write");

        let rewritten = normalize_file(&path, encoding_rs::UTF_8).expect("normalize");

        assert!(rewritten);
        let text = fs::read_to_string(&path).expect("valid utf-8 after normalize");
        assert!(text.contains("café"));
    }
}
