//! Test-only fixture builders for submission trees and archives.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Serialize entries into zip bytes. Entry names ending in `/` become
/// directory entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, contents) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).expect("add directory");
            } else {
                zip.start_file(*name, options).expect("start file");
                zip.write_all(contents).expect("write entry");
            }
        }
        zip.finish().expect("finish zip");
    }
    buf
}

/// Write a zip built from `entries` to `path`.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    write_file(path, &zip_bytes(entries));
}

/// Write a file, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

/// Minimal valid nbformat v4 notebook JSON with one code cell per source
/// string.
pub fn notebook_json(code_cells: &[&str]) -> String {
    let cells: Vec<serde_json::Value> = code_cells
        .iter()
        .enumerate()
        .map(|(index, source)| {
            serde_json::json!({
                "cell_type": "code",
                "execution_count": index + 1,
                "metadata": {},
                "outputs": [],
                "source": source,
            })
        })
        .collect();
    serde_json::json!({
        "cells": cells,
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5,
    })
    .to_string()
}

/// Sorted relative paths of every entry under `root`, directories with a
/// trailing `/`. Useful for comparing tree states across pipeline runs.
pub fn tree_listing(root: &Path) -> Vec<String> {
    let mut listing: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("entry under root")
                .to_string_lossy()
                .replace('\\', "/");
            if entry.file_type().is_dir() {
                format!("{relative}/")
            } else {
                relative
            }
        })
        .collect();
    listing.sort();
    listing
}
