//! Minimal model of the notebook file format and script rendering.
//!
//! Only the fields script export needs are modeled; everything else in
//! the notebook JSON is ignored. nbformat v4 is the native shape; v3
//! notebooks (the `worksheets` layout, code kept in `input` with a
//! `prompt_number`) are upgraded to the v4 model on read, the way
//! grading tools built on nbformat do. `source` appears on disk either
//! as a single string or as an array of line strings, both accepted.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::config::NOTEBOOK_EXTENSION;

#[derive(Debug)]
pub struct Notebook {
    pub cells: Vec<Cell>,
}

#[derive(Debug)]
pub struct Cell {
    pub cell_type: String,
    pub source: Source,
    pub execution_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    pub fn joined(&self) -> String {
        match self {
            Source::Text(text) => text.clone(),
            Source::Lines(lines) => lines.concat(),
        }
    }
}

/// On-disk notebook shape, spanning both supported majors.
#[derive(Debug, Deserialize)]
struct RawNotebook {
    nbformat: u32,
    /// v4: cells at the top level.
    #[serde(default)]
    cells: Vec<RawCell>,
    /// v3: cells nested one level down.
    #[serde(default)]
    worksheets: Vec<RawWorksheet>,
}

#[derive(Debug, Deserialize)]
struct RawWorksheet {
    #[serde(default)]
    cells: Vec<RawCell>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: Source,
    /// v3 code cells keep their source here instead of `source`.
    #[serde(default)]
    input: Option<Source>,
    #[serde(default)]
    execution_count: Option<u64>,
    /// v3 name for the execution count.
    #[serde(default)]
    prompt_number: Option<u64>,
}

impl RawCell {
    fn into_cell(self) -> Cell {
        Cell {
            cell_type: self.cell_type,
            source: self.input.unwrap_or(self.source),
            execution_count: self.execution_count.or(self.prompt_number),
        }
    }
}

impl Notebook {
    /// Parse notebook JSON.
    ///
    /// nbformat 4 is read as-is; nbformat 3 is upgraded to the v4 model.
    /// Any other major version is an error.
    pub fn parse(raw: &str) -> Result<Notebook> {
        let raw: RawNotebook = serde_json::from_str(raw).context("parse notebook json")?;
        let cells = match raw.nbformat {
            4 => raw.cells,
            3 => raw
                .worksheets
                .into_iter()
                .flat_map(|worksheet| worksheet.cells)
                .collect(),
            other => bail!("unsupported nbformat version {other} (expected 3 or 4)"),
        };
        Ok(Notebook {
            cells: cells.into_iter().map(RawCell::into_cell).collect(),
        })
    }
}

/// Flatten a notebook's code cells, in order, into a Python script body.
///
/// Markdown, raw and output content is discarded. Each code cell is
/// prefixed with an `# In[n]:` marker carrying its execution count when
/// present, matching what graders are used to seeing from notebook
/// export tools.
pub fn render_script(notebook: &Notebook) -> String {
    let mut script = String::from("#!/usr/bin/env python\n# coding: utf-8\n");
    for cell in &notebook.cells {
        if cell.cell_type != "code" {
            continue;
        }
        let marker = match cell.execution_count {
            Some(count) => format!("# In[{count}]:"),
            None => "# In[ ]:".to_string(),
        };
        script.push('\n');
        script.push_str(&marker);
        script.push_str("\n\n");
        let source = cell.source.joined();
        script.push_str(&source);
        if !source.ends_with('\n') {
            script.push('\n');
        }
    }
    script
}

/// Whether a file name carries the notebook extension.
pub fn has_notebook_extension(name: &str) -> bool {
    name.ends_with(NOTEBOOK_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_string_and_array_sources() {
        let raw = r#"{
            "nbformat": 4,
            "nbformat_minor": 5,
            "cells": [
                {"cell_type": "code", "execution_count": 1, "source": "x = 1\n"},
                {"cell_type": "code", "execution_count": 2, "source": ["y = 2\n", "print(y)\n"]}
            ]
        }"#;

        let notebook = Notebook::parse(raw).expect("parse");
        assert_eq!(notebook.cells[0].source.joined(), "x = 1\n");
        assert_eq!(notebook.cells[1].source.joined(), "y = 2\nprint(y)\n");
    }

    #[test]
    fn parse_upgrades_legacy_v3_notebooks() {
        let raw = r##"{
            "nbformat": 3,
            "worksheets": [
                {"cells": [
                    {"cell_type": "markdown", "source": "# Old-style homework\n"},
                    {"cell_type": "code", "input": ["x = 1\n", "print(x)\n"], "prompt_number": 2}
                ]}
            ]
        }"##;

        let notebook = Notebook::parse(raw).expect("parse");
        let script = render_script(&notebook);

        assert!(script.contains("# In[2]:\n\nx = 1\nprint(x)\n"));
        assert!(!script.contains("Old-style"));
    }

    #[test]
    fn parse_rejects_other_nbformat_versions() {
        let raw = r#"{"nbformat": 2, "cells": []}"#;
        let msg = Notebook::parse(raw).unwrap_err().to_string();
        assert!(msg.contains("unsupported nbformat version 2"));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(Notebook::parse("{not json").is_err());
    }

    #[test]
    fn render_discards_markdown_and_keeps_cell_order() {
        let raw = r##"{
            "nbformat": 4,
            "cells": [
                {"cell_type": "markdown", "source": "# Homework 1\n"},
                {"cell_type": "code", "execution_count": 3, "source": "a = 1\n"},
                {"cell_type": "code", "execution_count": null, "source": "b = 2"}
            ]
        }"##;

        let script = render_script(&Notebook::parse(raw).expect("parse"));

        assert!(script.starts_with("#!/usr/bin/env python\n# coding: utf-8\n"));
        assert!(!script.contains("Homework"));
        assert!(script.contains("# In[3]:\n\na = 1\n"));
        assert!(script.contains("# In[ ]:\n\nb = 2\n"));
        let a_pos = script.find("a = 1").expect("first cell");
        let b_pos = script.find("b = 2").expect("second cell");
        assert!(a_pos < b_pos);
    }
}
