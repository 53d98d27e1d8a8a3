//! Batch normalizer for student assignment submissions.
//!
//! Takes a single submissions archive and turns it into a tree of
//! per-student directories ready for grading or static analysis. The work
//! is a strictly sequential pipeline over the working root:
//!
//! 1. **[`stages::expand`]**: unpack the top-level archive, then every
//!    nested per-submission archive.
//! 2. **[`stages::clean`]**: delete rendered documents, OS metadata
//!    companions and junk directories (checkpoints, virtualenvs).
//! 3. **[`stages::repair`]**: rename or merge directories that carry a
//!    notebook file extension (a common zip-tool mistake).
//! 4. **[`stages::convert`]**: normalize notebook encodings and render
//!    each valid notebook to a sibling Python script.
//!
//! The filesystem is the only state store; each stage takes the working
//! root and mutates it in place. Re-running the pipeline on an already
//! normalized tree is a no-op.

pub mod config;
pub mod encoding;
pub mod logging;
pub mod notebook;
pub mod pipeline;
pub mod stages;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
