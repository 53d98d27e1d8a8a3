//! Top-level orchestrator: the four stages, strictly in order.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::config::NormalizerConfig;
use crate::stages;

/// Run the full normalization pipeline over the working root.
///
/// Each stage finishes its entire traversal before the next starts; the
/// filesystem tree is the only state passed between them.
pub fn run(archive: &Path, root: &Path, config: &NormalizerConfig) -> Result<()> {
    config.validate()?;
    stages::expand::expand(archive, root, config)?;
    stages::clean::clean(root, config)?;
    stages::repair::repair(root)?;
    stages::convert::convert(root, config)?;
    info!(root = %root.display(), "normalization complete");
    Ok(())
}
