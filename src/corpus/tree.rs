//! Directory tree generation
//!
//! Builds a nested tree of numbered directories for metadata testing:
//! `width` children per directory, `depth` levels below the root. Existing
//! directories are reused.

use crate::error::{DrillError, DrillResult, IoContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of [`make_tree`]
#[derive(Debug, Clone)]
pub struct TreeReport {
    /// Directories at the deepest level, in creation order
    pub leaves: Vec<PathBuf>,
    /// Directories created or found at every level below the root
    pub dir_count: u64,
    pub elapsed: Duration,
}

/// Create `root/0`, `root/1`, ... nested `depth` levels deep
///
/// `depth == 0` creates only the root, which is then the single leaf.
pub fn make_tree(root: &Path, width: usize, depth: usize) -> DrillResult<TreeReport> {
    if width == 0 && depth > 0 {
        return Err(DrillError::invalid("tree width must be greater than 0"));
    }

    let start = Instant::now();
    fs::create_dir_all(root).io_context("mkdir", root)?;

    let mut level = vec![root.to_path_buf()];
    let mut dir_count = 0u64;

    for _ in 0..depth {
        let mut next = Vec::with_capacity(level.len() * width);
        for parent in &level {
            for w in 0..width {
                let dir = parent.join(w.to_string());
                fs::create_dir_all(&dir).io_context("mkdir", &dir)?;
                next.push(dir);
            }
        }
        dir_count += next.len() as u64;
        level = next;
    }

    tracing::debug!(root = %root.display(), width, depth, dirs = dir_count, "directory tree ready");

    Ok(TreeReport {
        leaves: level,
        dir_count,
        elapsed: start.elapsed(),
    })
}
