//! File corpus discovery
//!
//! A corpus is every regular file beneath a root directory, each with the
//! size it had when the walk reached it. Workers consume it through one of
//! the [`queue`] modes; the [`tree`] and [`generator`] submodules build
//! corpora on disk.
//!
//! Entries are visited depth first with the entries of each directory in
//! name order, so two enumerations of an unchanged tree agree. Symlinks to
//! regular files are included; symlinked directories are not descended into.

pub mod generator;
pub mod queue;
pub mod tree;

use crate::error::{DrillError, DrillResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use queue::{CursorQueue, SamplerQueue, WorkSource};

/// A corpus file and its size
///
/// Generated files carry their planned size; discovered files carry the
/// size they had when the walk reached them. Workers that rewrite a file
/// use this size, never a fresh stat, so concurrent rewrites cannot
/// shrink the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Corpus discovery entry points
pub struct FileCorpus;

impl FileCorpus {
    /// Every regular file beneath `root`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `root` is not a directory, `Io` on the first
    /// entry that cannot be read.
    pub fn enumerate(root: &Path) -> DrillResult<Vec<FileSpec>> {
        Self::walk(root)?.collect()
    }

    /// Lazy variant of [`FileCorpus::enumerate`]
    ///
    /// Directories are listed only when the walk reaches them. A directory
    /// that cannot be listed yields one `Err` and the walk continues with
    /// the rest of the tree.
    pub fn walk(root: &Path) -> DrillResult<CorpusWalk> {
        if !root.is_dir() {
            return Err(DrillError::invalid(format!("{} is not a directory", root.display())));
        }
        let entries = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Ok(CorpusWalk { entries })
    }
}

/// Depth-first walk over a corpus root
pub struct CorpusWalk {
    entries: walkdir::IntoIter,
}

impl std::fmt::Debug for CorpusWalk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusWalk").finish_non_exhaustive()
    }
}

fn walk_error(err: walkdir::Error) -> DrillError {
    let context = match err.path() {
        Some(path) => format!("walk failed: {}", path.display()),
        None => "walk failed".to_string(),
    };
    DrillError::Io {
        context,
        source: io::Error::from(err),
    }
}

impl Iterator for CorpusWalk {
    type Item = DrillResult<FileSpec>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(walk_error(e))),
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            // follow_links(false): a link reports itself, so resolve it here
            let meta = if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => meta,
                    // dangling, or a link to a directory
                    _ => continue,
                }
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(meta) => meta,
                    Err(e) => return Some(Err(walk_error(e))),
                }
            } else {
                continue;
            };

            return Some(Ok(FileSpec {
                path: entry.into_path(),
                size_bytes: meta.len(),
            }));
        }
    }
}
