//! IO backend abstraction
//!
//! This module defines the five IO primitives every backend provides and the
//! shared rules they all follow. A backend is chosen once, at construction,
//! through [`BackendKind`]; workers never inspect the platform at runtime.
//!
//! # Primitives
//!
//! - `write_fill`: create or truncate a file and fill it block by block
//! - `write_random_block`: overwrite one block at a random offset
//! - `copy`: copy a file in a given traversal order
//! - `read_sweep`: read a whole file in a given traversal order
//! - `read_random_block`: read one block at a random offset
//!
//! All primitives take paths, not open handles. Each opens what it needs as
//! an owned `File` and drops it before returning, on success or failure.
//! None of them retry; errors go straight back to the caller.
//!
//! # Backends
//!
//! - **Sync**: positioned `pread`/`pwrite`/`fsync` on raw descriptors (Unix)
//! - **Stream**: `Seek` + `Read`/`Write` on `std::fs::File` (portable)
//! - **Mock**: in-memory recorder with failure injection, for tests
//!
//! # Example
//!
//! ```no_run
//! use fsdrill::engine::{create_backend, BackendKind, FillKind};
//! use fsdrill::pattern::AccessPattern;
//! use std::path::Path;
//!
//! let mut backend = create_backend(BackendKind::Stream, Some(7))?;
//! backend.write_fill(Path::new("/tmp/a.dat"), 1 << 20, 64 * 1024, FillKind::Random, false)?;
//! backend.copy(Path::new("/tmp/a.dat"), Path::new("/tmp/b.dat"), 64 * 1024, AccessPattern::Converging, true)?;
//! # Ok::<(), fsdrill::error::DrillError>(())
//! ```

use crate::error::{DrillError, DrillResult, IoContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use crate::pattern::AccessPattern;
pub use crate::util::buffer::FillKind;

pub mod mock;
pub(crate) mod primitives;
pub mod stream;
#[cfg(unix)]
pub mod sync;

/// The five IO primitives
///
/// Every method returns the number of bytes moved. Backends are `Send` so a
/// worker thread can own one, but are not shared between threads.
pub trait IoBackend: Send {
    /// Create or truncate `path` and write `size` bytes of `fill` content
    ///
    /// Blocks are `block_size` bytes, the last one truncated to the
    /// remainder. With `durable` the data is flushed to stable storage
    /// before returning.
    fn write_fill(
        &mut self,
        path: &Path,
        size: u64,
        block_size: u64,
        fill: FillKind,
        durable: bool,
    ) -> DrillResult<u64>;

    /// Overwrite one block of random bytes at a random offset
    ///
    /// The offset is uniform in `[0, file_size - block_size]`. The file is
    /// opened without truncation and is never extended, so bytes outside the
    /// chosen block and the file length stay as they were.
    fn write_random_block(&mut self, path: &Path, block_size: u64, durable: bool) -> DrillResult<u64>;

    /// Copy `src` to `dst` in the given order
    ///
    /// When `dst` is a directory the destination is `dst/<basename of src>`.
    /// Copying a file onto itself is rejected before anything is opened for
    /// writing.
    fn copy(
        &mut self,
        src: &Path,
        dst: &Path,
        block_size: u64,
        order: AccessPattern,
        durable: bool,
    ) -> DrillResult<u64>;

    /// Read the whole file in the given order, discarding the data
    fn read_sweep(&mut self, path: &Path, block_size: u64, order: AccessPattern) -> DrillResult<u64>;

    /// Read one block at a random offset
    fn read_random_block(&mut self, path: &Path, block_size: u64) -> DrillResult<u64>;

    /// Describe the backend
    fn capabilities(&self) -> BackendCapabilities;
}

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Raw descriptors with pread/pwrite (Unix only)
    Sync,
    /// Handle-based std::fs::File streams
    Stream,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(unix) {
            Self::Sync
        } else {
            Self::Stream
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sync => write!(f, "sync"),
            BackendKind::Stream => write!(f, "stream"),
        }
    }
}

/// Backend description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub name: &'static str,
    /// IO goes through raw file descriptors
    pub raw_descriptors: bool,
    /// Reads and writes carry their own offset (no shared file cursor)
    pub positioned_io: bool,
}

/// Create a backend
///
/// `seed` fixes the generator used for shuffles and random offsets.
///
/// # Errors
///
/// `InvalidArgument` when the requested backend is not available on this
/// platform.
pub fn create_backend(kind: BackendKind, seed: Option<u64>) -> DrillResult<Box<dyn IoBackend>> {
    let backend: Box<dyn IoBackend> = match kind {
        #[cfg(unix)]
        BackendKind::Sync => Box::new(sync::SyncBackend::new(seed)),

        #[cfg(not(unix))]
        BackendKind::Sync => {
            return Err(DrillError::invalid("sync backend is only available on Unix"));
        }

        BackendKind::Stream => Box::new(stream::StreamBackend::new(seed)),
    };

    Ok(backend)
}

/// Resolve a copy destination
///
/// A directory destination receives the source's base name.
pub fn resolve_destination(src: &Path, dst: &Path) -> PathBuf {
    if dst.is_dir() {
        if let Some(name) = src.file_name() {
            return dst.join(name);
        }
    }
    dst.to_path_buf()
}

/// Reject a copy whose source and destination are the same file
pub fn ensure_distinct(src: &Path, dst: &Path) -> DrillResult<()> {
    if same_file(src, dst)? {
        return Err(DrillError::invalid(format!(
            "'{}' and '{}' are the same file",
            src.display(),
            dst.display()
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> DrillResult<bool> {
    use std::os::unix::fs::MetadataExt;

    let meta_a = std::fs::metadata(a).io_context("stat", a)?;
    let meta_b = match std::fs::metadata(b) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e).io_context("stat", b),
    };

    Ok(meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino())
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> DrillResult<bool> {
    let canon_a = std::fs::canonicalize(a).io_context("canonicalize", a)?;
    match std::fs::canonicalize(b) {
        Ok(canon_b) => Ok(canon_a == canon_b),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).io_context("canonicalize", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_destination_directory() {
        let dir = TempDir::new().unwrap();
        let src = Path::new("/some/where/data.bin");
        assert_eq!(resolve_destination(src, dir.path()), dir.path().join("data.bin"));
    }

    #[test]
    fn test_resolve_destination_file() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("out.bin");
        assert_eq!(resolve_destination(Path::new("in.bin"), &dst), dst);
    }

    #[test]
    fn test_ensure_distinct_same_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.dat");
        std::fs::write(&file, b"abc").unwrap();

        let err = ensure_distinct(&file, &file).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_ensure_distinct_missing_destination() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.dat");
        std::fs::write(&file, b"abc").unwrap();

        assert!(ensure_distinct(&file, &dir.path().join("b.dat")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_distinct_hard_link() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.dat");
        let link = dir.path().join("link.dat");
        std::fs::write(&file, b"abc").unwrap();
        std::fs::hard_link(&file, &link).unwrap();

        assert!(ensure_distinct(&file, &link).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_create_backend_stream() {
        let backend = create_backend(BackendKind::Stream, Some(1)).unwrap();
        assert_eq!(backend.capabilities().name, "stream");
    }

    #[cfg(unix)]
    #[test]
    fn test_create_backend_sync() {
        let backend = create_backend(BackendKind::Sync, None).unwrap();
        let caps = backend.capabilities();
        assert_eq!(caps.name, "sync");
        assert!(caps.raw_descriptors);
        assert!(caps.positioned_io);
    }
}
