//! Error taxonomy for the access-pattern engine
//!
//! Core modules (pattern, engine, corpus, worker) return [`DrillResult`] so
//! callers can tell a bad argument apart from a storage failure. The binary
//! and configuration layers wrap these in `anyhow::Error` with context.
//!
//! Cancellation is not represented here: an orderly stop is reported through
//! [`crate::worker::WorkerExit::Cancelled`].

use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by the engine primitives
#[derive(Debug, Error)]
pub enum DrillError {
    /// Caller supplied something the operation cannot act on
    ///
    /// Zero block size, block size larger than the file, copy onto itself,
    /// corpus root that is not a directory.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Create/open/read/write/flush failure, or a short copy
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl DrillError {
    /// Build an `InvalidArgument` from anything printable
    pub fn invalid(msg: impl Into<String>) -> Self {
        DrillError::InvalidArgument(msg.into())
    }

    /// Build an `Io` error that did not originate from a syscall
    pub fn io_other(context: impl Into<String>, msg: impl Into<String>) -> Self {
        DrillError::Io {
            context: context.into(),
            source: io::Error::new(io::ErrorKind::Other, msg.into()),
        }
    }

    /// True for `InvalidArgument`
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DrillError::InvalidArgument(_))
    }

    /// True for `Io`
    pub fn is_io(&self) -> bool {
        matches!(self, DrillError::Io { .. })
    }
}

/// Result alias for engine operations
pub type DrillResult<T> = std::result::Result<T, DrillError>;

/// Attach a path-bearing context to `std::io` results
pub(crate) trait IoContext<T> {
    fn io_context(self, what: &str, path: &Path) -> DrillResult<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, what: &str, path: &Path) -> DrillResult<T> {
        self.map_err(|source| DrillError::Io {
            context: format!("{} failed: {}", what, path.display()),
            source,
        })
    }
}
