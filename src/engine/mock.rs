//! Mock IO backend for testing
//!
//! This module provides an implementation of [`IoBackend`] that never touches
//! the filesystem. It records every call, can be told to fail (always, or
//! only for chosen paths), and can add a fixed delay per call so worker tests
//! can reason about timing.
//!
//! # Example
//!
//! ```
//! use fsdrill::engine::{IoBackend, AccessPattern};
//! use fsdrill::engine::mock::{MockBackend, Primitive};
//! use std::path::Path;
//!
//! let mock = MockBackend::new();
//! let mut backend = mock.clone();
//! backend.read_sweep(Path::new("a"), 4096, AccessPattern::Sequential).unwrap();
//!
//! let calls = mock.calls();
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].primitive, Primitive::ReadSweep);
//! ```

use super::{AccessPattern, BackendCapabilities, FillKind, IoBackend};
use crate::error::{DrillError, DrillResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Which primitive a call went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    WriteFill,
    WriteRandomBlock,
    Copy,
    ReadSweep,
    ReadRandomBlock,
}

/// Record of one call for test verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub primitive: Primitive,
    pub path: PathBuf,
    /// Copy destination as given by the caller
    pub dest: Option<PathBuf>,
    pub block_size: u64,
    pub order: Option<AccessPattern>,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<CallRecord>,
    should_fail: bool,
    fail_paths: HashSet<PathBuf>,
    delay: Option<Duration>,
    /// Bytes reported by whole-file primitives; 0 means use the block size
    file_size: u64,
}

/// Mock backend
///
/// Clones share state, so a test keeps one handle for inspection and hands
/// clones to workers.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the records from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fail every call
    pub fn set_should_fail(&self, should_fail: bool) {
        self.lock().should_fail = should_fail;
    }

    /// Fail calls whose path (or copy destination) is `path`
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.lock().fail_paths.insert(path.into());
    }

    /// Sleep this long inside every call
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Bytes reported by read sweeps and copies
    pub fn set_file_size(&self, size: u64) {
        self.lock().file_size = size;
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn record(&self, record: CallRecord, bytes: u64) -> DrillResult<u64> {
        let delay = {
            let mut state = self.lock();
            let fail = state.should_fail
                || state.fail_paths.contains(&record.path)
                || record.dest.as_ref().map_or(false, |d| state.fail_paths.contains(d));
            let path = record.path.clone();
            state.calls.push(record);
            if fail {
                return Err(DrillError::io_other(
                    format!("mock failed: {}", path.display()),
                    "injected failure",
                ));
            }
            state.delay
        };

        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        Ok(bytes)
    }

    fn whole_file_bytes(&self, block_size: u64) -> u64 {
        match self.lock().file_size {
            0 => block_size,
            size => size,
        }
    }
}

impl IoBackend for MockBackend {
    fn write_fill(
        &mut self,
        path: &Path,
        size: u64,
        block_size: u64,
        _fill: FillKind,
        _durable: bool,
    ) -> DrillResult<u64> {
        let record = CallRecord {
            primitive: Primitive::WriteFill,
            path: path.to_path_buf(),
            dest: None,
            block_size,
            order: None,
        };
        self.record(record, size)
    }

    fn write_random_block(&mut self, path: &Path, block_size: u64, _durable: bool) -> DrillResult<u64> {
        let record = CallRecord {
            primitive: Primitive::WriteRandomBlock,
            path: path.to_path_buf(),
            dest: None,
            block_size,
            order: None,
        };
        self.record(record, block_size)
    }

    fn copy(
        &mut self,
        src: &Path,
        dst: &Path,
        block_size: u64,
        order: AccessPattern,
        _durable: bool,
    ) -> DrillResult<u64> {
        let record = CallRecord {
            primitive: Primitive::Copy,
            path: src.to_path_buf(),
            dest: Some(dst.to_path_buf()),
            block_size,
            order: Some(order),
        };
        let bytes = self.whole_file_bytes(block_size);
        self.record(record, bytes)
    }

    fn read_sweep(&mut self, path: &Path, block_size: u64, order: AccessPattern) -> DrillResult<u64> {
        let record = CallRecord {
            primitive: Primitive::ReadSweep,
            path: path.to_path_buf(),
            dest: None,
            block_size,
            order: Some(order),
        };
        let bytes = self.whole_file_bytes(block_size);
        self.record(record, bytes)
    }

    fn read_random_block(&mut self, path: &Path, block_size: u64) -> DrillResult<u64> {
        let record = CallRecord {
            primitive: Primitive::ReadRandomBlock,
            path: path.to_path_buf(),
            dest: None,
            block_size,
            order: None,
        };
        self.record(record, block_size)
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            name: "mock",
            raw_descriptors: false,
            positioned_io: false,
        }
    }
}
