//! Statistics collection
//!
//! Two layers:
//!
//! - [`PoolCounters`]: lock-free, cache-line aligned totals shared by all
//!   workers of a pool and read by the live progress display while the pool
//!   runs.
//! - [`WorkerStats`]: owned by one worker thread (latency histogram, error
//!   detail) and merged into the pool report at join.
//!
//! # Example
//!
//! ```
//! use fsdrill::stats::WorkerStats;
//! use std::time::Duration;
//!
//! let mut stats = WorkerStats::new();
//! stats.record_op(4096, Duration::from_micros(100));
//! stats.record_error("read failed: /tmp/x");
//!
//! assert_eq!(stats.ops(), 1);
//! assert_eq!(stats.errors(), 1);
//! ```

pub mod histogram;
pub mod live;

use crate::Result;
use histogram::LatencyHistogram;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cache-line aligned atomic counter to prevent false sharing
///
/// ```text
/// [value: 8 bytes][padding: 56 bytes] = 64 bytes total
/// ```
#[repr(align(64))]
#[derive(Debug)]
pub struct AlignedCounter {
    value: AtomicU64,
    _padding: [u8; 56],
}

impl AlignedCounter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; 56],
        }
    }

    /// Relaxed add; counters carry no ordering relationship to each other
    #[inline]
    pub fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for AlignedCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Totals shared by every worker of one pool
#[derive(Debug, Default)]
pub struct PoolCounters {
    pub ops: AlignedCounter,
    pub bytes: AlignedCounter,
    pub errors: AlignedCounter,
}

/// Point-in-time copy of [`PoolCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub ops: u64,
    pub bytes: u64,
    pub errors: u64,
}

impl PoolCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            ops: self.ops.get(),
            bytes: self.bytes.get(),
            errors: self.errors.get(),
        }
    }
}

/// Statistics owned by one worker
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    ops: u64,
    bytes: u64,
    errors: u64,
    last_error: Option<String>,
    latency: LatencyHistogram,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful primitive call
    #[inline]
    pub fn record_op(&mut self, bytes: u64, latency: Duration) {
        self.ops += 1;
        self.bytes += bytes;
        self.latency.record(latency);
    }

    /// Record one failed primitive call, keeping its message
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors += 1;
        self.last_error = Some(message.into());
    }

    pub fn ops(&self) -> u64 {
        self.ops
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn latency(&self) -> &LatencyHistogram {
        &self.latency
    }

    /// Fold another worker's statistics into this one
    ///
    /// The last error of `other` wins when it has one.
    pub fn merge(&mut self, other: &WorkerStats) -> Result<()> {
        self.ops += other.ops;
        self.bytes += other.bytes;
        self.errors += other.errors;
        if other.last_error.is_some() {
            self.last_error = other.last_error.clone();
        }
        self.latency.merge(&other.latency)
    }
}
