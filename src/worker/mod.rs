//! Worker pool
//!
//! A fixed pool of OS threads that repeatedly applies one [`Operation`] to
//! files drawn from a shared [`WorkSource`] until told to stop or, for a
//! cursor, until the corpus is exhausted.
//!
//! # Worker loop
//!
//! 1. Check the [`StopSignal`]; exit `Cancelled` if set
//! 2. Take the next target (cursor: exit `Exhausted` when there is none)
//! 3. Run the operation through the worker's own backend
//! 4. Record bytes and latency, or the error
//!
//! The signal is observed only between iterations, never in the middle of a
//! primitive, so shutdown latency is bounded by the slowest in-flight call.
//! There are no per-call timeouts: a hung storage call hangs its worker.
//!
//! # Failures
//!
//! Every failed call is counted, its message kept as the worker's last error,
//! and logged with `tracing::warn!`. In sampler mode the worker carries on
//! with the next pick. In cursor mode the failing worker exits `Failed`; the
//! other workers keep draining the cursor.
//!
//! # Example
//!
//! ```no_run
//! use fsdrill::corpus::WorkSource;
//! use fsdrill::worker::{Operation, PoolConfig, WorkerPool};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let source = WorkSource::sampler(Path::new("/mnt/test/corpus"))?;
//! let config = PoolConfig { threads: 4, operation: Operation::ReadSweep, ..Default::default() };
//!
//! let pool = WorkerPool::run(config, source)?;
//! std::thread::sleep(Duration::from_secs(10));
//! pool.stop();
//! let report = pool.join();
//! println!("{} ops, {} errors", report.totals.ops(), report.totals.errors());
//! # Ok::<(), fsdrill::error::DrillError>(())
//! ```

use crate::corpus::{FileSpec, WorkSource};
use crate::engine::{create_backend, AccessPattern, BackendKind, FillKind, IoBackend};
use crate::error::{DrillError, DrillResult, IoContext};
use crate::stats::{PoolCounters, WorkerStats};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Shared cancellation flag
///
/// Set once and never reset. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown; calling it again has no further effect
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What each worker does to every target it takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Rewrite the target at its current size with `fill` content
    WriteFill { fill: FillKind },
    /// Overwrite one random block of the target
    WriteRandomBlock,
    /// Copy the target into the `dest` directory
    Copy { dest: PathBuf },
    /// Read the whole target in the pool's access pattern
    ReadSweep,
    /// Read one random block of the target
    ReadRandomBlock,
    /// Open the target and fstat it
    Stat,
}

impl Default for Operation {
    fn default() -> Self {
        Operation::ReadSweep
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::WriteFill { fill } => write!(f, "write-fill ({})", fill),
            Operation::WriteRandomBlock => write!(f, "write-random-block"),
            Operation::Copy { dest } => write!(f, "copy -> {}", dest.display()),
            Operation::ReadSweep => write!(f, "read-sweep"),
            Operation::ReadRandomBlock => write!(f, "read-random-block"),
            Operation::Stat => write!(f, "stat"),
        }
    }
}

/// Pool settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub threads: usize,
    pub operation: Operation,
    /// Traversal order for sweeps and copies
    pub pattern: AccessPattern,
    pub block_size: u64,
    pub durable: bool,
    pub backend: BackendKind,
    /// Base seed; worker `i` uses `seed + i`
    pub seed: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            operation: Operation::default(),
            pattern: AccessPattern::default(),
            block_size: 1024,
            durable: false,
            backend: BackendKind::default(),
            seed: None,
        }
    }
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The stop signal was observed
    Cancelled,
    /// The cursor ran out of files
    Exhausted,
    /// A call failed in cursor mode, or the thread panicked
    Failed,
}

/// Final state of one worker
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub id: usize,
    pub exit: WorkerExit,
    pub stats: WorkerStats,
}

/// Result of [`WorkerPool::join`]
#[derive(Debug, Clone)]
pub struct PoolReport {
    pub workers: Vec<WorkerReport>,
    /// All workers merged
    pub totals: WorkerStats,
    /// From pool start to the last join
    pub elapsed: Duration,
}

impl PoolReport {
    pub fn failed_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.exit == WorkerExit::Failed).count()
    }
}

/// Everything one worker thread owns
struct WorkerContext {
    id: usize,
    config: Arc<PoolConfig>,
    source: WorkSource,
    backend: Box<dyn IoBackend>,
    rng: Xoshiro256PlusPlus,
    stop: StopSignal,
    counters: Arc<PoolCounters>,
}

impl WorkerContext {
    fn run(mut self) -> WorkerReport {
        let mut stats = WorkerStats::new();
        let exit = self.run_loop(&mut stats);
        tracing::debug!(worker = self.id, ?exit, ops = stats.ops(), "worker finished");
        WorkerReport {
            id: self.id,
            exit,
            stats,
        }
    }

    fn run_loop(&mut self, stats: &mut WorkerStats) -> WorkerExit {
        loop {
            if self.stop.is_triggered() {
                return WorkerExit::Cancelled;
            }

            let target = match self.source.next_target(&mut self.rng) {
                None => return WorkerExit::Exhausted,
                Some(Ok(spec)) => spec,
                Some(Err(e)) => {
                    if self.record_failure(stats, None, &e) {
                        return WorkerExit::Failed;
                    }
                    continue;
                }
            };

            let start = Instant::now();
            match self.execute(&target) {
                Ok(bytes) => {
                    stats.record_op(bytes, start.elapsed());
                    self.counters.ops.add(1);
                    self.counters.bytes.add(bytes);
                }
                Err(e) => {
                    if self.record_failure(stats, Some(&target.path), &e) {
                        return WorkerExit::Failed;
                    }
                }
            }
        }
    }

    /// Record a failure; returns whether the worker must terminate
    fn record_failure(&self, stats: &mut WorkerStats, target: Option<&Path>, err: &DrillError) -> bool {
        stats.record_error(err.to_string());
        self.counters.errors.add(1);
        let path = target.map(|p| p.display().to_string()).unwrap_or_default();
        tracing::warn!(worker = self.id, path = %path, error = %err, "operation failed");
        self.source.is_cursor()
    }

    /// Rewrites keep the size recorded when the corpus was listed, so
    /// concurrent writers to one file cannot shrink it
    fn execute(&mut self, spec: &FileSpec) -> DrillResult<u64> {
        let cfg = &*self.config;
        let target = spec.path.as_path();
        match &cfg.operation {
            Operation::WriteFill { fill } => {
                self.backend
                    .write_fill(target, spec.size_bytes, cfg.block_size, *fill, cfg.durable)
            }
            Operation::WriteRandomBlock => {
                self.backend.write_random_block(target, cfg.block_size, cfg.durable)
            }
            Operation::Copy { dest } => {
                self.backend
                    .copy(target, dest, cfg.block_size, cfg.pattern, cfg.durable)
            }
            Operation::ReadSweep => self.backend.read_sweep(target, cfg.block_size, cfg.pattern),
            Operation::ReadRandomBlock => self.backend.read_random_block(target, cfg.block_size),
            Operation::Stat => stat_file(target),
        }
    }
}

/// Open `path` and fstat the open handle
pub fn stat_file(path: &Path) -> DrillResult<u64> {
    let file = File::open(path).io_context("open", path)?;
    file.metadata().io_context("fstat", path)?;
    Ok(0)
}

/// A running pool of workers
pub struct WorkerPool {
    handles: Vec<(usize, JoinHandle<WorkerReport>)>,
    stop: StopSignal,
    counters: Arc<PoolCounters>,
    started: Instant,
}

impl WorkerPool {
    /// Spawn `config.threads` workers with backends of `config.backend`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero thread count or block size, a copy
    /// destination that is not a directory, or an unavailable backend. `Io`
    /// if a thread cannot be spawned. No worker is left running on error.
    pub fn run(config: PoolConfig, source: WorkSource) -> DrillResult<WorkerPool> {
        let kind = config.backend;
        let seed = config.seed;
        Self::run_with(config, source, |id| {
            create_backend(kind, seed.map(|s| s.wrapping_add(id as u64)))
        })
    }

    /// Like [`WorkerPool::run`] with a caller-supplied backend per worker
    pub fn run_with<F>(config: PoolConfig, source: WorkSource, mut make_backend: F) -> DrillResult<WorkerPool>
    where
        F: FnMut(usize) -> DrillResult<Box<dyn IoBackend>>,
    {
        validate(&config)?;

        // Build every backend before any thread starts
        let backends = (0..config.threads)
            .map(&mut make_backend)
            .collect::<DrillResult<Vec<_>>>()?;

        let config = Arc::new(config);
        let stop = StopSignal::new();
        let counters = Arc::new(PoolCounters::new());
        let mut pool = WorkerPool {
            handles: Vec::with_capacity(config.threads),
            stop: stop.clone(),
            counters: counters.clone(),
            started: Instant::now(),
        };

        tracing::info!(
            threads = config.threads,
            operation = %config.operation,
            pattern = %config.pattern,
            cursor = source.is_cursor(),
            "starting worker pool"
        );

        for (id, backend) in backends.into_iter().enumerate() {
            let rng = match config.seed {
                Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(id as u64)),
                None => Xoshiro256PlusPlus::from_entropy(),
            };
            let ctx = WorkerContext {
                id,
                config: config.clone(),
                source: source.clone(),
                backend,
                rng,
                stop: stop.clone(),
                counters: counters.clone(),
            };

            let spawned = std::thread::Builder::new()
                .name(format!("fsdrill-worker-{}", id))
                .spawn(move || ctx.run());

            match spawned {
                Ok(handle) => pool.handles.push((id, handle)),
                Err(e) => {
                    pool.stop();
                    let _ = pool.join();
                    return Err(DrillError::Io {
                        context: format!("spawn failed: worker {}", id),
                        source: e,
                    });
                }
            }
        }

        Ok(pool)
    }

    /// Ask every worker to stop after its current call
    pub fn stop(&self) {
        self.stop.trigger();
    }

    /// A handle that stops this pool, for signal handlers
    pub fn stop_handle(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Live totals across all workers
    pub fn counters(&self) -> Arc<PoolCounters> {
        self.counters.clone()
    }

    /// True once every worker thread has returned
    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(|(_, h)| h.is_finished())
    }

    /// Wait for every worker and merge their statistics
    ///
    /// A worker thread that panicked is reported as `Failed` with empty
    /// statistics.
    pub fn join(self) -> PoolReport {
        let mut workers = Vec::with_capacity(self.handles.len());
        for (id, handle) in self.handles {
            let report = match handle.join() {
                Ok(report) => report,
                Err(_) => {
                    tracing::error!(worker = id, "worker thread panicked");
                    let mut stats = WorkerStats::new();
                    stats.record_error(format!("worker {} panicked", id));
                    WorkerReport {
                        id,
                        exit: WorkerExit::Failed,
                        stats,
                    }
                }
            };
            workers.push(report);
        }

        let mut totals = WorkerStats::new();
        for worker in &workers {
            if let Err(e) = totals.merge(&worker.stats) {
                tracing::warn!(worker = worker.id, error = %e, "could not merge worker statistics");
            }
        }

        let elapsed = self.started.elapsed();
        tracing::info!(ops = totals.ops(), errors = totals.errors(), ?elapsed, "worker pool joined");

        PoolReport {
            workers,
            totals,
            elapsed,
        }
    }
}

fn validate(config: &PoolConfig) -> DrillResult<()> {
    if config.threads == 0 {
        return Err(DrillError::invalid("thread count must be greater than 0"));
    }
    if config.block_size == 0 {
        return Err(DrillError::invalid("block size must be greater than 0"));
    }
    if let Operation::Copy { dest } = &config.operation {
        if !dest.is_dir() {
            return Err(DrillError::invalid(format!(
                "copy destination {} is not a directory",
                dest.display()
            )));
        }
        if !config.pattern.is_map_based() {
            return Err(DrillError::invalid(format!("copy does not support the {} order", config.pattern)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{MockBackend, Primitive};
    use tempfile::TempDir;

    fn corpus(n: usize) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..n {
            std::fs::write(temp_dir.path().join(format!("f{}", i)), vec![0u8; 4096]).unwrap();
        }
        temp_dir
    }

    fn mock_config(threads: usize, operation: Operation) -> PoolConfig {
        PoolConfig {
            threads,
            operation,
            block_size: 512,
            seed: Some(1),
            ..Default::default()
        }
    }

    fn run_mock(config: PoolConfig, source: WorkSource, mock: &MockBackend) -> WorkerPool {
        let mock = mock.clone();
        WorkerPool::run_with(config, source, move |_| Ok(Box::new(mock.clone()) as Box<dyn IoBackend>)).unwrap()
    }

    #[test]
    fn test_stop_signal_idempotent() {
        let stop = StopSignal::new();
        let seen = stop.clone();
        assert!(!seen.is_triggered());
        stop.trigger();
        stop.trigger();
        assert!(seen.is_triggered());
    }

    #[test]
    fn test_cursor_pool_visits_each_file_once() {
        let dir = corpus(25);
        let mock = MockBackend::new();
        let source = WorkSource::cursor(dir.path()).unwrap();

        let pool = run_mock(mock_config(4, Operation::ReadSweep), source, &mock);
        let report = pool.join();

        assert_eq!(report.totals.ops(), 25);
        assert!(report.workers.iter().all(|w| w.exit == WorkerExit::Exhausted));
        let mut paths: Vec<_> = mock.calls().into_iter().map(|c| c.path).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 25);
    }

    #[test]
    fn test_cursor_failure_stops_only_that_worker() {
        let dir = corpus(20);
        let mock = MockBackend::new();
        mock.fail_on(dir.path().join("f3"));
        let source = WorkSource::cursor(dir.path()).unwrap();

        let report = run_mock(mock_config(3, Operation::ReadRandomBlock), source, &mock).join();

        assert_eq!(report.totals.errors(), 1);
        assert_eq!(report.failed_workers(), 1);
        // Remaining workers drained everything else
        assert_eq!(report.totals.ops(), 19);
        assert!(report.totals.last_error().unwrap().contains("f3"));
    }

    #[test]
    fn test_sampler_failure_keeps_running() {
        let dir = corpus(2);
        let mock = MockBackend::new();
        mock.set_should_fail(true);
        mock.set_delay(Duration::from_millis(1));
        let source = WorkSource::sampler(dir.path()).unwrap();

        let pool = run_mock(mock_config(2, Operation::WriteRandomBlock), source, &mock);
        std::thread::sleep(Duration::from_millis(50));
        pool.stop();
        let report = pool.join();

        assert!(report.totals.errors() > 2);
        assert_eq!(report.totals.ops(), 0);
        assert!(report.workers.iter().all(|w| w.exit == WorkerExit::Cancelled));
    }

    #[test]
    fn test_operation_dispatch() {
        let dir = corpus(1);
        let out = TempDir::new().unwrap();
        let cases = [
            (Operation::WriteFill { fill: FillKind::Random }, Primitive::WriteFill),
            (Operation::WriteRandomBlock, Primitive::WriteRandomBlock),
            (Operation::Copy { dest: out.path().to_path_buf() }, Primitive::Copy),
            (Operation::ReadSweep, Primitive::ReadSweep),
            (Operation::ReadRandomBlock, Primitive::ReadRandomBlock),
        ];

        for (operation, expected) in cases {
            let mock = MockBackend::new();
            let source = WorkSource::cursor(dir.path()).unwrap();
            run_mock(mock_config(1, operation), source, &mock).join();

            let calls = mock.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].primitive, expected);
        }
    }

    #[test]
    fn test_write_fill_uses_listed_size() {
        let dir = corpus(1);
        let mock = MockBackend::new();
        let source = WorkSource::sampler(dir.path()).unwrap();
        // shrink after listing; rewrites must keep the listed size
        std::fs::write(dir.path().join("f0"), b"tiny").unwrap();

        let pool = run_mock(mock_config(2, Operation::WriteFill { fill: FillKind::Zero }), source, &mock);
        std::thread::sleep(Duration::from_millis(20));
        pool.stop();
        let report = pool.join();

        assert!(report.totals.ops() > 0);
        assert_eq!(report.totals.bytes(), report.totals.ops() * 4096);
    }

    #[test]
    fn test_stat_operation_on_real_files() {
        let dir = corpus(6);
        let source = WorkSource::cursor(dir.path()).unwrap();
        let config = PoolConfig {
            threads: 2,
            operation: Operation::Stat,
            backend: BackendKind::Stream,
            ..Default::default()
        };

        let report = WorkerPool::run(config, source).unwrap().join();
        assert_eq!(report.totals.ops(), 6);
        assert_eq!(report.totals.bytes(), 0);
        assert_eq!(report.totals.errors(), 0);
    }

    #[test]
    fn test_run_validates_config() {
        let dir = corpus(1);
        let source = WorkSource::sampler(dir.path()).unwrap();

        let zero_threads = PoolConfig { threads: 0, ..Default::default() };
        assert!(WorkerPool::run(zero_threads, source.clone()).err().unwrap().is_invalid_argument());

        let bad_copy = PoolConfig {
            threads: 1,
            operation: Operation::Copy { dest: dir.path().join("f0") },
            ..Default::default()
        };
        assert!(WorkerPool::run(bad_copy, source).err().unwrap().is_invalid_argument());
    }

    #[test]
    fn test_stop_is_observed_between_calls() {
        let dir = corpus(3);
        let mock = MockBackend::new();
        mock.set_delay(Duration::from_millis(20));
        let source = WorkSource::sampler(dir.path()).unwrap();

        let pool = run_mock(mock_config(2, Operation::ReadSweep), source, &mock);
        let stop = pool.stop_handle();
        std::thread::sleep(Duration::from_millis(30));
        stop.trigger();

        let started = Instant::now();
        let report = pool.join();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(report.workers.iter().all(|w| w.exit == WorkerExit::Cancelled));
        assert_eq!(report.totals.ops(), mock.call_count() as u64);
    }
}
