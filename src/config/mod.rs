//! Configuration module
//!
//! Handles CLI argument parsing, TOML run files, and validation.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::corpus::WorkSource;
use crate::engine::{AccessPattern, BackendKind};
use crate::util::buffer::FillKind;
use crate::worker::{Operation, PoolConfig};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration of a pool run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Per-target operation as named in run files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    WriteFill,
    WriteRandomBlock,
    Copy,
    #[default]
    ReadSweep,
    ReadRandomBlock,
    Stat,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::WriteFill => "write-fill",
            OperationKind::WriteRandomBlock => "write-random-block",
            OperationKind::Copy => "copy",
            OperationKind::ReadSweep => "read-sweep",
            OperationKind::ReadRandomBlock => "read-random-block",
            OperationKind::Stat => "stat",
        };
        write!(f, "{}", name)
    }
}

/// How workers consume the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsumptionMode {
    /// Every file once, then the workers exit
    Cursor,
    /// Uniform picks with replacement until stopped
    #[default]
    Sampler,
}

impl fmt::Display for ConsumptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumptionMode::Cursor => write!(f, "cursor"),
            ConsumptionMode::Sampler => write!(f, "sampler"),
        }
    }
}

/// What each worker does
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default)]
    pub operation: OperationKind,
    #[serde(default)]
    pub pattern: AccessPattern,
    #[serde(default = "default_block_size")]
    pub block_size: u64,
    /// fsync before a write reports completion
    #[serde(default)]
    pub durable: bool,
    /// Content for `write-fill`
    #[serde(default)]
    pub fill: FillKind,
    /// Destination directory for `copy`
    pub dest: Option<PathBuf>,
}

fn default_block_size() -> u64 {
    1024
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            operation: OperationKind::default(),
            pattern: AccessPattern::default(),
            block_size: default_block_size(),
            durable: false,
            fill: FillKind::default(),
            dest: None,
        }
    }
}

/// Where the targets come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory walked for target files
    #[serde(default)]
    pub root: PathBuf,
    #[serde(default)]
    pub mode: ConsumptionMode,
}

/// Worker thread configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker threads
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub backend: BackendKind,
    /// Base seed for reproducible patterns
    pub seed: Option<u64>,
}

fn default_threads() -> usize {
    num_cpus::get()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            backend: BackendKind::default(),
            seed: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON report file
    pub json_output: Option<PathBuf>,
    #[serde(default)]
    pub json_pretty: bool,
    /// Live progress interval in milliseconds
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// Disable the live progress line
    #[serde(default)]
    pub no_progress: bool,
}

fn default_progress_interval_ms() -> u64 {
    1000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_output: None,
            json_pretty: false,
            progress_interval_ms: default_progress_interval_ms(),
            no_progress: false,
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Stop the pool after this many milliseconds; runs until interrupted
    /// (or until a cursor corpus is drained) when unset
    pub duration_ms: Option<u64>,
}

impl Config {
    /// The per-target operation with its parameters filled in
    pub fn operation(&self) -> Result<Operation> {
        let op = match self.workload.operation {
            OperationKind::WriteFill => Operation::WriteFill {
                fill: self.workload.fill,
            },
            OperationKind::WriteRandomBlock => Operation::WriteRandomBlock,
            OperationKind::Copy => {
                let dest = self
                    .workload
                    .dest
                    .clone()
                    .context("copy operation requires a destination directory")?;
                Operation::Copy { dest }
            }
            OperationKind::ReadSweep => Operation::ReadSweep,
            OperationKind::ReadRandomBlock => Operation::ReadRandomBlock,
            OperationKind::Stat => Operation::Stat,
        };
        Ok(op)
    }

    pub fn pool_config(&self) -> Result<PoolConfig> {
        Ok(PoolConfig {
            threads: self.workers.threads,
            operation: self.operation()?,
            pattern: self.workload.pattern,
            block_size: self.workload.block_size,
            durable: self.workload.durable,
            backend: self.workers.backend,
            seed: self.workers.seed,
        })
    }

    /// Open the corpus in the configured consumption mode
    pub fn work_source(&self) -> Result<WorkSource> {
        let root = &self.corpus.root;
        let source = match self.corpus.mode {
            ConsumptionMode::Cursor => WorkSource::cursor(root),
            ConsumptionMode::Sampler => WorkSource::sampler(root),
        };
        source.with_context(|| format!("Failed to open corpus: {}", root.display()))
    }

    pub fn duration(&self) -> Option<Duration> {
        self.runtime.duration_ms.map(Duration::from_millis)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.output.progress_interval_ms)
    }
}
