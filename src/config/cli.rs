//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    /// Ascending offsets
    Sequential,
    /// Every block once, in shuffled order
    RandomShuffle,
    /// First, last, second, second-to-last, ...
    Converging,
    /// One block at a random offset
    RandomSingleBlock,
}

/// Written content
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FillArg {
    Zero,
    /// One random block per file, repeated
    Srandom,
    Random,
}

/// IO backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// pread/pwrite on raw descriptors
    Sync,
    /// Seek + read/write on file handles
    Stream,
}

/// Per-target operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    WriteFill,
    WriteRandomBlock,
    Copy,
    ReadSweep,
    ReadRandomBlock,
    Stat,
}

/// Corpus consumption mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Visit every file once
    Cursor,
    /// Pick files at random until stopped
    Sampler,
}

/// fsdrill - filesystem IO exercise toolkit
#[derive(Parser, Debug)]
#[command(name = "fsdrill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a corpus of synthetic files
    Generate(GenerateArgs),
    /// Drive a worker pool against a corpus until stopped
    Run(RunArgs),
    /// Copy one file in a chosen block order
    Copy(CopyArgs),
    /// Read every file of a corpus once
    Read(ReadArgs),
    /// Create a nested directory tree
    Tree(TreeArgs),
    /// Time a transfer with the system dd
    Dd(DdArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory receiving the files
    #[arg(value_name = "DIR")]
    pub dst: PathBuf,

    /// Smallest file size (e.g., 4k, 1M)
    #[arg(long, default_value = "1k")]
    pub min_size: String,

    /// Largest file size
    #[arg(long, default_value = "1k")]
    pub max_size: String,

    /// Number of files
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// File content
    #[arg(long, value_enum, default_value = "zero")]
    pub fill: FillArg,

    /// Block size for writes
    #[arg(short = 'b', long, default_value = "1k")]
    pub block_size: String,

    /// Files per numbered subdirectory
    #[arg(long)]
    pub split: Option<usize>,

    /// fsync every file before counting it written
    #[arg(long)]
    pub durable: bool,

    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Seed for the file size draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Writer threads (default: one per CPU)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Corpus root directory
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// TOML run file; flags given here override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    #[arg(short = 'o', long, value_enum)]
    pub operation: Option<OperationArg>,

    #[arg(short = 'p', long, value_enum)]
    pub pattern: Option<PatternArg>,

    /// Content for write-fill
    #[arg(long, value_enum)]
    pub fill: Option<FillArg>,

    /// Destination directory for copy
    #[arg(long)]
    pub dest: Option<PathBuf>,

    #[arg(short = 'm', long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Number of worker threads
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Block size (e.g., 4k, 1M)
    #[arg(short = 'b', long)]
    pub block_size: Option<String>,

    /// Stop after this long (e.g., 500ms, 30s, 5m)
    #[arg(short = 'd', long)]
    pub duration: Option<String>,

    /// fsync before each write completes
    #[arg(long)]
    pub durable: bool,

    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Live progress interval (e.g., 1s, 250ms)
    #[arg(long)]
    pub progress_interval: Option<String>,

    /// Disable the live progress line
    #[arg(long)]
    pub no_progress: bool,

    /// Write a JSON report to this file
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub json_pretty: bool,
}

#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Source file
    #[arg(value_name = "SRC")]
    pub src: PathBuf,

    /// Destination file or directory
    #[arg(value_name = "DST")]
    pub dst: PathBuf,

    #[arg(short = 'p', long, value_enum, default_value = "sequential")]
    pub pattern: PatternArg,

    #[arg(short = 'b', long, default_value = "1k")]
    pub block_size: String,

    #[arg(long)]
    pub durable: bool,

    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Corpus root directory
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    #[arg(short = 'p', long, value_enum, default_value = "sequential")]
    pub pattern: PatternArg,

    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    #[arg(short = 'b', long, default_value = "1k")]
    pub block_size: String,

    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Write a JSON report to this file
    #[arg(long)]
    pub json_output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Top of the tree
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Subdirectories per directory
    #[arg(short = 'w', long, default_value = "2")]
    pub width: usize,

    /// Levels below the root
    #[arg(short = 'd', long, default_value = "2")]
    pub depth: usize,
}

#[derive(Args, Debug)]
pub struct DdArgs {
    /// Input file (dd if=)
    #[arg(long = "if", value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (dd of=)
    #[arg(long = "of", value_name = "OUTPUT")]
    pub output: PathBuf,

    #[arg(short = 'b', long, default_value = "1M")]
    pub block_size: String,

    /// Blocks to transfer (default: until EOF)
    #[arg(long)]
    pub count: Option<u64>,
}
