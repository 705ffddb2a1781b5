//! fsdrill - filesystem IO exercise toolkit
//!
//! fsdrill generates synthetic files and drives configurable read/write
//! access patterns against them for storage performance and stress testing.
//!
//! # Architecture
//!
//! - **Access patterns**: block maps walked sequentially, shuffled,
//!   converging from both ends, or as a single random block
//! - **IO backends**: positioned `pread`/`pwrite` on raw descriptors, or
//!   portable seek + read/write streams
//! - **Worker pool**: threads sharing a cursor or sampler over a file corpus
//!   and one cancellation flag
//! - **Stats**: lock-free pool counters, per-worker latency histograms

pub mod config;
pub mod corpus;
pub mod dd;
pub mod engine;
pub mod error;
pub mod output;
pub mod pattern;
pub mod stats;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use engine::IoBackend;
pub use error::{DrillError, DrillResult};

/// Result type used at the binary and configuration boundary
pub type Result<T> = anyhow::Result<T>;
