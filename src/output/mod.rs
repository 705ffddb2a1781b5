//! Result reporting
//!
//! - [`text`]: human-readable console tables
//! - [`json`]: machine-readable report files

pub mod json;
pub mod text;

use crate::engine::AccessPattern;
use crate::worker::Operation;

/// What a pool run was asked to do, for report headers
#[derive(Debug, Clone)]
pub struct RunDescription {
    pub command: String,
    pub operation: Operation,
    pub pattern: AccessPattern,
    pub threads: usize,
    pub block_size: u64,
    pub backend: String,
    pub corpus: String,
}
