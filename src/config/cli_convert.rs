//! CLI to Config conversion utilities

use crate::config::cli;
use crate::config::{ConsumptionMode, OperationKind};
use crate::engine::{AccessPattern, BackendKind};
use crate::util::buffer::FillKind;
use anyhow::{Context, Result};
use std::time::Duration;

/// Parse a size string (e.g., "1G", "100M", "4k") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("k") || s.ends_with("kb") {
        (s.trim_end_matches("kb").trim_end_matches("k"), 1024u64)
    } else if s.ends_with("m") || s.ends_with("mb") {
        (s.trim_end_matches("mb").trim_end_matches("m"), 1024 * 1024)
    } else if s.ends_with("g") || s.ends_with("gb") {
        (s.trim_end_matches("gb").trim_end_matches("g"), 1024 * 1024 * 1024)
    } else if s.ends_with("t") || s.ends_with("tb") {
        (s.trim_end_matches("tb").trim_end_matches("t"), 1024 * 1024 * 1024 * 1024)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size out of range: {}", s))
}

/// Parse a duration string (e.g., "250ms", "60s", "5m", "1h")
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, unit_ms) = if s.ends_with("ms") {
        (s.trim_end_matches("ms"), 1u64)
    } else if s.ends_with("s") || s.ends_with("sec") {
        (s.trim_end_matches("sec").trim_end_matches("s"), 1000)
    } else if s.ends_with("m") || s.ends_with("min") {
        (s.trim_end_matches("min").trim_end_matches("m"), 60 * 1000)
    } else if s.ends_with("h") || s.ends_with("hr") {
        (s.trim_end_matches("hr").trim_end_matches("h"), 3600 * 1000)
    } else {
        (s.as_str(), 1000)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    let ms = num
        .checked_mul(unit_ms)
        .with_context(|| format!("Duration out of range: {}", s))?;
    Ok(Duration::from_millis(ms))
}

pub fn convert_pattern(arg: cli::PatternArg) -> AccessPattern {
    match arg {
        cli::PatternArg::Sequential => AccessPattern::Sequential,
        cli::PatternArg::RandomShuffle => AccessPattern::RandomShuffle,
        cli::PatternArg::Converging => AccessPattern::Converging,
        cli::PatternArg::RandomSingleBlock => AccessPattern::RandomSingleBlock,
    }
}

pub fn convert_fill(arg: cli::FillArg) -> FillKind {
    match arg {
        cli::FillArg::Zero => FillKind::Zero,
        cli::FillArg::Srandom => FillKind::PseudoRandomRepeating,
        cli::FillArg::Random => FillKind::Random,
    }
}

pub fn convert_backend(arg: cli::BackendArg) -> BackendKind {
    match arg {
        cli::BackendArg::Sync => BackendKind::Sync,
        cli::BackendArg::Stream => BackendKind::Stream,
    }
}

pub fn convert_operation(arg: cli::OperationArg) -> OperationKind {
    match arg {
        cli::OperationArg::WriteFill => OperationKind::WriteFill,
        cli::OperationArg::WriteRandomBlock => OperationKind::WriteRandomBlock,
        cli::OperationArg::Copy => OperationKind::Copy,
        cli::OperationArg::ReadSweep => OperationKind::ReadSweep,
        cli::OperationArg::ReadRandomBlock => OperationKind::ReadRandomBlock,
        cli::OperationArg::Stat => OperationKind::Stat,
    }
}

pub fn convert_mode(arg: cli::ModeArg) -> ConsumptionMode {
    match arg {
        cli::ModeArg::Cursor => ConsumptionMode::Cursor,
        cli::ModeArg::Sampler => ConsumptionMode::Sampler,
    }
}

/// Backend flag, falling back to the platform default
pub fn backend_or_default(arg: Option<cli::BackendArg>) -> BackendKind {
    arg.map(convert_backend).unwrap_or_default()
}
