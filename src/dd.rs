//! External `dd` wrapper
//!
//! Runs the system `dd` and parses the transfer summary it prints on stderr.
//! Both the GNU and the BSD summary formats are understood:
//!
//! ```text
//! 10+0 records in
//! 10+0 records out
//! 10485760 bytes (10 MB, 10 MiB) copied, 0.0123 s, 852 MB/s
//! ```
//!
//! ```text
//! 10+0 records in
//! 10+0 records out
//! 10485760 bytes transferred in 0.012345 secs (849392 bytes/sec)
//! ```

use crate::error::{DrillError, DrillResult};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Parsed `dd` summary
#[derive(Debug, Clone, PartialEq)]
pub struct DdReport {
    pub elapsed: Duration,
    pub bytes: u64,
    /// Full plus partial records read
    pub records: u64,
    /// Bytes per second
    pub throughput: f64,
    /// Records per second
    pub iops: f64,
}

fn parse_error(msg: impl Into<String>) -> DrillError {
    DrillError::io_other("dd report unreadable", msg)
}

/// Leading `full+partial` count of a records line
fn parse_records(line: &str) -> DrillResult<u64> {
    let counts = line.split_whitespace().next().unwrap_or_default();
    let (full, partial) = counts
        .split_once('+')
        .ok_or_else(|| parse_error(format!("unexpected records line '{}'", line)))?;
    let full: u64 = full.parse().map_err(|_| parse_error(format!("bad record count '{}'", line)))?;
    let partial: u64 = partial
        .parse()
        .map_err(|_| parse_error(format!("bad record count '{}'", line)))?;
    Ok(full + partial)
}

fn parse_summary(line: &str) -> DrillResult<(u64, f64)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let bytes: u64 = tokens
        .first()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error(format!("no byte count in '{}'", line)))?;

    let seconds = tokens
        .windows(2)
        .find(|w| matches!(w[1].trim_end_matches(','), "s" | "secs" | "seconds"))
        .and_then(|w| w[0].parse::<f64>().ok())
        .ok_or_else(|| parse_error(format!("no elapsed time in '{}'", line)))?;

    Ok((bytes, seconds))
}

/// Parse the stderr of a finished `dd`
///
/// # Errors
///
/// `Io` when the summary cannot be read or when records in and records out
/// differ (a short write, usually a full device).
pub fn parse_report(stderr: &str) -> DrillResult<DdReport> {
    let find = |needle: &str| {
        stderr
            .lines()
            .find(|l| l.contains(needle))
            .ok_or_else(|| parse_error(format!("missing '{}' line", needle)))
    };

    let records_in = parse_records(find("records in")?)?;
    let records_out = parse_records(find("records out")?)?;
    if records_in != records_out {
        return Err(DrillError::io_other(
            "dd failed",
            format!("records mismatch: {} in, {} out", records_in, records_out),
        ));
    }

    let (bytes, seconds) = parse_summary(find("bytes")?)?;
    let (throughput, iops) = if seconds > 0.0 {
        (bytes as f64 / seconds, records_in as f64 / seconds)
    } else {
        (0.0, 0.0)
    };

    Ok(DdReport {
        elapsed: Duration::from_secs_f64(seconds.max(0.0)),
        bytes,
        records: records_in,
        throughput,
        iops,
    })
}

/// Run `dd if=<input> of=<output> bs=<block_size> [count=<count>]`
pub fn run_dd(input: &Path, output: &Path, block_size: u64, count: Option<u64>) -> DrillResult<DdReport> {
    if block_size == 0 {
        return Err(DrillError::invalid("block size must be greater than 0"));
    }

    let mut cmd = Command::new("dd");
    cmd.arg(format!("if={}", input.display()))
        .arg(format!("of={}", output.display()))
        .arg(format!("bs={}", block_size));
    if let Some(count) = count {
        cmd.arg(format!("count={}", count));
    }

    tracing::debug!(?cmd, "running dd");
    let out = cmd.output().map_err(|source| DrillError::Io {
        context: "dd failed to start".to_string(),
        source,
    })?;

    let stderr = String::from_utf8_lossy(&out.stderr);
    if !out.status.success() {
        return Err(DrillError::io_other(
            format!("dd failed: {}", out.status),
            stderr.trim().to_string(),
        ));
    }

    parse_report(&stderr)
}

/// Sequential write of `count` blocks from `/dev/zero` into `path`
pub fn write_sequential(path: &Path, block_size: u64, count: u64) -> DrillResult<DdReport> {
    run_dd(Path::new("/dev/zero"), path, block_size, Some(count))
}

/// Sequential read of `path` into `/dev/null`
pub fn read_sequential(path: &Path, block_size: u64) -> DrillResult<DdReport> {
    run_dd(path, Path::new("/dev/null"), block_size, None)
}
