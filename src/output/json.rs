//! JSON output formatting
//!
//! Serializes a pool run into one self-describing document: what was run,
//! totals, latency percentiles and a per-worker breakdown.

use super::RunDescription;
use crate::stats::histogram::LatencyHistogram;
use crate::util::time::{format_duration, format_throughput, per_second};
use crate::worker::{PoolReport, WorkerExit};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: d.as_micros() as u64,
            human: format_duration(d),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLatency {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p50: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p90: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99_9: Option<JsonDuration>,
}

impl JsonLatency {
    fn from_histogram(hist: &LatencyHistogram) -> Self {
        let at = |p: f64| hist.percentile(p).map(JsonDuration::from_duration);
        Self {
            min: hist.min().map(JsonDuration::from_duration),
            mean: hist.mean().map(JsonDuration::from_duration),
            max: hist.max().map(JsonDuration::from_duration),
            p50: at(50.0),
            p90: at(90.0),
            p99: at(99.0),
            p99_9: at(99.9),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRun {
    pub command: String,
    pub corpus: String,
    pub operation: String,
    pub pattern: String,
    pub backend: String,
    pub threads: usize,
    pub block_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTotals {
    pub ops: u64,
    pub bytes: u64,
    pub errors: u64,
    pub ops_per_sec: f64,
    pub bytes_per_sec: f64,
    pub throughput_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWorker {
    pub id: usize,
    pub exit: String,
    pub ops: u64,
    pub bytes: u64,
    pub errors: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Complete report document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    /// RFC 3339 UTC time the report was built
    pub timestamp: String,
    pub run: JsonRun,
    pub elapsed: JsonDuration,
    pub totals: JsonTotals,
    pub latency: JsonLatency,
    pub workers: Vec<JsonWorker>,
}

fn exit_name(exit: WorkerExit) -> &'static str {
    match exit {
        WorkerExit::Cancelled => "cancelled",
        WorkerExit::Exhausted => "exhausted",
        WorkerExit::Failed => "failed",
    }
}

/// Build the JSON document for a finished pool
pub fn build_report(desc: &RunDescription, report: &PoolReport) -> JsonReport {
    let totals = &report.totals;
    let bytes_per_sec = per_second(totals.bytes(), report.elapsed);

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        run: JsonRun {
            command: desc.command.clone(),
            corpus: desc.corpus.clone(),
            operation: desc.operation.to_string(),
            pattern: desc.pattern.to_string(),
            backend: desc.backend.clone(),
            threads: desc.threads,
            block_size: desc.block_size,
        },
        elapsed: JsonDuration::from_duration(report.elapsed),
        totals: JsonTotals {
            ops: totals.ops(),
            bytes: totals.bytes(),
            errors: totals.errors(),
            ops_per_sec: per_second(totals.ops(), report.elapsed),
            bytes_per_sec,
            throughput_human: format_throughput(bytes_per_sec),
            last_error: totals.last_error().map(str::to_string),
        },
        latency: JsonLatency::from_histogram(totals.latency()),
        workers: report
            .workers
            .iter()
            .map(|w| JsonWorker {
                id: w.id,
                exit: exit_name(w.exit).to_string(),
                ops: w.stats.ops(),
                bytes: w.stats.bytes(),
                errors: w.stats.errors(),
                last_error: w.stats.last_error().map(str::to_string),
            })
            .collect(),
    }
}

/// Write JSON output to file
pub fn write_report(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AccessPattern;
    use crate::stats::WorkerStats;
    use crate::worker::{Operation, WorkerReport};
    use tempfile::TempDir;

    fn sample() -> (RunDescription, PoolReport) {
        let mut stats = WorkerStats::new();
        stats.record_op(4096, Duration::from_micros(150));
        stats.record_error("read failed: /x");

        let desc = RunDescription {
            command: "run".to_string(),
            operation: Operation::ReadSweep,
            pattern: AccessPattern::Converging,
            threads: 1,
            block_size: 4096,
            backend: "sync".to_string(),
            corpus: "/data".to_string(),
        };
        let report = PoolReport {
            workers: vec![WorkerReport {
                id: 0,
                exit: WorkerExit::Cancelled,
                stats: stats.clone(),
            }],
            totals: stats,
            elapsed: Duration::from_secs(2),
        };
        (desc, report)
    }

    #[test]
    fn test_build_report_fields() {
        let (desc, report) = sample();
        let json = build_report(&desc, &report);

        assert_eq!(json.run.pattern, "converging");
        assert_eq!(json.totals.ops, 1);
        assert_eq!(json.totals.bytes_per_sec, 2048.0);
        assert_eq!(json.workers[0].exit, "cancelled");
        assert!(json.latency.p50.is_some());
        assert!(chrono::DateTime::parse_from_rfc3339(&json.timestamp).is_ok());
    }

    #[test]
    fn test_write_report_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.json");
        let (desc, report) = sample();

        write_report(&path, &build_report(&desc, &report), true).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["totals"]["errors"], 1);
        assert_eq!(value["workers"][0]["last_error"], "read failed: /x");
    }
}
