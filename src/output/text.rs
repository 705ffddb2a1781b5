//! Human-readable text output

use super::RunDescription;
use crate::corpus::generator::GenerateReport;
use crate::corpus::tree::TreeReport;
use crate::dd::DdReport;
use crate::util::time::{format_bytes, format_duration, format_rate, format_throughput, per_second};
use crate::worker::{PoolReport, WorkerExit};

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Print the results of a pool run
pub fn print_pool_report(desc: &RunDescription, report: &PoolReport) {
    let totals = &report.totals;
    let elapsed = report.elapsed;

    println!("{}", RULE);
    println!("                    RESULTS");
    println!("{}", RULE);
    println!();
    println!("Command:   {}", desc.command);
    println!("Corpus:    {}", desc.corpus);
    println!("Operation: {}", desc.operation);
    println!("Pattern:   {}", desc.pattern);
    println!("Backend:   {}  block size: {}", desc.backend, format_bytes(desc.block_size as f64));
    println!("Threads:   {}", desc.threads);
    println!("Elapsed:   {:.3}s", elapsed.as_secs_f64());
    println!();

    println!("Operations:");
    println!(
        "  Total:  {} ops ({}) - {} ops/s",
        format_number(totals.ops()),
        format_bytes(totals.bytes() as f64),
        format_rate(per_second(totals.ops(), elapsed))
    );
    println!("  Throughput: {}", format_throughput(per_second(totals.bytes(), elapsed)));
    if totals.errors() > 0 {
        println!("  Errors: {}", format_number(totals.errors()));
        if let Some(last) = totals.last_error() {
            println!("  Last error: {}", last);
        }
    }
    println!();

    println!("Latency:");
    let hist = totals.latency();
    match (hist.min(), hist.mean(), hist.max()) {
        (Some(min), Some(mean), Some(max)) => {
            println!("  Min:  {}", format_duration(min));
            println!("  Mean: {}", format_duration(mean));
            println!("  Max:  {}", format_duration(max));
            println!();
            println!("  Percentiles:");
            for &p in &[50.0, 90.0, 99.0, 99.9] {
                if let Some(val) = hist.percentile(p) {
                    println!("    p{:<5}: {}", p, format_duration(val));
                }
            }
        }
        _ => println!("  No latency data collected"),
    }
    println!();

    println!("Workers:");
    for worker in &report.workers {
        println!(
            "  #{:<3} {:<10} {:>10} ops  {:>6} errors",
            worker.id,
            exit_label(worker.exit),
            format_number(worker.stats.ops()),
            worker.stats.errors()
        );
    }
    println!("{}", RULE);
}

/// Print the outcome of a generator run
pub fn print_generate_report(report: &GenerateReport) {
    println!(
        "Wrote {} files ({}) in {} at {}",
        format_number(report.files),
        format_bytes(report.bytes as f64),
        format_duration(report.elapsed),
        format_throughput(report.throughput())
    );
}

pub fn print_tree_report(report: &TreeReport) {
    println!(
        "Created {} directories ({} leaves) in {}",
        format_number(report.dir_count),
        format_number(report.leaves.len() as u64),
        format_duration(report.elapsed)
    );
}

pub fn print_dd_report(report: &DdReport) {
    println!(
        "dd: {:.3}s  {}  {} IOPS",
        report.elapsed.as_secs_f64(),
        format_throughput(report.throughput),
        format_rate(report.iops)
    );
}

fn exit_label(exit: WorkerExit) -> &'static str {
    match exit {
        WorkerExit::Cancelled => "cancelled",
        WorkerExit::Exhausted => "done",
        WorkerExit::Failed => "FAILED",
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
