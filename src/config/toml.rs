//! TOML run file parsing
//!
//! A run file mirrors [`Config`]:
//!
//! ```toml
//! [workload]
//! operation = "read-sweep"
//! pattern = "converging"
//! block_size = 4096
//!
//! [corpus]
//! root = "/mnt/scratch/corpus"
//! mode = "sampler"
//!
//! [workers]
//! threads = 8
//!
//! [runtime]
//! duration_ms = 30000
//! ```

use super::cli::RunArgs;
use super::cli_convert::*;
use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &RunArgs, mut config: Config) -> Result<Config> {
    if let Some(root) = &cli.root {
        config.corpus.root = root.clone();
    }
    if let Some(mode) = cli.mode {
        config.corpus.mode = convert_mode(mode);
    }

    if let Some(op) = cli.operation {
        config.workload.operation = convert_operation(op);
    }
    if let Some(pattern) = cli.pattern {
        config.workload.pattern = convert_pattern(pattern);
    }
    if let Some(fill) = cli.fill {
        config.workload.fill = convert_fill(fill);
    }
    if let Some(dest) = &cli.dest {
        config.workload.dest = Some(dest.clone());
    }
    if let Some(bs) = &cli.block_size {
        config.workload.block_size = parse_size(bs)?;
    }
    if cli.durable {
        config.workload.durable = true;
    }

    if let Some(threads) = cli.threads {
        config.workers.threads = threads;
    }
    if let Some(backend) = cli.backend {
        config.workers.backend = convert_backend(backend);
    }
    if cli.seed.is_some() {
        config.workers.seed = cli.seed;
    }

    if let Some(duration) = &cli.duration {
        config.runtime.duration_ms = Some(parse_duration(duration)?.as_millis() as u64);
    }

    if let Some(interval) = &cli.progress_interval {
        config.output.progress_interval_ms = parse_duration(interval)?.as_millis() as u64;
    }
    if cli.no_progress {
        config.output.no_progress = true;
    }
    if let Some(path) = &cli.json_output {
        config.output.json_output = Some(path.clone());
    }
    if cli.json_pretty {
        config.output.json_pretty = true;
    }

    Ok(config)
}

/// Build the configuration of a `run` command: the run file if one was
/// given, overridden by the flags
pub fn load_run_config(cli: &RunArgs) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, base)
}
