//! fsdrill - filesystem IO exercise toolkit

use anyhow::{Context, Result};
use clap::Parser;
use fsdrill::config::cli::{Cli, Command, CopyArgs, DdArgs, GenerateArgs, ReadArgs, RunArgs, TreeArgs};
use fsdrill::config::cli_convert::{backend_or_default, convert_fill, convert_pattern, parse_size};
use fsdrill::config::toml::load_run_config;
use fsdrill::config::validator::{validate_config, validate_generator};
use fsdrill::config::{Config, ConsumptionMode, OperationKind};
use fsdrill::corpus::generator::{generate, GeneratorConfig};
use fsdrill::corpus::tree::make_tree;
use fsdrill::engine::{create_backend, IoBackend};
use fsdrill::output::{json, text, RunDescription};
use fsdrill::stats::live::LiveProgress;
use fsdrill::util::time::{format_bytes, format_duration, format_throughput, per_second};
use fsdrill::worker::{PoolReport, StopSignal, WorkerPool};
use std::time::{Duration, Instant};

/// How often the driver checks the pool, the deadline and the progress line
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Run(args) => run_pool_command(args),
        Command::Copy(args) => run_copy(args),
        Command::Read(args) => run_read(args),
        Command::Tree(args) => run_tree(args),
        Command::Dd(args) => run_dd(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        dst: args.dst,
        min_size: parse_size(&args.min_size)?,
        max_size: parse_size(&args.max_size)?,
        count: args.count,
        fill: convert_fill(args.fill),
        block_size: parse_size(&args.block_size)?,
        split: args.split,
        durable: args.durable,
        backend: backend_or_default(args.backend),
        seed: args.seed,
        threads: args.threads,
    };
    validate_generator(&config)?;

    tracing::info!(dst = %config.dst.display(), count = config.count, fill = %config.fill, "generating files");
    let (_, report) = generate(&config)
        .with_context(|| format!("Failed to generate files in {}", config.dst.display()))?;

    text::print_generate_report(&report);
    Ok(())
}

fn run_pool_command(args: RunArgs) -> Result<()> {
    let config = load_run_config(&args)?;
    validate_config(&config)?;

    let report = drive(&config, "run")?;
    if report.totals.errors() > 0 {
        tracing::warn!(errors = report.totals.errors(), "run finished with errors");
    }
    Ok(())
}

fn run_read(args: ReadArgs) -> Result<()> {
    let mut config = Config::default();
    config.corpus.root = args.root;
    config.corpus.mode = ConsumptionMode::Cursor;
    config.workload.operation = OperationKind::ReadSweep;
    config.workload.pattern = convert_pattern(args.pattern);
    config.workload.block_size = parse_size(&args.block_size)?;
    if let Some(threads) = args.threads {
        config.workers.threads = threads;
    }
    config.workers.backend = backend_or_default(args.backend);
    config.workers.seed = args.seed;
    config.output.json_output = args.json_output;
    validate_config(&config)?;

    let report = drive(&config, "read")?;
    let failed = report.failed_workers();
    if failed > 0 {
        anyhow::bail!(
            "{} of {} workers stopped on an error; last error: {}",
            failed,
            report.workers.len(),
            report.totals.last_error().unwrap_or("unknown")
        );
    }
    Ok(())
}

/// Start the pool described by `config`, wait for it to finish and report
fn drive(config: &Config, command: &str) -> Result<PoolReport> {
    let pool_config = config.pool_config()?;
    let source = config.work_source()?;

    let desc = RunDescription {
        command: command.to_string(),
        operation: pool_config.operation.clone(),
        pattern: pool_config.pattern,
        threads: pool_config.threads,
        block_size: pool_config.block_size,
        backend: pool_config.backend.to_string(),
        corpus: format!("{} ({})", config.corpus.root.display(), config.corpus.mode),
    };

    println!("fsdrill v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "{} x{} on {} [{}]",
        desc.operation, desc.threads, desc.corpus, desc.pattern
    );
    println!();

    let pool = WorkerPool::run(pool_config, source).context("Failed to start worker pool")?;
    install_interrupt_handler(pool.stop_handle())?;

    let report = wait_for_pool(pool, config);

    text::print_pool_report(&desc, &report);
    if let Some(path) = &config.output.json_output {
        let doc = json::build_report(&desc, &report);
        json::write_report(path, &doc, config.output.json_pretty)?;
        println!("JSON report written to {}", path.display());
    }

    Ok(report)
}

/// Poll until the pool drains, the deadline passes or an interrupt arrives
fn wait_for_pool(pool: WorkerPool, config: &Config) -> PoolReport {
    let counters = pool.counters();
    let mut live = (!config.output.no_progress).then(|| LiveProgress::new(config.progress_interval()));
    let deadline = config.duration().map(|d| Instant::now() + d);

    while !pool.is_finished() {
        if deadline.map_or(false, |d| Instant::now() >= d) {
            tracing::debug!("duration reached, stopping workers");
            pool.stop();
            break;
        }
        if let Some(live) = live.as_mut() {
            if live.should_update() {
                println!("{}", live.update(&counters));
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    pool.join()
}

/// First SIGINT stops the pool gracefully, the second aborts
fn install_interrupt_handler(stop: StopSignal) -> Result<()> {
    ctrlc::set_handler(move || {
        if stop.is_triggered() {
            tracing::error!("received second SIGINT, aborting");
            std::process::abort();
        }
        eprintln!("Interrupted, waiting for in-flight calls to finish (Ctrl-C again to abort)");
        stop.trigger();
    })
    .context("Failed to install SIGINT handler")
}

fn run_copy(args: CopyArgs) -> Result<()> {
    let block_size = parse_size(&args.block_size)?;
    let pattern = convert_pattern(args.pattern);
    let mut backend = create_backend(backend_or_default(args.backend), args.seed)?;

    let start = Instant::now();
    let bytes = backend
        .copy(&args.src, &args.dst, block_size, pattern, args.durable)
        .with_context(|| format!("Failed to copy {} to {}", args.src.display(), args.dst.display()))?;
    let elapsed = start.elapsed();

    println!(
        "Copied {} ({}) in {} at {}",
        args.src.display(),
        format_bytes(bytes as f64),
        format_duration(elapsed),
        format_throughput(per_second(bytes, elapsed))
    );
    Ok(())
}

fn run_tree(args: TreeArgs) -> Result<()> {
    let report = make_tree(&args.root, args.width, args.depth)
        .with_context(|| format!("Failed to create tree under {}", args.root.display()))?;
    text::print_tree_report(&report);
    Ok(())
}

fn run_dd(args: DdArgs) -> Result<()> {
    let block_size = parse_size(&args.block_size)?;
    let report = fsdrill::dd::run_dd(&args.input, &args.output, block_size, args.count)?;
    text::print_dd_report(&report);
    Ok(())
}
