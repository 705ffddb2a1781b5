//! File generator
//!
//! Populates a destination directory with `count` files whose sizes are drawn
//! uniformly from `[min_size, max_size]`. Files are named `<fill>.<n>` where
//! `<fill>` is the [`FillKind::file_prefix`]. With `split`, files go into
//! numbered subdirectories `0/`, `1/`, ... holding at most `split` files each,
//! and `n` restarts at 0 in every subdirectory.
//!
//! Sizes and paths are planned up front with one generator (reproducible with
//! a seed), then written in parallel on the rayon pool with one backend per
//! pool thread.

use super::FileSpec;
use crate::engine::{create_backend, BackendKind, FillKind, IoBackend};
use crate::error::{DrillError, DrillResult, IoContext};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Generator settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub dst: PathBuf,
    pub min_size: u64,
    pub max_size: u64,
    pub count: usize,
    pub fill: FillKind,
    pub block_size: u64,
    /// Files per numbered subdirectory
    pub split: Option<usize>,
    pub durable: bool,
    pub backend: BackendKind,
    /// Seed for the size draws
    pub seed: Option<u64>,
    /// Writer threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dst: PathBuf::from("."),
            min_size: 1024,
            max_size: 1024,
            count: 1,
            fill: FillKind::Zero,
            block_size: 1024,
            split: None,
            durable: false,
            backend: BackendKind::default(),
            seed: None,
            threads: None,
        }
    }
}

/// Totals of one generator run
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub files: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl GenerateReport {
    /// Write throughput in bytes per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }
}

fn check_config(config: &GeneratorConfig) -> DrillResult<()> {
    if config.block_size == 0 {
        return Err(DrillError::invalid("block size must be greater than 0"));
    }
    if config.min_size > config.max_size {
        return Err(DrillError::invalid(format!(
            "minimum size {} exceeds maximum size {}",
            config.min_size, config.max_size
        )));
    }
    if config.split == Some(0) {
        return Err(DrillError::invalid("split must be greater than 0"));
    }
    Ok(())
}

/// Draw sizes and assign paths without touching the filesystem
pub fn plan_files<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> DrillResult<Vec<FileSpec>> {
    check_config(config)?;
    let prefix = config.fill.file_prefix();

    let specs = (0..config.count)
        .map(|i| {
            let path = match config.split {
                Some(split) => config
                    .dst
                    .join((i / split).to_string())
                    .join(format!("{}.{}", prefix, i % split)),
                None => config.dst.join(format!("{}.{}", prefix, i)),
            };
            FileSpec {
                path,
                size_bytes: rng.gen_range(config.min_size..=config.max_size),
            }
        })
        .collect();

    Ok(specs)
}

/// Generate the files described by `config`
///
/// The first failing file aborts the run; files already written are left in
/// place.
pub fn generate(config: &GeneratorConfig) -> DrillResult<(Vec<FileSpec>, GenerateReport)> {
    let mut rng = match config.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    };
    let specs = plan_files(config, &mut rng)?;

    // Fail early on an unavailable backend rather than once per pool thread
    create_backend(config.backend, None)?;

    make_dirs(config)?;

    let start = Instant::now();
    let written_files = AtomicU64::new(0);
    let written_bytes = AtomicU64::new(0);

    let write_all = || {
        specs.par_iter().try_for_each_init(
            || create_backend(config.backend, None),
            |backend, spec| -> DrillResult<()> {
                let backend = backend
                    .as_mut()
                    .map_err(|e| DrillError::invalid(e.to_string()))?;
                write_one(&mut **backend, spec, config)?;

                written_bytes.fetch_add(spec.size_bytes, Ordering::Relaxed);
                let done = written_files.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 1000 == 0 {
                    tracing::debug!(files = done, total = specs.len(), "generator progress");
                }
                Ok(())
            },
        )
    };

    match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fsdrill-gen-{}", i))
            .build()
            .map_err(|e| DrillError::invalid(format!("cannot build writer pool: {}", e)))?
            .install(write_all)?,
        None => write_all()?,
    }

    let report = GenerateReport {
        files: written_files.load(Ordering::Relaxed),
        bytes: written_bytes.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
    };
    tracing::info!(files = report.files, bytes = report.bytes, "generation complete");

    Ok((specs, report))
}

fn make_dirs(config: &GeneratorConfig) -> DrillResult<()> {
    std::fs::create_dir_all(&config.dst).io_context("mkdir", &config.dst)?;
    if let Some(split) = config.split {
        let dirs = config.count.div_ceil(split);
        for d in 0..dirs {
            let dir = config.dst.join(d.to_string());
            std::fs::create_dir_all(&dir).io_context("mkdir", &dir)?;
        }
    }
    Ok(())
}

fn write_one(backend: &mut dyn IoBackend, spec: &FileSpec, config: &GeneratorConfig) -> DrillResult<()> {
    backend.write_fill(
        &spec.path,
        spec.size_bytes,
        config.block_size,
        config.fill,
        config.durable,
    )?;
    Ok(())
}

/// Total bytes planned by `specs`
pub fn total_size(specs: &[FileSpec]) -> u64 {
    specs.iter().map(|s| s.size_bytes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FileCorpus;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(dst: &Path) -> GeneratorConfig {
        GeneratorConfig {
            dst: dst.to_path_buf(),
            min_size: 1000,
            max_size: 5000,
            count: 12,
            fill: FillKind::Random,
            block_size: 512,
            backend: BackendKind::Stream,
            seed: Some(99),
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_sizes_in_range() {
        let temp_dir = TempDir::new().unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let specs = plan_files(&config(temp_dir.path()), &mut rng).unwrap();

        assert_eq!(specs.len(), 12);
        assert!(specs.iter().all(|s| (1000..=5000).contains(&s.size_bytes)));
        assert_eq!(specs[3].path, temp_dir.path().join("random.3"));
    }

    #[test]
    fn test_plan_split_layout() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(temp_dir.path());
        cfg.split = Some(5);
        cfg.fill = FillKind::Zero;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let specs = plan_files(&cfg, &mut rng).unwrap();
        assert_eq!(specs[0].path, temp_dir.path().join("0").join("zero.0"));
        assert_eq!(specs[7].path, temp_dir.path().join("1").join("zero.2"));
        assert_eq!(specs[11].path, temp_dir.path().join("2").join("zero.1"));
    }

    #[test]
    fn test_plan_rejects_bad_config() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let mut cfg = GeneratorConfig {
            min_size: 10,
            max_size: 5,
            ..Default::default()
        };
        assert!(plan_files(&cfg, &mut rng).unwrap_err().is_invalid_argument());

        cfg.max_size = 10;
        cfg.split = Some(0);
        assert!(plan_files(&cfg, &mut rng).unwrap_err().is_invalid_argument());

        cfg.split = None;
        cfg.block_size = 0;
        assert!(plan_files(&cfg, &mut rng).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_plan_seed_reproducible() {
        let cfg = config(Path::new("/nowhere"));
        let a = plan_files(&cfg, &mut Xoshiro256PlusPlus::seed_from_u64(4)).unwrap();
        let b = plan_files(&cfg, &mut Xoshiro256PlusPlus::seed_from_u64(4)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_writes_planned_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(temp_dir.path());
        cfg.split = Some(4);
        cfg.threads = Some(3);

        let (specs, report) = generate(&cfg).unwrap();
        assert_eq!(report.files, 12);
        assert_eq!(report.bytes, total_size(&specs));

        for spec in &specs {
            assert_eq!(std::fs::metadata(&spec.path).unwrap().len(), spec.size_bytes);
        }
        assert_eq!(FileCorpus::enumerate(temp_dir.path()).unwrap().len(), 12);
    }

    #[test]
    fn test_generate_zero_count() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = config(&temp_dir.path().join("new"));
        cfg.count = 0;

        let (specs, report) = generate(&cfg).unwrap();
        assert!(specs.is_empty());
        assert_eq!(report.files, 0);
        assert!(temp_dir.path().join("new").is_dir());
    }
}
