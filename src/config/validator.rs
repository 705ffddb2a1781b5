//! Configuration validation
//!
//! Everything here runs before a single worker or writer thread starts.

use super::*;
use crate::corpus::generator::GeneratorConfig;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workload(&config.workload)?;
    validate_corpus(&config.corpus, &config.workload)?;
    validate_workers(&config.workers)?;
    validate_output(&config.output)?;
    validate_runtime(&config.runtime)?;

    Ok(())
}

/// Validate workload configuration
pub fn validate_workload(workload: &WorkloadConfig) -> Result<()> {
    if workload.block_size == 0 {
        anyhow::bail!("block_size must be greater than 0");
    }

    match workload.operation {
        OperationKind::Copy => {
            let Some(dest) = &workload.dest else {
                anyhow::bail!("copy operation requires a destination directory (--dest)");
            };
            if !dest.is_dir() {
                anyhow::bail!("copy destination is not a directory: {}", dest.display());
            }
            if !workload.pattern.is_map_based() {
                anyhow::bail!("copy needs a full traversal order, not {}", workload.pattern);
            }
        }
        _ => {
            if workload.dest.is_some() {
                tracing::warn!("dest is only used by the copy operation, ignoring it");
            }
        }
    }

    Ok(())
}

fn validate_corpus(corpus: &CorpusConfig, workload: &WorkloadConfig) -> Result<()> {
    if corpus.root.as_os_str().is_empty() {
        anyhow::bail!("corpus root is required (positional ROOT or [corpus] root)");
    }
    if !corpus.root.is_dir() {
        anyhow::bail!("corpus root is not a directory: {}", corpus.root.display());
    }

    if let Some(dest) = &workload.dest {
        if workload.operation == OperationKind::Copy
            && corpus.mode == ConsumptionMode::Cursor
            && resolved(dest).starts_with(resolved(&corpus.root))
        {
            // copies would land in the corpus being walked
            anyhow::bail!(
                "copy destination {} is inside the corpus root {}",
                dest.display(),
                corpus.root.display()
            );
        }
    }

    Ok(())
}

/// Absolute path with `.`, `..` and links resolved; the raw path if that fails
fn resolved(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn validate_workers(workers: &WorkerConfig) -> Result<()> {
    if workers.threads == 0 {
        anyhow::bail!("threads must be greater than 0");
    }

    #[cfg(not(unix))]
    if workers.backend == crate::engine::BackendKind::Sync {
        anyhow::bail!("the sync backend is only available on Unix");
    }

    Ok(())
}

fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.progress_interval_ms == 0 && !output.no_progress {
        anyhow::bail!("progress interval must be greater than 0");
    }

    if let Some(path) = &output.json_output {
        if path.is_dir() {
            anyhow::bail!("json_output is a directory: {}", path.display());
        }
    }

    Ok(())
}

fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if runtime.duration_ms == Some(0) {
        anyhow::bail!("duration must be greater than 0");
    }
    Ok(())
}

/// Validate generator settings
pub fn validate_generator(config: &GeneratorConfig) -> Result<()> {
    if config.block_size == 0 {
        anyhow::bail!("block_size must be greater than 0");
    }
    if config.min_size > config.max_size {
        anyhow::bail!(
            "min_size ({}) must not exceed max_size ({})",
            config.min_size,
            config.max_size
        );
    }
    if config.count == 0 {
        anyhow::bail!("count must be greater than 0");
    }
    if config.split == Some(0) {
        anyhow::bail!("split must be greater than 0");
    }
    if config.threads == Some(0) {
        anyhow::bail!("threads must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.corpus.root = root.to_path_buf();
        config.workers.threads = 2;
        config
    }

    #[test]
    fn test_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        assert!(validate_config(&valid_config(temp_dir.path())).is_ok());
    }

    #[test]
    fn test_zero_block_size() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = valid_config(temp_dir.path());
        config.workload.block_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_threads() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = valid_config(temp_dir.path());
        config.workers.threads = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_root() {
        let err = validate_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("corpus root is required"));

        let mut config = Config::default();
        config.corpus.root = "/definitely/not/here".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_copy_checks() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = temp_dir.path().join("corpus");
        let out = temp_dir.path().join("out");
        std::fs::create_dir_all(&corpus).unwrap();
        std::fs::create_dir_all(&out).unwrap();

        let mut config = valid_config(&corpus);
        config.workload.operation = OperationKind::Copy;
        assert!(validate_config(&config).is_err());

        config.workload.dest = Some(out.clone());
        assert!(validate_config(&config).is_ok());

        config.workload.pattern = AccessPattern::RandomSingleBlock;
        assert!(validate_config(&config).is_err());

        config.workload.pattern = AccessPattern::Sequential;
        config.workload.dest = Some(temp_dir.path().join("missing"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_copy_into_walked_corpus() {
        let temp_dir = TempDir::new().unwrap();
        let inner = temp_dir.path().join("copies");
        std::fs::create_dir_all(&inner).unwrap();

        let mut config = valid_config(temp_dir.path());
        config.workload.operation = OperationKind::Copy;
        config.workload.dest = Some(inner);
        config.corpus.mode = ConsumptionMode::Cursor;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_copy_into_walked_corpus_by_other_spelling() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("corpus");
        std::fs::create_dir_all(root.join("copies")).unwrap();

        let mut config = valid_config(&root);
        config.workload.operation = OperationKind::Copy;
        config.corpus.mode = ConsumptionMode::Cursor;

        config.workload.dest = Some(temp_dir.path().join("corpus/./copies"));
        assert!(validate_config(&config).is_err());

        config.workload.dest = Some(root.join("copies/.."));
        assert!(validate_config(&config).is_err());

        #[cfg(unix)]
        {
            let link = temp_dir.path().join("elsewhere");
            std::os::unix::fs::symlink(root.join("copies"), &link).unwrap();
            config.workload.dest = Some(link);
            assert!(validate_config(&config).is_err());
        }

        // a sibling directory is fine
        let out = temp_dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        config.workload.dest = Some(out);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_duration() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = valid_config(temp_dir.path());
        config.runtime.duration_ms = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_generator() {
        let config = GeneratorConfig::default();
        assert!(validate_generator(&config).is_ok());

        let bad = GeneratorConfig {
            min_size: 10,
            max_size: 5,
            ..GeneratorConfig::default()
        };
        assert!(validate_generator(&bad).unwrap_err().to_string().contains("min_size"));

        let bad = GeneratorConfig {
            split: Some(0),
            ..GeneratorConfig::default()
        };
        assert!(validate_generator(&bad).is_err());
    }
}
