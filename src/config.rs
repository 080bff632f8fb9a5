//! # Configuration Module
//!
//! Engine settings for the command line, loaded from environment variables
//! (and a `.env` file when present). Command-line flags override anything
//! set here.
//!
//! | Variable               | Meaning                                  |
//! |------------------------|------------------------------------------|
//! | `BSP_THREADS`          | worker threads in the superstep pool     |
//! | `BSP_PARTITIONS`       | vertex blocks the graph is split into    |
//! | `BSP_MAX_SUPERSTEPS`   | limit for runs iterating to convergence  |
//! | `BSP_RUN_TIMEOUT_SECS` | timeout for each engine run              |
//! | `LCC_BITMAP_THRESHOLD` | neighbor sets above this get a bitmap    |
//! | `RUST_LOG`             | log filter when `--verbose` is not given |

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use bsp_graph::{PregelConfig, DEFAULT_BITMAP_THRESHOLD};

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker threads in the superstep pool
    pub threads: usize,

    /// Number of contiguous vertex blocks
    pub partitions: usize,

    /// Superstep limit for convergence runs
    pub max_supersteps: usize,

    /// Timeout for each engine run
    pub run_timeout: Duration,

    /// Per-superstep debug traces even without `--verbose`
    pub tracing: bool,

    /// LCC neighbor sets larger than this also get a dense bitmap
    pub bitmap_threshold: usize,

    /// Log filter directive (same syntax as `RUST_LOG`)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let engine = PregelConfig::default();
        Self {
            threads: engine.parallelism,
            partitions: engine.partitions,
            max_supersteps: engine.max_supersteps,
            run_timeout: engine.run_timeout,
            tracing: false,
            bitmap_threshold: DEFAULT_BITMAP_THRESHOLD,
            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Rust Concept: The ? Operator with Context
    ///
    /// `.context(...)` wraps a parse error with a message naming the variable,
    /// and `?` returns it. An unset variable keeps the default.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let mut config = Config::default();

        if let Ok(val) = env::var("BSP_THREADS") {
            config.threads = val
                .parse()
                .context("BSP_THREADS must be a positive integer")?;
        }

        if let Ok(val) = env::var("BSP_PARTITIONS") {
            config.partitions = val
                .parse()
                .context("BSP_PARTITIONS must be a positive integer")?;
        }

        if let Ok(val) = env::var("BSP_MAX_SUPERSTEPS") {
            config.max_supersteps = val
                .parse()
                .context("BSP_MAX_SUPERSTEPS must be a positive integer")?;
        }

        if let Ok(val) = env::var("BSP_RUN_TIMEOUT_SECS") {
            let secs: u64 = val
                .parse()
                .context("BSP_RUN_TIMEOUT_SECS must be a whole number of seconds")?;
            config.run_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = env::var("LCC_BITMAP_THRESHOLD") {
            config.bitmap_threshold = val
                .parse()
                .context("LCC_BITMAP_THRESHOLD must be a non-negative integer")?;
        }

        if let Ok(val) = env::var("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Overlay the keys of a JSON encoded `PregelConfig` onto the current
    /// engine settings.
    ///
    /// Keys missing from the file keep their current values.
    pub fn merge_engine_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {}", path.display()))?;
        let overrides: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid engine config {}", path.display()))?;

        let mut merged = serde_json::to_value(self.pregel_config(false))
            .context("Failed to encode engine config")?;
        if let Some(fields) = merged.as_object_mut() {
            fields.extend(overrides);
        }
        let engine: PregelConfig = serde_json::from_value(merged)
            .with_context(|| format!("Invalid engine config {}", path.display()))?;

        self.threads = engine.parallelism;
        self.partitions = engine.partitions;
        self.max_supersteps = engine.max_supersteps;
        self.run_timeout = engine.run_timeout;
        self.tracing = engine.tracing_enabled;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            anyhow::bail!("Thread count must be at least 1");
        }

        if self.partitions == 0 {
            anyhow::bail!("Partition count must be at least 1");
        }

        if self.max_supersteps == 0 {
            anyhow::bail!("Superstep limit must be at least 1");
        }

        if self.run_timeout.is_zero() {
            anyhow::bail!("Run timeout must be non-zero");
        }

        Ok(())
    }

    /// Engine configuration for the runtime
    pub fn pregel_config(&self, verbose: bool) -> PregelConfig {
        PregelConfig {
            max_supersteps: self.max_supersteps,
            parallelism: self.threads,
            partitions: self.partitions,
            run_timeout: self.run_timeout,
            tracing_enabled: verbose || self.tracing,
        }
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.threads > 0);
        assert_eq!(config.partitions, config.threads * 4);
        assert_eq!(config.max_supersteps, 10_000);
        assert_eq!(config.bitmap_threshold, DEFAULT_BITMAP_THRESHOLD);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_validation_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_partitions() {
        let mut config = Config::default();
        config.partitions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_threads() {
        let mut config = Config::default();
        config.threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pregel_config_mapping() {
        let config = Config {
            threads: 3,
            partitions: 7,
            max_supersteps: 50,
            run_timeout: Duration::from_secs(9),
            ..Config::default()
        };

        let engine = config.pregel_config(false);
        assert_eq!(engine.parallelism, 3);
        assert_eq!(engine.partitions, 7);
        assert_eq!(engine.max_supersteps, 50);
        assert_eq!(engine.run_timeout, Duration::from_secs(9));
        assert!(!engine.tracing_enabled);
        assert!(engine.validate().is_ok());
    }

    #[test]
    fn test_merge_engine_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"parallelism": 2, "run_timeout": "2m", "tracing_enabled": true}}"#
        )
        .unwrap();

        // as if BSP_PARTITIONS and BSP_MAX_SUPERSTEPS were set
        let mut config = Config {
            partitions: 33,
            max_supersteps: 77,
            ..Config::default()
        };
        config.merge_engine_file(file.path()).unwrap();

        assert_eq!(config.threads, 2);
        assert_eq!(config.run_timeout, Duration::from_secs(120));
        assert!(config.tracing);
        // keys absent from the file keep the environment values
        assert_eq!(config.partitions, 33);
        assert_eq!(config.max_supersteps, 77);
        assert!(config.pregel_config(false).tracing_enabled);
    }

    #[test]
    fn test_merge_engine_file_rejects_bad_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"partitions": "many"}}"#).unwrap();

        let mut config = Config::default();
        let err = config.merge_engine_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid engine config"));
        assert_eq!(config.partitions, Config::default().partitions);
    }

    #[test]
    fn test_merge_engine_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut config = Config::default();
        let err = config.merge_engine_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid engine config"));
    }
}
