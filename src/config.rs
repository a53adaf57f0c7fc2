//! Configuration for blocking-time attribution
//!
//! Loadable from TOML; every field has a default so a partial file works.
//!
//! ```toml
//! blocking_threshold_ms = 50.0
//! worker_threads = 4
//! parallel_min_tasks = 2048
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Attribution tuning
///
/// # Example
/// ```
/// use tbt_impact::config::AttributionConfig;
///
/// let config = AttributionConfig::default();
/// assert_eq!(config.blocking_threshold_ms, 50.0);
/// assert_eq!(config.worker_threads, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Long-task threshold used by `TbtImpactTasks::with_default_primitive`
    pub blocking_threshold_ms: f64,

    /// Threads used for per-task impact passes (1 = serial)
    pub worker_threads: usize,

    /// Below this many tasks the passes always run serially
    pub parallel_min_tasks: usize,

    /// Self impact below `-anomaly_tolerance_ms` is reported as an anomaly
    pub anomaly_tolerance_ms: f64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            blocking_threshold_ms: crate::impact::BLOCKING_TIME_THRESHOLD_MS,
            worker_threads: 1,
            parallel_min_tasks: 2048,
            anomaly_tolerance_ms: 1e-6,
        }
    }
}

impl AttributionConfig {
    /// Single-threaded passes regardless of tree size
    pub fn serial() -> Self {
        Self::default()
    }

    /// Spread per-task passes over `threads` workers
    pub fn parallel(threads: usize) -> Self {
        Self {
            worker_threads: threads,
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.blocking_threshold_ms.is_finite() || self.blocking_threshold_ms < 0.0 {
            return Err(format!(
                "blocking_threshold_ms must be a finite non-negative number, got {}",
                self.blocking_threshold_ms
            ));
        }

        if self.worker_threads == 0 {
            return Err("worker_threads must be >= 1, got 0".to_string());
        }

        if self.anomaly_tolerance_ms.is_nan() || self.anomaly_tolerance_ms < 0.0 {
            return Err(format!(
                "anomaly_tolerance_ms must be non-negative, got {}",
                self.anomaly_tolerance_ms
            ));
        }

        Ok(())
    }

    /// Whether a pass over `task_count` tasks should fan out
    pub fn runs_parallel(&self, task_count: usize) -> bool {
        self.worker_threads > 1 && task_count >= self.parallel_min_tasks
    }
}
