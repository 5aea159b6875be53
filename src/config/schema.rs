use crate::error::ConfigError;
use crate::execution::{ExecutionOptions, OverallCheckMode};
use crate::monitor::RuleTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ── Top-level config ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the config was read from; empty for built-in defaults.
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub replan: ReplanConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.action_timeout_ms == Some(0) {
            return Err(ConfigError::Validation(
                "execution.action_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.execution.overall_poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "execution.overall_poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        self.logging.level()?;
        Ok(())
    }

    pub fn execution_options(&self) -> ExecutionOptions {
        self.execution.to_options()
    }
}

// ── Execution ───────────────────────────────────────────────────

fn default_overall_poll_interval_ms() -> u64 {
    50
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Downgrade condition failures to warnings.
    #[serde(default)]
    pub dry_run: bool,

    /// Log per-node condition counts at info level.
    #[serde(default)]
    pub verbose: bool,

    /// Run grouped siblings concurrently instead of in insertion order.
    #[serde(default)]
    pub parallel_siblings: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_timeout_ms: Option<u64>,

    #[serde(default)]
    pub overall_checks: OverallCheckMode,

    #[serde(default = "default_overall_poll_interval_ms")]
    pub overall_poll_interval_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            parallel_siblings: false,
            action_timeout_ms: None,
            overall_checks: OverallCheckMode::default(),
            overall_poll_interval_ms: default_overall_poll_interval_ms(),
        }
    }
}

impl ExecutionConfig {
    pub fn to_options(&self) -> ExecutionOptions {
        ExecutionOptions::default()
            .dry_run(self.dry_run)
            .verbose(self.verbose)
            .parallel_siblings(self.parallel_siblings)
            .action_timeout(self.action_timeout_ms.map(Duration::from_millis))
            .overall_checks(
                self.overall_checks,
                Duration::from_millis(self.overall_poll_interval_ms),
            )
    }
}

// ── Replanning ──────────────────────────────────────────────────

fn default_max_attempts() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplanConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    #[serde(default)]
    pub rules: RuleTable,
}

impl Default for ReplanConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            rules: RuleTable::default(),
        }
    }
}

// ── Logging ─────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.level.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "logging.level '{}' is not one of trace, debug, info, warn, error",
                self.level
            ))
        })
    }
}
