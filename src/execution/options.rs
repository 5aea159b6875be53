use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How span-long (`Overall`) conditions of durative actions are checked.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OverallCheckMode {
    /// Evaluate once in a background task; violations are only logged.
    #[default]
    Detached,
    /// Poll until the End checkpoint, then join; violations fail the node.
    JoinAtEnd,
}

/// Runtime knobs handed to executors and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub parallel_siblings: bool,
    pub action_timeout: Option<Duration>,
    pub overall_checks: OverallCheckMode,
    pub overall_poll_interval: Duration,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            parallel_siblings: false,
            action_timeout: None,
            overall_checks: OverallCheckMode::Detached,
            overall_poll_interval: Duration::from_millis(50),
        }
    }
}

impl ExecutionOptions {
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn parallel_siblings(mut self, enabled: bool) -> Self {
        self.parallel_siblings = enabled;
        self
    }

    pub fn action_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.action_timeout = timeout;
        self
    }

    pub fn overall_checks(mut self, mode: OverallCheckMode, poll_interval: Duration) -> Self {
        self.overall_checks = mode;
        self.overall_poll_interval = poll_interval;
        self
    }
}
