use serde::{Deserialize, Serialize};

/// Outcome of one condition phase (pre- or postconditions).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionStatus {
    #[default]
    NotStarted,
    Started,
    InProgress,
    Succeeded,
    Failed,
    Skipped,
    Timeout,
}

/// Outcome of the action callable, also used as the monitor's node status.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionNodeStatus {
    #[default]
    NotStarted,
    Started,
    InProgress,
    Succeeded,
    Failed,
    Skipped,
    Timeout,
    Unknown,
}

impl ActionNodeStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NotStarted | Self::Started | Self::InProgress)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatcherStatus {
    #[default]
    Idle,
    Started,
    InProgress,
    Failed,
    Finished,
    Replanning,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MonitorStatus {
    #[default]
    Idle,
    Started,
    InProgress,
    Failed,
    Finished,
}
