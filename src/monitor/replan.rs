use crate::error::ExecutionError;
use crate::graph::ExecutableGraph;
use crate::plan::Plan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Coarse failure category used to pick a recovery rule.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Precondition,
    Action,
    Postcondition,
    Timeout,
}

impl FailureKind {
    pub fn of(error: &ExecutionError) -> Self {
        match error {
            ExecutionError::PreconditionTimeout { .. }
            | ExecutionError::ActionTimeout { .. }
            | ExecutionError::PostconditionTimeout { .. } => Self::Timeout,
            ExecutionError::PreconditionFailure { .. }
            | ExecutionError::PreconditionSkipped { .. }
            | ExecutionError::PreconditionNotChecked { .. } => Self::Precondition,
            ExecutionError::ActionFailure { .. }
            | ExecutionError::ActionSkipped { .. }
            | ExecutionError::ActionNotExecuted { .. }
            | ExecutionError::ActionOutcomeUnknown { .. } => Self::Action,
            ExecutionError::PostconditionFailure { .. }
            | ExecutionError::PostconditionSkipped { .. }
            | ExecutionError::PostconditionNotChecked { .. } => Self::Postcondition,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecoveryRule {
    #[default]
    Replan,
    Abort,
}

/// Failure kind to recovery rule. Kinds without an entry replan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable(BTreeMap<FailureKind, RecoveryRule>);

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, kind: FailureKind, rule: RecoveryRule) -> Self {
        self.0.insert(kind, rule);
        self
    }

    pub fn rule_for(&self, kind: FailureKind) -> RecoveryRule {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FailureKind, RecoveryRule)> + '_ {
        self.0.iter().map(|(kind, rule)| (*kind, *rule))
    }
}

impl FromIterator<(FailureKind, RecoveryRule)> for RuleTable {
    fn from_iter<I: IntoIterator<Item = (FailureKind, RecoveryRule)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Produces a replacement plan after a failed dispatch.
///
/// The returned graph must already be resolved against a context; the
/// dispatcher validates it and restarts from its `start` node.
pub trait Replanner: Send + Sync {
    fn replan<'a>(
        &'a self,
        plan: &'a Plan,
        rules: &'a RuleTable,
        failure: &'a ExecutionError,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<(Plan, ExecutableGraph)>> + Send + 'a>>;
}
