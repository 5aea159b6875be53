use super::status::{ActionNodeStatus, ConditionStatus};
use crate::error::ExecutionError;
use crate::expr::Value;
use serde::Serialize;

/// Outcome of one execution attempt of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub node_name: String,
    pub precondition_status: ConditionStatus,
    pub action_status: ActionNodeStatus,
    pub postcondition_status: ConditionStatus,
    /// Raw value returned by the action callable.
    pub payload: Option<Value>,
    /// First failure detail, or accumulated dry-run advisories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub evaluated_preconditions: usize,
    pub evaluated_postconditions: usize,
}

impl ActionResult {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            precondition_status: ConditionStatus::NotStarted,
            action_status: ActionNodeStatus::NotStarted,
            postcondition_status: ConditionStatus::NotStarted,
            payload: None,
            message: None,
            evaluated_preconditions: 0,
            evaluated_postconditions: 0,
        }
    }

    /// Result recorded for `start`/`end`, which never reach an executor.
    pub fn sentinel(node_name: impl Into<String>) -> Self {
        Self {
            precondition_status: ConditionStatus::Succeeded,
            action_status: ActionNodeStatus::Succeeded,
            postcondition_status: ConditionStatus::Succeeded,
            ..Self::new(node_name)
        }
    }

    pub(crate) fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &mut self.message {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&message);
            }
            None => self.message = Some(message),
        }
    }

    fn detail(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "no detail recorded".to_string())
    }

    /// First failing phase, in pre → action → post order; `None` on success.
    pub fn failure(&self) -> Option<ExecutionError> {
        let node = self.node_name.clone();
        match self.precondition_status {
            ConditionStatus::Succeeded => {}
            ConditionStatus::Failed => {
                return Some(ExecutionError::PreconditionFailure {
                    node,
                    detail: self.detail(),
                });
            }
            ConditionStatus::Timeout => return Some(ExecutionError::PreconditionTimeout { node }),
            ConditionStatus::Skipped => return Some(ExecutionError::PreconditionSkipped { node }),
            ConditionStatus::NotStarted | ConditionStatus::Started | ConditionStatus::InProgress => {
                return Some(ExecutionError::PreconditionNotChecked { node });
            }
        }

        match self.action_status {
            ActionNodeStatus::Succeeded => {}
            ActionNodeStatus::Failed => {
                return Some(ExecutionError::ActionFailure {
                    node,
                    detail: self.detail(),
                });
            }
            ActionNodeStatus::Timeout => return Some(ExecutionError::ActionTimeout { node }),
            ActionNodeStatus::Skipped => return Some(ExecutionError::ActionSkipped { node }),
            ActionNodeStatus::Unknown => {
                return Some(ExecutionError::ActionOutcomeUnknown { node });
            }
            ActionNodeStatus::NotStarted
            | ActionNodeStatus::Started
            | ActionNodeStatus::InProgress => {
                return Some(ExecutionError::ActionNotExecuted { node });
            }
        }

        match self.postcondition_status {
            ConditionStatus::Succeeded => None,
            ConditionStatus::Failed => Some(ExecutionError::PostconditionFailure {
                node,
                detail: self.detail(),
            }),
            ConditionStatus::Timeout => Some(ExecutionError::PostconditionTimeout { node }),
            ConditionStatus::Skipped => Some(ExecutionError::PostconditionSkipped { node }),
            ConditionStatus::NotStarted | ConditionStatus::Started | ConditionStatus::InProgress => {
                Some(ExecutionError::PostconditionNotChecked { node })
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    /// Status the monitor records for the node.
    pub fn node_status(&self) -> ActionNodeStatus {
        match self.failure() {
            None => ActionNodeStatus::Succeeded,
            Some(
                ExecutionError::PreconditionTimeout { .. }
                | ExecutionError::ActionTimeout { .. }
                | ExecutionError::PostconditionTimeout { .. },
            ) => ActionNodeStatus::Timeout,
            Some(
                ExecutionError::PreconditionSkipped { .. }
                | ExecutionError::ActionSkipped { .. }
                | ExecutionError::PostconditionSkipped { .. },
            ) => ActionNodeStatus::Skipped,
            Some(ExecutionError::ActionOutcomeUnknown { .. }) => ActionNodeStatus::Unknown,
            Some(_) => ActionNodeStatus::Failed,
        }
    }
}
