use crate::error::ExecutionError;
use crate::execution::{ActionNodeStatus, ActionResult, MonitorStatus};
use crate::graph::{ActionNode, ExecutionGraph, NodeId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

/// Shadow record of one graph node for the current dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorNode {
    pub id: NodeId,
    pub processed: bool,
    pub action: String,
    pub status: ActionNodeStatus,
    pub node_name: String,
    pub result: String,
    pub predecessors: Vec<NodeId>,
    pub successors: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Status graph mirroring an executable graph's topology.
///
/// Built fresh for every dispatch run and discarded on replanning.
#[derive(Debug, Clone)]
pub struct PlanMonitor {
    nodes: Vec<MonitorNode>,
    status: MonitorStatus,
}

impl PlanMonitor {
    pub fn new<N: AsRef<ActionNode>>(graph: &ExecutionGraph<N>) -> Self {
        let nodes = graph
            .nodes()
            .map(|(id, node)| {
                let node = node.as_ref();
                MonitorNode {
                    id,
                    processed: false,
                    action: node.action.clone(),
                    status: ActionNodeStatus::NotStarted,
                    node_name: node.node_name.clone(),
                    result: String::new(),
                    predecessors: graph.predecessors(id).to_vec(),
                    successors: graph.successors(id).to_vec(),
                    started_at: None,
                    finished_at: None,
                }
            })
            .collect();
        Self {
            nodes,
            status: MonitorStatus::Idle,
        }
    }

    pub fn status(&self) -> MonitorStatus {
        self.status
    }

    pub fn set_status(&mut self, status: MonitorStatus) {
        self.status = status;
    }

    pub fn node(&self, id: NodeId) -> Option<&MonitorNode> {
        self.nodes.get(id.0)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&MonitorNode> {
        self.nodes.iter().find(|node| node.node_name == name)
    }

    pub fn nodes(&self) -> &[MonitorNode] {
        &self.nodes
    }

    /// Status of the node named `name`; `Unknown` if there is none.
    pub fn action_status(&self, name: &str) -> ActionNodeStatus {
        self.node_by_name(name)
            .map_or(ActionNodeStatus::Unknown, |node| node.status)
    }

    pub fn mark_started(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.status = ActionNodeStatus::InProgress;
            node.started_at = Some(Utc::now());
        }
    }

    pub fn update_action_status(&mut self, id: NodeId, status: ActionNodeStatus) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.status = status;
            node.processed = true;
        }
    }

    pub fn record_result(&mut self, id: NodeId, result: &ActionResult) {
        let status = result.node_status();
        self.update_action_status(id, status);
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.result = result
                .message
                .clone()
                .unwrap_or_else(|| status.to_string());
            let now = Utc::now();
            node.finished_at = Some(now);
            node.started_at.get_or_insert(now);
        }
    }

    /// Unprocessed and every predecessor succeeded.
    pub fn is_ready(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        !node.processed
            && node.status == ActionNodeStatus::NotStarted
            && node.predecessors.iter().all(|pred| {
                self.node(*pred)
                    .is_some_and(|pred| pred.status == ActionNodeStatus::Succeeded)
            })
    }

    pub fn ready_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .map(|node| node.id)
            .filter(|id| self.is_ready(*id))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.nodes
            .iter()
            .all(|node| node.status == ActionNodeStatus::Succeeded)
    }

    /// Maps a failing result to its typed error.
    ///
    /// Outside dry-run the error is returned; in dry-run it is only logged.
    pub fn process_action_result(
        &self,
        result: &ActionResult,
        dry_run: bool,
    ) -> Result<(), ExecutionError> {
        let Some(failure) = result.failure() else {
            return Ok(());
        };
        if dry_run {
            warn!(node = %result.node_name, "dry run: {failure}");
            return Ok(());
        }
        error!(node = %result.node_name, "{failure}");
        Err(failure)
    }
}
