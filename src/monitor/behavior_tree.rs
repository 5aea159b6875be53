//! Mutable behavior tree that executes one graph node per call.
//!
//! The tree holds batches of node ids. Each batch carries a success verdict
//! and a continuation verdict over the [`ActionResult`]; when the
//! continuation verdict rejects a result, the rest of that batch is dropped.
//! Batches may be appended or prepended between calls, which lets a caller
//! refine the remaining work from earlier results.

use crate::error::GraphError;
use crate::execution::{ActionExecutor, ActionResult};
use crate::graph::{ExecutableGraph, NodeId};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Predicate over the result of one executed node.
pub type Verdict = Arc<dyn Fn(&ActionResult) -> bool + Send + Sync>;

fn result_succeeded() -> Verdict {
    Arc::new(ActionResult::is_success)
}

/// Node ids scheduled together, with the verdicts applied to each result.
pub struct ActionBatch {
    actions: Vec<NodeId>,
    succeeded: Verdict,
    proceed: Verdict,
}

impl ActionBatch {
    /// Both verdicts default to [`ActionResult::is_success`].
    pub fn new(actions: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            succeeded: result_succeeded(),
            proceed: result_succeeded(),
        }
    }

    /// Every action node of `graph` in topological order.
    pub fn from_graph(graph: &ExecutableGraph) -> Result<Self, GraphError> {
        let actions = graph
            .topological_order()?
            .into_iter()
            .filter(|id| graph.node(*id).is_some_and(|node| !node.node.is_sentinel()));
        Ok(Self::new(actions))
    }

    pub fn succeeds_when(
        mut self,
        verdict: impl Fn(&ActionResult) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.succeeded = Arc::new(verdict);
        self
    }

    pub fn continues_when(
        mut self,
        verdict: impl Fn(&ActionResult) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.proceed = Arc::new(verdict);
        self
    }
}

impl fmt::Debug for ActionBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBatch")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

struct TreeNode {
    actions: VecDeque<NodeId>,
    succeeded: Verdict,
    proceed: Verdict,
    subnodes: VecDeque<TreeNode>,
}

impl TreeNode {
    fn root() -> Self {
        Self::from(ActionBatch::new([]))
    }

    fn is_exhausted(&self) -> bool {
        self.actions.is_empty() && self.subnodes.is_empty()
    }

    /// Deepest node along the chain of first subnodes.
    fn leaf(&self) -> &Self {
        let mut node = self;
        while let Some(first) = node.subnodes.front() {
            node = first;
        }
        node
    }

    fn leaf_mut(&mut self) -> &mut Self {
        let mut node = self;
        while !node.subnodes.is_empty() {
            node = &mut node.subnodes[0];
        }
        node
    }

    /// Drops exhausted nodes along the first-subnode chain, bottom up.
    fn prune(&mut self) {
        if let Some(first) = self.subnodes.front_mut() {
            first.prune();
            if first.is_exhausted() {
                self.subnodes.pop_front();
            }
        }
    }
}

impl From<ActionBatch> for TreeNode {
    fn from(batch: ActionBatch) -> Self {
        Self {
            actions: batch.actions.into(),
            succeeded: batch.succeeded,
            proceed: batch.proceed,
            subnodes: VecDeque::new(),
        }
    }
}

pub struct BehaviorTree {
    executor: Arc<dyn ActionExecutor>,
    root: TreeNode,
    active: bool,
    failures: usize,
    last_result: Option<ActionResult>,
}

impl BehaviorTree {
    pub fn new(executor: Arc<dyn ActionExecutor>) -> Self {
        Self {
            executor,
            root: TreeNode::root(),
            active: true,
            failures: 0,
            last_result: None,
        }
    }

    /// Replaces all scheduled work with `batch`.
    pub fn set_actions(&mut self, batch: ActionBatch) {
        self.root.subnodes.clear();
        self.append_actions(batch);
    }

    /// Schedules `batch` after everything already in the tree.
    pub fn append_actions(&mut self, batch: ActionBatch) {
        self.root.subnodes.push_back(TreeNode::from(batch));
        self.active = true;
    }

    /// Schedules `batch` before everything else, nested under the node that
    /// would run next.
    pub fn prepend_actions(&mut self, batch: ActionBatch) {
        self.root.leaf_mut().subnodes.push_back(TreeNode::from(batch));
        self.active = true;
    }

    pub fn has_next_action(&self) -> bool {
        !self.root.subnodes.is_empty()
    }

    pub fn next_action(&self) -> Option<NodeId> {
        self.root.leaf().actions.front().copied()
    }

    /// `false` once the scheduled work completed without a trailing failure.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn failure_count(&self) -> usize {
        self.failures
    }

    pub fn last_result(&self) -> Option<&ActionResult> {
        self.last_result.as_ref()
    }

    /// Executes the next scheduled node and reports the batch's success
    /// verdict. An empty position counts as success.
    pub async fn execute(&mut self) -> bool {
        let leaf = self.root.leaf_mut();
        let Some(id) = leaf.actions.pop_front() else {
            self.root.prune();
            return self.settle(true);
        };
        let succeeded = Arc::clone(&leaf.succeeded);
        let proceed = Arc::clone(&leaf.proceed);

        let result = self.executor.execute_action(id).await;
        let success = succeeded(&result);
        if !proceed(&result) {
            let leaf = self.root.leaf_mut();
            let dropped = leaf.actions.len();
            leaf.actions.clear();
            leaf.subnodes.clear();
            warn!(node = %result.node_name, dropped, "tree.batch_abandoned");
        }
        debug!(node = %result.node_name, success, "tree.step");
        self.root.prune();
        self.last_result = Some(result);
        self.settle(success)
    }

    /// Executes until nothing is scheduled; returns `true` when no step failed.
    pub async fn run(&mut self) -> bool {
        let failures = self.failures;
        while self.has_next_action() {
            self.execute().await;
        }
        self.failures == failures
    }

    fn settle(&mut self, success: bool) -> bool {
        if !success {
            self.failures += 1;
        } else if !self.has_next_action() {
            self.active = false;
        }
        success
    }
}
