use super::plan_monitor::PlanMonitor;
use super::replan::{FailureKind, RecoveryRule, Replanner, RuleTable};
use crate::error::ExecutionError;
use crate::execution::{
    ActionResult, DispatcherStatus, ExecutionOptions, MonitorStatus, TaskManager,
};
use crate::graph::{ExecutableGraph, NodeId};
use crate::plan::Plan;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// One entry of the result stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeResult {
    pub node: NodeId,
    pub node_name: String,
    pub result: ActionResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub run_id: String,
    pub status: DispatcherStatus,
    pub results: Vec<NodeResult>,
    #[serde(serialize_with = "serialize_failure")]
    pub failure: Option<ExecutionError>,
    pub replans: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> bool {
        self.status == DispatcherStatus::Finished
    }

    pub fn action_results(&self) -> impl Iterator<Item = &NodeResult> {
        self.results
            .iter()
            .filter(|record| record.node_name != "start" && record.node_name != "end")
    }
}

fn serialize_failure<S: Serializer>(
    failure: &Option<ExecutionError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match failure {
        Some(failure) => serializer.serialize_some(&failure.to_string()),
        None => serializer.serialize_none(),
    }
}

enum RunOutcome {
    Finished,
    Failed(ExecutionError),
    /// No node is ready yet the graph is incomplete. Carries the first
    /// advisory failure seen in dry-run, if any.
    Blocked(Option<ExecutionError>),
}

/// Drives an executable graph in dependency order.
///
/// A node is handed to the task manager only once every predecessor
/// succeeded; `start`/`end` succeed without reaching an executor. Ready
/// action nodes discovered in the same pass are queued as one sibling group.
pub struct PlanDispatcher {
    options: ExecutionOptions,
    rules: RuleTable,
    max_replans: usize,
    replanner: Option<Arc<dyn Replanner>>,
    status: DispatcherStatus,
    monitor: Option<PlanMonitor>,
    subscribers: Vec<mpsc::UnboundedSender<NodeResult>>,
}

impl PlanDispatcher {
    pub fn new(options: ExecutionOptions) -> Self {
        Self {
            options,
            rules: RuleTable::default(),
            max_replans: 3,
            replanner: None,
            status: DispatcherStatus::Idle,
            monitor: None,
            subscribers: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: RuleTable, max_replans: usize) -> Self {
        self.rules = rules;
        self.max_replans = max_replans;
        self
    }

    pub fn set_replanner(&mut self, replanner: Arc<dyn Replanner>) {
        self.replanner = Some(replanner);
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn status(&self) -> DispatcherStatus {
        self.status
    }

    /// Monitor of the latest run; replaced whenever a run (re)starts.
    pub fn monitor(&self) -> Option<&PlanMonitor> {
        self.monitor.as_ref()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<NodeResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, record: &NodeResult) {
        self.subscribers
            .retain(|subscriber| subscriber.send(record.clone()).is_ok());
    }

    /// Runs `graph` to completion, replanning on failure when a replanner
    /// is registered and the rule table allows it.
    ///
    /// Node failures are reported through the returned report. An `Err` is
    /// returned only when replanning itself fails.
    pub async fn execute_plan(
        &mut self,
        plan: Plan,
        graph: ExecutableGraph,
    ) -> Result<DispatchReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        self.status = DispatcherStatus::Started;
        info!(
            run_id = %run_id,
            kind = %plan.kind(),
            actions = plan.action_count(),
            dry_run = self.options.dry_run,
            "dispatch.started"
        );

        let mut plan = plan;
        let mut graph = Arc::new(graph);
        let mut results = Vec::new();
        let mut replans = 0;

        let failure = loop {
            self.status = DispatcherStatus::InProgress;
            let failure = match self.run_graph(&plan, &graph, &mut results).await {
                RunOutcome::Finished => {
                    self.status = DispatcherStatus::Finished;
                    break None;
                }
                RunOutcome::Blocked(advisory) => {
                    self.status = DispatcherStatus::Failed;
                    warn!(run_id = %run_id, "dispatch.blocked: graph cannot complete");
                    break advisory;
                }
                RunOutcome::Failed(failure) => failure,
            };
            let kind = FailureKind::of(&failure);
            let rule = self.rules.rule_for(kind);
            let replanner = match (&self.replanner, rule) {
                (Some(replanner), RecoveryRule::Replan) if replans < self.max_replans => {
                    Arc::clone(replanner)
                }
                _ => {
                    self.status = DispatcherStatus::Failed;
                    error!(run_id = %run_id, kind = %kind, rule = %rule, "dispatch.failed: {failure}");
                    break Some(failure);
                }
            };

            self.status = DispatcherStatus::Replanning;
            replans += 1;
            warn!(
                run_id = %run_id,
                kind = %kind,
                attempt = replans,
                "dispatch.replanning after: {failure}"
            );
            let replanned = replanner.replan(&plan, &self.rules, &failure).await;
            let (next_plan, next_graph) = match replanned {
                Ok(next) => next,
                Err(err) => {
                    self.status = DispatcherStatus::Failed;
                    return Err(err.context(format!("Replanning after '{failure}' failed")));
                }
            };
            if let Err(err) = next_graph.validate() {
                self.status = DispatcherStatus::Failed;
                return Err(err).context("Replanned graph is malformed");
            }
            plan = next_plan;
            graph = Arc::new(next_graph);
        };

        info!(run_id = %run_id, status = %self.status, replans, "dispatch.done");
        Ok(DispatchReport {
            run_id,
            status: self.status,
            results,
            failure,
            replans,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn run_graph(
        &mut self,
        plan: &Plan,
        graph: &Arc<ExecutableGraph>,
        results: &mut Vec<NodeResult>,
    ) -> RunOutcome {
        let mut monitor = PlanMonitor::new(graph.as_ref());
        monitor.set_status(MonitorStatus::Started);
        let mut tasks = TaskManager::new(plan.kind(), Arc::clone(graph), &self.options);
        monitor.set_status(MonitorStatus::InProgress);

        let mut advisory = None;
        let outcome = loop {
            let ready = monitor.ready_nodes();
            if ready.is_empty() {
                break if monitor.is_complete() {
                    RunOutcome::Finished
                } else {
                    RunOutcome::Blocked(advisory.take())
                };
            }

            let (sentinels, actions): (Vec<NodeId>, Vec<NodeId>) = ready
                .into_iter()
                .partition(|id| graph.node(*id).is_none_or(|node| node.node.is_sentinel()));
            for id in sentinels {
                let name = graph
                    .node(id)
                    .map_or_else(|| format!("#{id}"), |node| node.node_name().to_string());
                self.record(&mut monitor, results, id, ActionResult::sentinel(name));
            }
            if actions.is_empty() {
                continue;
            }

            for id in &actions {
                monitor.mark_started(*id);
            }
            let queued = match actions.as_slice() {
                [single] => tasks.add_task(*single),
                group => tasks.add_tasks(group),
            };
            if !queued {
                break RunOutcome::Blocked(advisory.take());
            }
            debug!(nodes = ?actions, "dispatch.queued");

            let mut failure = None;
            while let Some(batch) = tasks.step().await {
                for (id, result) in batch {
                    match monitor.process_action_result(&result, self.options.dry_run) {
                        Ok(()) => {
                            if advisory.is_none() {
                                advisory = result.failure();
                            }
                        }
                        Err(err) => {
                            failure.get_or_insert(err);
                        }
                    }
                    self.record(&mut monitor, results, id, result);
                }
            }
            if let Some(failure) = failure {
                break RunOutcome::Failed(failure);
            }
        };

        monitor.set_status(match outcome {
            RunOutcome::Finished => MonitorStatus::Finished,
            RunOutcome::Failed(_) | RunOutcome::Blocked(_) => MonitorStatus::Failed,
        });
        self.monitor = Some(monitor);
        outcome
    }

    fn record(
        &mut self,
        monitor: &mut PlanMonitor,
        results: &mut Vec<NodeResult>,
        id: NodeId,
        result: ActionResult,
    ) {
        monitor.record_result(id, &result);
        let status = result.node_status();
        if self.options.verbose {
            info!(node = %result.node_name, status = %status, "dispatch.node");
        } else {
            debug!(node = %result.node_name, status = %status, "dispatch.node");
        }
        let record = NodeResult {
            node: id,
            node_name: result.node_name.clone(),
            result,
        };
        self.publish(&record);
        results.push(record);
    }
}
