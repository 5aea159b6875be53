use super::options::ExecutionOptions;
use super::result::ActionResult;
use super::status::{ActionNodeStatus, ConditionStatus};
use super::temporal::TemporalExecutor;
use crate::context::ResolvedAction;
use crate::expr::ExecutableExpr;
use crate::graph::{ExecutableGraph, ExecutableNode, NodeId};
use crate::plan::PlanKind;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs one node of an executable graph: preconditions, callable,
/// postconditions.
///
/// Failures are reported inside the returned [`ActionResult`]; executors
/// never return errors.
pub trait ActionExecutor: Send + Sync {
    fn execute_action<'a>(
        &'a self,
        node: NodeId,
    ) -> Pin<Box<dyn Future<Output = ActionResult> + Send + 'a>>;
}

/// Picks the executor matching the plan shape.
pub fn executor_for(
    kind: PlanKind,
    graph: Arc<ExecutableGraph>,
    options: ExecutionOptions,
) -> Arc<dyn ActionExecutor> {
    match kind {
        PlanKind::TimeTriggered => Arc::new(TemporalExecutor::new(graph, options)),
        PlanKind::Sequential | PlanKind::PartialOrder => {
            Arc::new(InstantaneousExecutor::new(graph, options))
        }
    }
}

/// Executor for plans of instantaneous actions; every condition is checked
/// before the call and every effect after it.
pub struct InstantaneousExecutor {
    graph: Arc<ExecutableGraph>,
    options: ExecutionOptions,
}

impl InstantaneousExecutor {
    pub fn new(graph: Arc<ExecutableGraph>, options: ExecutionOptions) -> Self {
        Self { graph, options }
    }
}

impl ActionExecutor for InstantaneousExecutor {
    fn execute_action<'a>(
        &'a self,
        id: NodeId,
    ) -> Pin<Box<dyn Future<Output = ActionResult> + Send + 'a>> {
        Box::pin(async move {
            let (node, resolved) = match lookup(&self.graph, id) {
                Lookup::Action(node, resolved) => (node, resolved),
                Lookup::Done(result) => return result,
            };
            let options = &self.options;
            let mut result = ActionResult::new(node.node_name());

            result.precondition_status = ConditionStatus::InProgress;
            let preconditions = resolved
                .preconditions
                .values()
                .flatten()
                .cloned()
                .collect::<Vec<_>>();
            if !check_preconditions(node, &preconditions, 0, options, &mut result) {
                return result;
            }
            result.precondition_status = ConditionStatus::Succeeded;
            report_count(options, node.node_name(), "preconditions", result.evaluated_preconditions);

            if !invoke_action(node, resolved, options, &mut result).await {
                return result;
            }

            result.postcondition_status = ConditionStatus::InProgress;
            let postconditions = resolved
                .postconditions
                .values()
                .flatten()
                .cloned()
                .collect::<Vec<_>>();
            if check_postconditions(node, &postconditions, 0, options, &mut result) {
                result.postcondition_status = ConditionStatus::Succeeded;
                report_count(
                    options,
                    node.node_name(),
                    "postconditions",
                    result.evaluated_postconditions,
                );
            }
            result
        })
    }
}

pub(crate) enum Lookup<'a> {
    Action(&'a ExecutableNode, &'a ResolvedAction),
    Done(ActionResult),
}

/// Sentinels succeed without work; unknown ids never get past the
/// precondition phase.
pub(crate) fn lookup(graph: &ExecutableGraph, id: NodeId) -> Lookup<'_> {
    let Some(node) = graph.node(id) else {
        let mut result = ActionResult::new(format!("#{id}"));
        result.note(format!("node {id} is not part of the executable graph"));
        return Lookup::Done(result);
    };
    match &node.resolved {
        Some(resolved) => Lookup::Action(node, resolved),
        None => Lookup::Done(ActionResult::sentinel(node.node_name())),
    }
}

pub(crate) fn report_count(options: &ExecutionOptions, node: &str, phase: &str, count: usize) {
    if options.verbose {
        info!(node = %node, count, "Evaluated {count} {phase}");
    } else {
        debug!(node = %node, count, phase, "conditions.evaluated");
    }
}

/// Evaluates `conditions` in order, numbering them from `offset + 1`.
///
/// Returns `false` (with the precondition status set to `Failed`) on the
/// first violation. In dry-run mode violations are logged and noted instead.
pub(crate) fn check_preconditions(
    node: &ExecutableNode,
    conditions: &[ExecutableExpr],
    offset: usize,
    options: &ExecutionOptions,
    result: &mut ActionResult,
) -> bool {
    let name = node.node_name();
    for (index, condition) in conditions.iter().enumerate() {
        let position = offset + index + 1;
        result.evaluated_preconditions += 1;
        let detail = match condition.holds(&node.context) {
            Ok(true) => continue,
            Ok(false) => format!("precondition {position} of {name} is not satisfied: {condition}"),
            Err(err) => format!("precondition {position} of {name} could not be evaluated: {err}"),
        };
        if options.dry_run {
            warn!(node = %name, index = position, "dry run: {detail}");
            result.note(detail);
            continue;
        }
        result.precondition_status = ConditionStatus::Failed;
        result.note(detail);
        return false;
    }
    true
}

/// Compares each `(actual, expected)` pair by value equality.
pub(crate) fn check_postconditions(
    node: &ExecutableNode,
    effects: &[(ExecutableExpr, ExecutableExpr)],
    offset: usize,
    options: &ExecutionOptions,
    result: &mut ActionResult,
) -> bool {
    let name = node.node_name();
    for (index, (actual, expected)) in effects.iter().enumerate() {
        let position = offset + index + 1;
        result.evaluated_postconditions += 1;
        let outcome = actual
            .eval(&node.context)
            .and_then(|got| Ok((got, expected.eval(&node.context)?)));
        let detail = match outcome {
            Ok((got, want)) if got == want => continue,
            Ok((got, want)) => {
                format!("postcondition {position} of {name} expected {actual} = {want}, got {got}")
            }
            Err(err) => {
                format!("postcondition {position} of {name} could not be evaluated: {err}")
            }
        };
        if options.dry_run {
            warn!(node = %name, index = position, "dry run: {detail}");
            result.note(detail);
            continue;
        }
        result.postcondition_status = ConditionStatus::Failed;
        result.note(detail);
        return false;
    }
    true
}

/// Runs the bound callable on the blocking pool.
///
/// `Null` maps to `Unknown`, truthy to `Succeeded`, anything else (including
/// errors and panics) to `Failed`. A configured timeout yields `Timeout`
/// while the callable keeps running to completion.
pub(crate) async fn invoke_action(
    node: &ExecutableNode,
    resolved: &ResolvedAction,
    options: &ExecutionOptions,
    result: &mut ActionResult,
) -> bool {
    let name = node.node_name().to_string();
    let callable = Arc::clone(&resolved.callable);
    let arguments = resolved.arguments.clone();

    result.action_status = ActionNodeStatus::Started;
    let handle = tokio::task::spawn_blocking(move || callable(&arguments));
    result.action_status = ActionNodeStatus::InProgress;

    let joined = match options.action_timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(node = %name, timeout_ms = limit.as_millis(), "action.timeout");
                result.action_status = ActionNodeStatus::Timeout;
                result.note(format!("action {name} did not finish within {limit:?}"));
                return false;
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(value)) => {
            result.action_status = if value.is_null() {
                ActionNodeStatus::Unknown
            } else if value.truthy() {
                ActionNodeStatus::Succeeded
            } else {
                result.note(format!("action {name} returned {value}"));
                ActionNodeStatus::Failed
            };
            result.payload = Some(value);
        }
        Ok(Err(err)) => {
            result.action_status = ActionNodeStatus::Failed;
            result.note(format!("action {name} failed: {err:#}"));
        }
        Err(err) => {
            result.action_status = ActionNodeStatus::Failed;
            result.note(format!("action {name} panicked: {err}"));
        }
    }
    debug!(node = %name, status = %result.action_status, "action.invoked");
    result.action_status == ActionNodeStatus::Succeeded
}
