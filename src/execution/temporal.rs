use super::executor::{
    ActionExecutor, Lookup, check_postconditions, check_preconditions, invoke_action, lookup,
    report_count,
};
use super::options::{ExecutionOptions, OverallCheckMode};
use super::result::ActionResult;
use super::status::ConditionStatus;
use crate::context::{Context, ResolvedAction};
use crate::expr::ExecutableExpr;
use crate::graph::{ExecutableGraph, ExecutableNode, NodeId};
use crate::plan::Interval;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Executor for durative actions.
///
/// `Instant`/`Start` conditions block before the call and `End` conditions
/// block after it. `Overall` conditions run in background tasks whose
/// lifetime depends on [`OverallCheckMode`].
pub struct TemporalExecutor {
    graph: Arc<ExecutableGraph>,
    options: ExecutionOptions,
}

impl TemporalExecutor {
    pub fn new(graph: Arc<ExecutableGraph>, options: ExecutionOptions) -> Self {
        Self { graph, options }
    }

    fn spawn_overall_checks(
        &self,
        node: &ExecutableNode,
        conditions: &[ExecutableExpr],
        offset: usize,
        token: &CancellationToken,
    ) -> Vec<JoinHandle<Option<String>>> {
        let mut handles = Vec::with_capacity(conditions.len());
        for (index, condition) in conditions.iter().enumerate() {
            let check = Arc::new(OverallCheck {
                context: Arc::clone(&node.context),
                condition: condition.clone(),
                node_name: node.node_name().to_string(),
                position: offset + index + 1,
            });
            match self.options.overall_checks {
                OverallCheckMode::Detached => {
                    // Never joined: a late violation cannot change the result.
                    drop(tokio::spawn(async move { check.evaluate().await }));
                }
                OverallCheckMode::JoinAtEnd => {
                    let token = token.clone();
                    let poll = self.options.overall_poll_interval;
                    handles.push(tokio::spawn(async move {
                        let mut ticker = tokio::time::interval(poll);
                        loop {
                            tokio::select! {
                                biased;
                                _ = ticker.tick() => {
                                    if let Some(violation) = check.evaluate().await {
                                        return Some(violation);
                                    }
                                }
                                () = token.cancelled() => return None,
                            }
                        }
                    }));
                }
            }
        }
        handles
    }
}

struct OverallCheck {
    context: Arc<Context>,
    condition: ExecutableExpr,
    node_name: String,
    position: usize,
}

impl OverallCheck {
    /// Fluents are user callables and may block, so they run on the
    /// blocking pool like actions do.
    async fn evaluate(self: &Arc<Self>) -> Option<String> {
        let check = Arc::clone(self);
        match tokio::task::spawn_blocking(move || check.evaluate_now()).await {
            Ok(violation) => violation,
            Err(err) => {
                let detail = format!(
                    "overall condition {} of {} aborted: {err}",
                    self.position, self.node_name
                );
                warn!(node = %self.node_name, index = self.position, "{detail}");
                Some(detail)
            }
        }
    }

    fn evaluate_now(&self) -> Option<String> {
        let (name, position, condition) = (&self.node_name, self.position, &self.condition);
        let detail = match condition.holds(&self.context) {
            Ok(true) => return None,
            Ok(false) => format!(
                "overall condition {position} of {name} is not satisfied: {condition}"
            ),
            Err(err) => {
                format!("overall condition {position} of {name} could not be evaluated: {err}")
            }
        };
        warn!(node = %name, index = position, "{detail}");
        Some(detail)
    }
}

fn conditions_at(
    resolved: &ResolvedAction,
    intervals: &[Interval],
) -> Vec<ExecutableExpr> {
    intervals
        .iter()
        .flat_map(|interval| resolved.preconditions_at(*interval).iter().cloned())
        .collect()
}

impl ActionExecutor for TemporalExecutor {
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
            let at_start = conditions_at(resolved, &[Interval::Instant, Interval::Start]);
            if !check_preconditions(node, &at_start, 0, options, &mut result) {
                return result;
            }
            result.precondition_status = ConditionStatus::Succeeded;

            let overall = resolved.preconditions_at(Interval::Overall);
            let token = CancellationToken::new();
            let handles = self.spawn_overall_checks(node, overall, at_start.len(), &token);
            result.evaluated_preconditions += overall.len();

            let invoked = invoke_action(node, resolved, options, &mut result).await;
            if !invoked {
                token.cancel();
                return result;
            }

            let at_end = resolved.preconditions_at(Interval::End);
            let offset = at_start.len() + overall.len();
            if !check_preconditions(node, at_end, offset, options, &mut result) {
                token.cancel();
                return result;
            }

            token.cancel();
            for handle in handles {
                let violation = match handle.await {
                    Ok(violation) => violation,
                    Err(err) => Some(format!("overall check of {} aborted: {err}", node.node_name())),
                };
                let Some(detail) = violation else {
                    continue;
                };
                if !options.dry_run {
                    result.precondition_status = ConditionStatus::Failed;
                }
                result.note(detail);
            }
            if result.precondition_status == ConditionStatus::Failed {
                return result;
            }
            report_count(options, node.node_name(), "preconditions", result.evaluated_preconditions);

            result.postcondition_status = ConditionStatus::InProgress;
            let effects = [
                Interval::Instant,
                Interval::Start,
                Interval::Overall,
                Interval::End,
            ]
            .iter()
            .flat_map(|interval| resolved.postconditions_at(*interval).iter().cloned())
            .collect::<Vec<_>>();
            if check_postconditions(node, &effects, 0, options, &mut result) {
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
