use super::{ActionFn, Arguments, Context};
use crate::error::ResolveError;
use crate::expr::{ExecutableExpr, compile};
use crate::graph::{ActionGraph, ActionNode, ExecutableGraph, ExecutableNode};
use crate::plan::{ConditionExpr, Interval};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Runtime half of an action node.
#[derive(Clone)]
pub struct ResolvedAction {
    pub callable: ActionFn,
    pub arguments: Arguments,
    pub preconditions: BTreeMap<Interval, Vec<ExecutableExpr>>,
    /// `(actual, expected)` pairs compared by value equality.
    pub postconditions: BTreeMap<Interval, Vec<(ExecutableExpr, ExecutableExpr)>>,
}

impl ResolvedAction {
    pub fn preconditions_at(&self, interval: Interval) -> &[ExecutableExpr] {
        self.preconditions.get(&interval).map_or(&[], Vec::as_slice)
    }

    pub fn postconditions_at(&self, interval: Interval) -> &[(ExecutableExpr, ExecutableExpr)] {
        self.postconditions.get(&interval).map_or(&[], Vec::as_slice)
    }
}

impl fmt::Debug for ResolvedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAction")
            .field("arguments", &self.arguments)
            .field("preconditions", &self.preconditions)
            .field("postconditions", &self.postconditions)
            .finish_non_exhaustive()
    }
}

/// Binds every action node of `graph` to `context`.
///
/// Fails on the first node whose objects, callable or fluents are missing
/// (including objects named as constants inside conditions),
/// or whose conditions use an operator the interpreter cannot evaluate.
/// Every node receives the same `Arc<Context>`.
pub fn resolve(graph: ActionGraph, context: Arc<Context>) -> Result<ExecutableGraph, ResolveError> {
    let resolved = graph.try_map_nodes(|_, node| {
        let resolved = if node.is_sentinel() {
            None
        } else {
            Some(resolve_node(&node, &context)?)
        };
        Ok::<_, ResolveError>(ExecutableNode {
            node,
            resolved,
            context: Arc::clone(&context),
        })
    })?;
    debug!(nodes = resolved.node_count(), "plan.resolved");
    Ok(resolved)
}

fn resolve_node(node: &ActionNode, ctx: &Context) -> Result<ResolvedAction, ResolveError> {
    let mut arguments = Vec::with_capacity(node.parameters.len());
    for (parameter, object) in &node.parameters {
        let value = ctx
            .object(object)
            .ok_or_else(|| ResolveError::UnboundObject {
                node: node.node_name.clone(),
                parameter: parameter.clone(),
                object: object.clone(),
            })?;
        arguments.push((parameter.clone(), value.clone()));
    }

    let callable = ctx
        .action(&node.action)
        .cloned()
        .ok_or_else(|| ResolveError::UnboundAction {
            action: node.action.clone(),
        })?;

    let compile_in_node = |expr: &ConditionExpr| -> Result<ExecutableExpr, ResolveError> {
        let compiled =
            compile(expr, &node.parameters).map_err(|source| ResolveError::Compile {
                node: node.node_name.clone(),
                source,
            })?;
        if let Some(missing) = compiled
            .symbols()
            .into_iter()
            .find(|name| ctx.object(name).is_none())
        {
            return Err(ResolveError::UnboundConstant {
                node: node.node_name.clone(),
                object: missing.to_string(),
            });
        }
        if let Some(missing) = compiled
            .functions()
            .into_iter()
            .find(|name| ctx.fluent(name).is_none())
        {
            return Err(ResolveError::UnboundFluent {
                node: node.node_name.clone(),
                fluent: missing.to_string(),
            });
        }
        Ok(compiled)
    };

    let mut preconditions = BTreeMap::new();
    for (interval, conditions) in &node.preconditions {
        let compiled = conditions
            .iter()
            .map(&compile_in_node)
            .collect::<Result<Vec<_>, _>>()?;
        preconditions.insert(*interval, compiled);
    }

    let mut postconditions = BTreeMap::new();
    for (interval, effects) in &node.postconditions {
        let compiled = effects
            .iter()
            .map(|effect| -> Result<_, ResolveError> {
                Ok((
                    compile_in_node(&effect.fluent)?,
                    compile_in_node(&effect.value)?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        postconditions.insert(*interval, compiled);
    }

    Ok(ResolvedAction {
        callable,
        arguments: Arguments::new(arguments),
        preconditions,
        postconditions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::expr::Value;
    use crate::graph::{NodeId, compile_plan};
    use crate::plan::{ActionInstance, ActionTemplate, Plan, SequentialPlan};

    fn move_plan() -> Plan {
        let template = Arc::new(
            ActionTemplate::instantaneous("move", &["from", "to"])
                .with_condition(
                    Interval::Start,
                    ConditionExpr::fluent("robot_at", vec![ConditionExpr::param("from")]),
                )
                .with_effect(
                    Interval::Start,
                    ConditionExpr::fluent("robot_at", vec![ConditionExpr::param("to")]),
                    ConditionExpr::boolean(true),
                ),
        );
        Plan::Sequential(SequentialPlan {
            actions: vec![
                ActionInstance::new("m1", &template, &["l1", "l2"]),
                ActionInstance::new("m2", &template, &["l2", "l3"]),
            ],
        })
    }

    fn full_context() -> Arc<Context> {
        Context::builder()
            .object("l1")
            .object("l2")
            .object("l3")
            .fluent("robot_at", |_| Ok(Value::Bool(true)))
            .action("move", |_| Ok(Value::Bool(true)))
            .build()
    }

    #[test]
    fn resolve_shares_one_context() {
        let ctx = full_context();
        let graph = resolve(compile_plan(&move_plan()).unwrap(), Arc::clone(&ctx)).unwrap();

        for (_, node) in graph.nodes() {
            assert!(Arc::ptr_eq(&node.context, &ctx));
        }
        let first = graph.node(NodeId(1)).unwrap();
        let resolved = first.resolved.as_ref().unwrap();
        assert_eq!(resolved.arguments.object_name("to"), Some("l2"));
        assert_eq!(resolved.preconditions_at(Interval::Start).len(), 1);
        assert_eq!(resolved.postconditions_at(Interval::Start).len(), 1);
        assert!(graph.node(NodeId(0)).unwrap().resolved.is_none());
    }

    #[test]
    fn missing_action_callable_names_action() {
        let ctx = Context::builder()
            .object("l1")
            .object("l2")
            .object("l3")
            .fluent("robot_at", |_| Ok(Value::Bool(true)))
            .build();
        let err = resolve(compile_plan(&move_plan()).unwrap(), ctx).unwrap_err();
        assert_eq!(err, ResolveError::UnboundAction {
            action: "move".into()
        });
    }

    #[test]
    fn missing_object_names_parameter() {
        let ctx = Context::builder()
            .object("l1")
            .object("l2")
            .fluent("robot_at", |_| Ok(Value::Bool(true)))
            .action("move", |_| Ok(Value::Bool(true)))
            .build();
        let err = resolve(compile_plan(&move_plan()).unwrap(), ctx).unwrap_err();
        assert_eq!(err, ResolveError::UnboundObject {
            node: "move(l2, l3)".into(),
            parameter: "to".into(),
            object: "l3".into(),
        });
    }

    #[test]
    fn missing_fluent_is_reported() {
        let ctx = Context::builder()
            .object("l1")
            .object("l2")
            .object("l3")
            .action("move", |_| Ok(Value::Bool(true)))
            .build();
        let err = resolve(compile_plan(&move_plan()).unwrap(), ctx).unwrap_err();
        assert_eq!(err, ResolveError::UnboundFluent {
            node: "move(l1, l2)".into(),
            fluent: "robot_at".into(),
        });
    }

    #[test]
    fn unregistered_constant_in_condition_is_rejected() {
        let template = Arc::new(ActionTemplate::instantaneous("charge", &["r"]).with_condition(
            Interval::Start,
            ConditionExpr::equals(ConditionExpr::param("r"), ConditionExpr::object("ghost")),
        ));
        let plan = Plan::Sequential(SequentialPlan {
            actions: vec![ActionInstance::new("c", &template, &["r1"])],
        });
        let ctx = Context::builder()
            .object("r1")
            .action("charge", |_| Ok(Value::Bool(true)))
            .build();
        let err = resolve(compile_plan(&plan).unwrap(), ctx).unwrap_err();
        assert_eq!(err, ResolveError::UnboundConstant {
            node: "charge(r1)".into(),
            object: "ghost".into(),
        });
    }

    #[test]
    fn unsupported_condition_fails_resolution() {
        let template = Arc::new(ActionTemplate::instantaneous("wait", &[]).with_condition(
            Interval::Start,
            ConditionExpr::Plus {
                args: vec![ConditionExpr::int(1)],
            },
        ));
        let plan = Plan::Sequential(SequentialPlan {
            actions: vec![ActionInstance::new("w", &template, &[])],
        });
        let ctx = Context::builder()
            .action("wait", |_| Ok(Value::Bool(true)))
            .build();
        let err = resolve(compile_plan(&plan).unwrap(), ctx).unwrap_err();
        assert_eq!(err, ResolveError::Compile {
            node: "wait()".into(),
            source: CompileError::UnsupportedOperator {
                operator: "Plus".into()
            },
        });
    }
}
