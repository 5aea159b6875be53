use planwright::context::{Context, resolve};
use planwright::error::{CompileError, ResolveError};
use planwright::expr::Value;
use planwright::graph::compile_plan;
use planwright::plan::{
    ActionInstance, ActionTemplate, ConditionExpr, Interval, Plan, SequentialPlan,
};
use std::sync::Arc;

fn move_plan(template: ActionTemplate) -> Plan {
    let template = Arc::new(template);
    Plan::Sequential(SequentialPlan {
        actions: vec![
            ActionInstance::new("m1", &template, &["l1", "l2"]),
            ActionInstance::new("m2", &template, &["l2", "l3"]),
        ],
    })
}

fn guarded_move() -> ActionTemplate {
    ActionTemplate::instantaneous("move", &["from", "to"]).with_condition(
        Interval::Start,
        ConditionExpr::fluent("robot_at", vec![ConditionExpr::param("from")]),
    )
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
fn missing_action_callable_is_named() {
    let ctx = Context::builder()
        .object("l1")
        .object("l2")
        .object("l3")
        .fluent("robot_at", |_| Ok(Value::Bool(true)))
        .build();
    let graph = compile_plan(&move_plan(guarded_move())).unwrap();

    let err = resolve(graph, ctx).unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnboundAction {
            action: "move".to_string()
        }
    );
}

#[test]
fn missing_object_names_parameter_and_node() {
    let ctx = Context::builder()
        .object("l1")
        .object("l2")
        .fluent("robot_at", |_| Ok(Value::Bool(true)))
        .action("move", |_| Ok(Value::Bool(true)))
        .build();
    let graph = compile_plan(&move_plan(guarded_move())).unwrap();

    let err = resolve(graph, ctx).unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnboundObject {
            node: "move(l2, l3)".to_string(),
            parameter: "to".to_string(),
            object: "l3".to_string(),
        }
    );
}

#[test]
fn unsupported_operator_fails_before_execution() {
    let template = ActionTemplate::instantaneous("move", &["from", "to"]).with_condition(
        Interval::Start,
        ConditionExpr::Implies {
            lhs: Box::new(ConditionExpr::boolean(true)),
            rhs: Box::new(ConditionExpr::fluent("robot_at", Vec::new())),
        },
    );
    let graph = compile_plan(&move_plan(template)).unwrap();

    let err = resolve(graph, full_context()).unwrap_err();
    let ResolveError::Compile { source, .. } = &err else {
        panic!("expected compile error, got {err:?}");
    };
    assert_eq!(
        *source,
        CompileError::UnsupportedOperator {
            operator: "Implies".to_string()
        }
    );
}

#[test]
fn every_node_shares_one_context() {
    let ctx = full_context();
    let graph = compile_plan(&move_plan(guarded_move())).unwrap();
    let graph = resolve(graph, Arc::clone(&ctx)).unwrap();

    for (_, node) in graph.nodes() {
        assert!(Arc::ptr_eq(&node.context, &ctx));
        assert_eq!(node.resolved.is_none(), node.node.is_sentinel());
    }
    let m1 = graph.find_by_name("move(l1, l2)").unwrap();
    let resolved = graph.node(m1).unwrap().resolved.as_ref().unwrap();
    assert_eq!(resolved.preconditions_at(Interval::Start).len(), 1);
    assert_eq!(
        resolved.arguments.object_name("from"),
        Some("l1")
    );
}
