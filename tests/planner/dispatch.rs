use planwright::context::{Context, resolve};
use planwright::execution::{ActionNodeStatus, ConditionStatus, DispatcherStatus, ExecutionOptions};
use planwright::expr::Value;
use planwright::graph::compile_plan;
use planwright::monitor::PlanDispatcher;
use planwright::plan::{
    ActionInstance, ActionTemplate, ConditionExpr, Interval, PartialOrderPlan, Plan, Rational,
    SequentialPlan, TimeTriggeredPlan,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn moves() -> Plan {
    let template = Arc::new(
        ActionTemplate::instantaneous("move", &["from", "to"]).with_condition(
            Interval::Start,
            ConditionExpr::fluent("robot_at", vec![ConditionExpr::param("from")]),
        ),
    );
    Plan::Sequential(SequentialPlan {
        actions: vec![
            ActionInstance::new("m1", &template, &["l1", "l2"]),
            ActionInstance::new("m2", &template, &["l2", "l3"]),
        ],
    })
}

fn locations(robot_at: bool, calls: &Arc<AtomicUsize>) -> Arc<Context> {
    let calls = Arc::clone(calls);
    Context::builder()
        .object("l1")
        .object("l2")
        .object("l3")
        .fluent("robot_at", move |_| Ok(Value::Bool(robot_at)))
        .action("move", move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Bool(true))
        })
        .build()
}

#[tokio::test]
async fn dry_run_sequential_moves_all_succeed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = moves();
    let graph = resolve(compile_plan(&plan).unwrap(), locations(true, &calls)).unwrap();
    let mut dispatcher = PlanDispatcher::new(ExecutionOptions::default().dry_run(true));

    let report = dispatcher.execute_plan(plan, graph).await.unwrap();
    assert_eq!(report.status, DispatcherStatus::Finished);
    let results: Vec<_> = report.action_results().collect();
    assert_eq!(results.len(), 2);
    for record in results {
        assert_eq!(record.result.precondition_status, ConditionStatus::Succeeded);
        assert_eq!(record.result.action_status, ActionNodeStatus::Succeeded);
        assert_eq!(record.result.postcondition_status, ConditionStatus::Succeeded);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dry_run_never_raises_and_still_invokes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = moves();

    let graph = resolve(compile_plan(&plan).unwrap(), locations(false, &calls)).unwrap();
    let mut strict = PlanDispatcher::new(ExecutionOptions::default());
    let report = strict.execute_plan(plan.clone(), graph).await.unwrap();
    assert_eq!(report.status, DispatcherStatus::Failed);
    assert!(report.failure.unwrap().to_string().contains("move(l1, l2)"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let graph = resolve(compile_plan(&plan).unwrap(), locations(false, &calls)).unwrap();
    let mut dry = PlanDispatcher::new(ExecutionOptions::default().dry_run(true));
    let report = dry.execute_plan(plan, graph).await.unwrap();
    assert!(report.succeeded(), "{report:?}");
    assert!(report.failure.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(
        report
            .action_results()
            .all(|record| record.result.message.is_some())
    );
}

#[tokio::test]
async fn nodes_without_conditions_evaluate_nothing() {
    let template = Arc::new(ActionTemplate::instantaneous("beep", &[]));
    let plan = Plan::Sequential(SequentialPlan {
        actions: vec![ActionInstance::new("b", &template, &[])],
    });
    let ctx = Context::builder()
        .action("beep", |_| Ok(Value::Bool(true)))
        .build();
    let graph = resolve(compile_plan(&plan).unwrap(), ctx).unwrap();
    let mut dispatcher = PlanDispatcher::new(ExecutionOptions::default());

    let report = dispatcher.execute_plan(plan, graph).await.unwrap();
    let record = report.action_results().next().unwrap();
    assert!(record.result.is_success());
    assert_eq!(record.result.evaluated_preconditions, 0);
    assert_eq!(record.result.evaluated_postconditions, 0);
}

#[tokio::test]
async fn joins_wait_for_every_branch() {
    let template = Arc::new(ActionTemplate::instantaneous("visit", &["at"]));
    let a = ActionInstance::new("a", &template, &["l1"]);
    let b = ActionInstance::new("b", &template, &["l2"]);
    let c = ActionInstance::new("c", &template, &["l3"]);
    let plan = Plan::PartialOrder(
        PartialOrderPlan::default()
            .with_successors(&a, &[&c])
            .with_successors(&b, &[&c]),
    );
    let log = Arc::new(Mutex::new(Vec::new()));
    let visits = Arc::clone(&log);
    let ctx = Context::builder()
        .object("l1")
        .object("l2")
        .object("l3")
        .action("visit", move |args| {
            visits
                .lock()
                .unwrap()
                .push(args.object_name("at").unwrap_or_default().to_string());
            Ok(Value::Bool(true))
        })
        .build();
    let graph = resolve(compile_plan(&plan).unwrap(), ctx).unwrap();
    let mut dispatcher = PlanDispatcher::new(ExecutionOptions::default().parallel_siblings(true));

    let report = dispatcher.execute_plan(plan, graph).await.unwrap();
    assert!(report.succeeded(), "{report:?}");
    let visited = log.lock().unwrap().clone();
    assert_eq!(visited.len(), 3);
    assert_eq!(visited[2], "l3");
    let monitor = dispatcher.monitor().unwrap();
    assert!(monitor.nodes().iter().all(|node| node.processed));
}

#[tokio::test]
async fn time_triggered_plans_run_through_the_temporal_executor() {
    let template = Arc::new(
        ActionTemplate::durative("charge", &["r"], Rational::from_integer(5))
            .with_condition(Interval::Start, ConditionExpr::fluent("docked", vec![ConditionExpr::param("r")]))
            .with_condition(Interval::End, ConditionExpr::fluent("docked", vec![ConditionExpr::param("r")]))
            .with_effect(
                Interval::End,
                ConditionExpr::fluent("charged", vec![ConditionExpr::param("r")]),
                ConditionExpr::boolean(true),
            ),
    );
    let mut plan = TimeTriggeredPlan::default();
    plan.push(Rational::ZERO, ActionInstance::new("c1", &template, &["r1"]), None);
    plan.push(Rational::ZERO, ActionInstance::new("c2", &template, &["r2"]), None);
    let plan = Plan::TimeTriggered(plan);

    let charged = Arc::new(Mutex::new(Vec::<String>::new()));
    let reader = Arc::clone(&charged);
    let writer = Arc::clone(&charged);
    let ctx = Context::builder()
        .object("r1")
        .object("r2")
        .fluent("docked", |_| Ok(Value::Bool(true)))
        .fluent("charged", move |args| {
            let robot = args.first().map(ToString::to_string).unwrap_or_default();
            Ok(Value::Bool(reader.lock().unwrap().contains(&robot)))
        })
        .action("charge", move |args| {
            writer
                .lock()
                .unwrap()
                .push(args.object_name("r").unwrap_or_default().to_string());
            Ok(Value::Bool(true))
        })
        .build();
    let graph = resolve(compile_plan(&plan).unwrap(), ctx).unwrap();
    let mut dispatcher = PlanDispatcher::new(ExecutionOptions::default());
    let mut stream = dispatcher.subscribe();

    let report = dispatcher.execute_plan(plan, graph).await.unwrap();
    assert!(report.succeeded(), "{report:?}");
    for record in report.action_results() {
        assert_eq!(record.result.evaluated_preconditions, 2);
        assert_eq!(record.result.evaluated_postconditions, 1);
    }
    let mut streamed = 0;
    while stream.try_recv().is_ok() {
        streamed += 1;
    }
    assert_eq!(streamed, 4);
}
