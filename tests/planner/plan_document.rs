use planwright::context::resolve;
use planwright::execution::ExecutionOptions;
use planwright::expr::Value;
use planwright::graph::compile_plan;
use planwright::monitor::PlanDispatcher;
use planwright::plan::{PlanDocument, PlanKind};
use planwright::simulation::Simulation;
use serde_json::json;

fn delivery() -> PlanDocument {
    PlanDocument::from_json(
        &json!({
            "objects": ["truck", "depot", "shop"],
            "fluents": [
                { "name": "at", "parameters": ["v", "l"] }
            ],
            "actions": [
                {
                    "name": "drive",
                    "parameters": ["v", "from", "to"],
                    "kind": "durative",
                    "duration": 4,
                    "conditions": {
                        "start": [{ "op": "fluent", "name": "at", "args": [
                            { "op": "parameter", "name": "v" }, { "op": "parameter", "name": "from" }
                        ]}]
                    },
                    "effects": {
                        "start": [{
                            "fluent": { "op": "fluent", "name": "at", "args": [
                                { "op": "parameter", "name": "v" }, { "op": "parameter", "name": "from" }
                            ]},
                            "value": { "op": "constant", "value": false }
                        }],
                        "end": [{
                            "fluent": { "op": "fluent", "name": "at", "args": [
                                { "op": "parameter", "name": "v" }, { "op": "parameter", "name": "to" }
                            ]},
                            "value": { "op": "constant", "value": true }
                        }]
                    }
                }
            ],
            "initial_state": [
                { "fluent": "at", "args": ["truck", "depot"], "value": true }
            ],
            "plan": {
                "kind": "time_triggered",
                "actions": [
                    { "start": 0, "action": "drive", "arguments": ["truck", "depot", "shop"] },
                    { "start": "9/2", "id": "back", "action": "drive", "arguments": ["truck", "shop", "depot"] }
                ]
            }
        })
        .to_string(),
    )
    .unwrap()
}

#[test]
fn document_builds_a_time_triggered_plan() {
    let plan = delivery().to_plan().unwrap();
    assert_eq!(plan.kind(), PlanKind::TimeTriggered);
    assert_eq!(plan.action_count(), 2);

    let graph = compile_plan(&plan).unwrap();
    assert_eq!(graph.node_count(), 4);
    assert!(graph.find_by_name("drive(truck, depot, shop)(4)").is_some());
}

#[test]
fn unknown_template_is_rejected() {
    let mut document = delivery();
    document.actions.clear();
    let err = document.to_plan().unwrap_err();
    assert!(err.to_string().contains("drive"));
}

#[tokio::test]
async fn simulated_round_trip_ends_back_at_the_depot() {
    let document = delivery();
    let plan = document.to_plan().unwrap();
    let simulation = Simulation::new(&document).unwrap();
    let graph = resolve(compile_plan(&plan).unwrap(), simulation.context()).unwrap();
    let mut dispatcher = PlanDispatcher::new(ExecutionOptions::default());

    let report = dispatcher.execute_plan(plan, graph).await.unwrap();
    assert!(report.succeeded(), "{report:?}");
    assert_eq!(
        simulation.value("at", &["truck", "depot"]),
        Some(Value::Bool(true))
    );
    assert_eq!(
        simulation.value("at", &["truck", "shop"]),
        Some(Value::Bool(false))
    );
}
