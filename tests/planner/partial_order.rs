use planwright::graph::compile_plan;
use planwright::plan::{ActionInstance, ActionTemplate, PartialOrderPlan, Plan};
use std::sync::Arc;

fn instances(count: usize) -> Vec<ActionInstance> {
    let template = Arc::new(ActionTemplate::instantaneous("pick", &["item"]));
    (0..count)
        .map(|index| ActionInstance::new(format!("pick#{index}"), &template, &["box"]))
        .collect()
}

#[test]
fn sources_and_sinks_attach_to_sentinels_exactly_once() {
    // 0 -> {1, 2}, 1 -> 3, 2 -> 3, 4 isolated
    let acts = instances(5);
    let plan = PartialOrderPlan::default()
        .with_successors(&acts[0], &[&acts[1], &acts[2]])
        .with_successors(&acts[1], &[&acts[3]])
        .with_successors(&acts[2], &[&acts[3]])
        .with_successors(&acts[4], &[]);
    let graph = compile_plan(&Plan::PartialOrder(plan)).unwrap();
    graph.validate().unwrap();

    let start = graph.start().unwrap();
    let end = graph.end().unwrap();
    assert_eq!(graph.node_count(), 7);
    assert_eq!(graph.out_degree(start), 2);
    assert_eq!(graph.in_degree(end), 2);
    for id in graph.node_ids() {
        if id == start || id == end {
            continue;
        }
        let from_start = graph.predecessors(id).iter().filter(|p| **p == start).count();
        let to_end = graph.successors(id).iter().filter(|s| **s == end).count();
        assert!(from_start <= 1 && to_end <= 1);
        if graph.predecessors(id).iter().all(|p| *p == start) {
            assert_eq!(from_start, 1);
        }
        if graph.successors(id).iter().all(|s| *s == end) {
            assert_eq!(to_end, 1);
        }
    }
}

#[test]
fn identical_actions_stay_distinct_nodes() {
    let acts = instances(2);
    assert_eq!(acts[0].to_string(), acts[1].to_string());
    let plan = PartialOrderPlan::default().with_successors(&acts[0], &[&acts[1]]);
    let graph = compile_plan(&Plan::PartialOrder(plan)).unwrap();

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.topological_order().unwrap().len(), 4);
}

#[test]
fn cycles_are_reported_with_their_path() {
    let acts = instances(2);
    let plan = PartialOrderPlan::default()
        .with_successors(&acts[0], &[&acts[1]])
        .with_successors(&acts[1], &[&acts[0]]);
    let err = compile_plan(&Plan::PartialOrder(plan)).unwrap_err();
    assert!(err.to_string().contains("pick(box)"), "{err}");
}
