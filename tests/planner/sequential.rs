use planwright::graph::{NodeKind, compile_plan};
use planwright::plan::{ActionInstance, ActionTemplate, Plan, SequentialPlan};
use std::sync::Arc;

fn chain(len: usize) -> Plan {
    let template = Arc::new(ActionTemplate::instantaneous("step", &["n"]));
    let actions = (0..len)
        .map(|index| {
            let arg = format!("s{index}");
            ActionInstance::new(format!("step#{index}"), &template, &[arg.as_str()])
        })
        .collect();
    Plan::Sequential(SequentialPlan { actions })
}

#[test]
fn sequential_plans_compile_to_a_single_chain() {
    for len in 0..8 {
        let graph = compile_plan(&chain(len)).unwrap();
        assert_eq!(graph.node_count(), len + 2, "len {len}");
        assert_eq!(graph.edge_count(), len + 1, "len {len}");

        let order = graph.topological_order().unwrap();
        assert_eq!(order.first().copied(), graph.start());
        assert_eq!(order.last().copied(), graph.end());
        for pair in order.windows(2) {
            assert!(graph.has_edge(pair[0], pair[1]), "len {len}: {pair:?}");
        }
        for id in &order[1..order.len() - 1] {
            assert_eq!(graph.node(*id).unwrap().kind, NodeKind::Action);
            assert_eq!(graph.in_degree(*id), 1);
            assert_eq!(graph.out_degree(*id), 1);
        }
    }
}

#[test]
fn compiling_twice_gives_the_same_shape() {
    let plan = chain(5);
    let first = compile_plan(&plan).unwrap();
    let second = compile_plan(&plan).unwrap();
    assert_eq!(first.node_count(), second.node_count());
    assert_eq!(first.edges(), second.edges());
}

#[test]
fn arity_mismatch_is_rejected() {
    let template = Arc::new(ActionTemplate::instantaneous("move", &["from", "to"]));
    let plan = Plan::Sequential(SequentialPlan {
        actions: vec![ActionInstance::new("m", &template, &["l1"])],
    });
    let err = compile_plan(&plan).unwrap_err();
    assert!(err.to_string().contains("move"), "{err}");
}
