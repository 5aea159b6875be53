use planwright::graph::compile_plan;
use planwright::plan::{ActionInstance, ActionTemplate, Plan, Rational, TimeTriggeredPlan};
use std::sync::Arc;

fn durative(name: &str, duration: u64) -> Arc<ActionTemplate> {
    Arc::new(ActionTemplate::durative(
        name,
        &[],
        Rational::from_integer(duration),
    ))
}

#[test]
fn two_actions_at_zero_hang_between_start_and_end() {
    let mut plan = TimeTriggeredPlan::default();
    plan.push(
        Rational::ZERO,
        ActionInstance::new("a", &durative("a", 5), &[]),
        None,
    );
    plan.push(
        Rational::ZERO,
        ActionInstance::new("b", &durative("b", 3), &[]),
        None,
    );
    let graph = compile_plan(&Plan::TimeTriggered(plan)).unwrap();

    let start = graph.start().unwrap();
    let end = graph.end().unwrap();
    let a = graph.find_by_name("a()(5)").unwrap();
    let b = graph.find_by_name("b()(3)").unwrap();
    assert_eq!(graph.successors(start), &[a, b]);
    assert!(graph.has_edge(a, end) && graph.has_edge(b, end));
    assert!(!graph.has_edge(a, b) && !graph.has_edge(b, a));
    assert_eq!(graph.edge_count(), 4);
}

#[test]
fn edge_count_is_wave_joins_plus_first_wave() {
    // Wave sizes per start time.
    let shapes: &[&[usize]] = &[&[1], &[2, 1], &[1, 3, 2], &[3, 3], &[2, 2, 2, 1]];
    for waves in shapes {
        let mut plan = TimeTriggeredPlan::default();
        let mut counter = 0;
        for (step, size) in waves.iter().enumerate() {
            for _ in 0..*size {
                let name = format!("act{counter}");
                plan.push(
                    Rational::from_integer(step as u64 * 10),
                    ActionInstance::new(name.as_str(), &durative(&name, 1), &[]),
                    None,
                );
                counter += 1;
            }
        }
        let graph = compile_plan(&Plan::TimeTriggered(plan)).unwrap();

        let first = waves[0];
        let joins: usize = waves.windows(2).map(|pair| pair[0] * pair[1]).sum();
        let last = waves[waves.len() - 1];
        assert_eq!(graph.edge_count(), first + joins + last, "waves {waves:?}");
        assert_eq!(graph.out_degree(graph.start().unwrap()), first);
        assert_eq!(graph.in_degree(graph.end().unwrap()), last);
    }
}

#[test]
fn explicit_duration_overrides_template() {
    let mut plan = TimeTriggeredPlan::default();
    plan.push(
        Rational::ZERO,
        ActionInstance::new("a", &durative("a", 5), &[]),
        Some(Rational::new(3, 2).unwrap()),
    );
    let graph = compile_plan(&Plan::TimeTriggered(plan)).unwrap();
    let a = graph.find_by_name("a()(3/2)").unwrap();
    let start = graph.start().unwrap();
    assert_eq!(
        graph.edge(start, a).unwrap().weight,
        Some(Rational::new(3, 2).unwrap())
    );
    assert_eq!(graph.edge(a, graph.end().unwrap()).unwrap().weight, None);
}
