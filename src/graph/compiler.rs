use super::dag::{ExecutionGraph, NodeId};
use super::node::ActionNode;
use crate::error::GraphError;
use crate::plan::{
    ActionInstance, InstanceId, PartialOrderPlan, Plan, SequentialPlan, TimeTriggeredPlan,
    TimedAction,
};
use std::collections::HashMap;
use tracing::debug;

/// Graph of compiled but not yet resolved nodes.
pub type ActionGraph = ExecutionGraph<ActionNode>;

/// Compiles any plan shape into a validated graph bracketed by `start`/`end`.
pub fn compile_plan(plan: &Plan) -> Result<ActionGraph, GraphError> {
    let graph = match plan {
        Plan::Sequential(plan) => compile_sequential(plan)?,
        Plan::TimeTriggered(plan) => compile_time_triggered(plan)?,
        Plan::PartialOrder(plan) => compile_partial_order(plan)?,
    };
    graph.validate()?;
    debug!(
        kind = %plan.kind(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "plan.compiled"
    );
    Ok(graph)
}

fn compile_sequential(plan: &SequentialPlan) -> Result<ActionGraph, GraphError> {
    let mut graph = ActionGraph::new();
    let start = graph.add_node(ActionNode::start(graph.next_id()));
    let mut parent = start;
    for action in &plan.actions {
        let node = ActionNode::from_instance(graph.next_id(), action)?;
        let child = graph.add_node(node);
        graph.add_edge(parent, child, None);
        parent = child;
    }
    let end = graph.add_node(ActionNode::end(graph.next_id()));
    graph.add_edge(parent, end, None);
    Ok(graph)
}

/// Nodes are keyed by plan instance id, so two textually identical actions
/// remain distinct nodes.
fn compile_partial_order(plan: &PartialOrderPlan) -> Result<ActionGraph, GraphError> {
    let mut graph = ActionGraph::new();
    let start = graph.add_node(ActionNode::start(graph.next_id()));
    let mut ids: HashMap<InstanceId, NodeId> = HashMap::new();

    let mut intern = |graph: &mut ActionGraph,
                      instance: &ActionInstance|
     -> Result<NodeId, GraphError> {
        if let Some(id) = ids.get(&instance.id) {
            return Ok(*id);
        }
        let node = ActionNode::from_instance(graph.next_id(), instance)?;
        let id = graph.add_node(node);
        ids.insert(instance.id.clone(), id);
        Ok(id)
    };

    for (action, successors) in &plan.adjacency {
        let from = intern(&mut graph, action)?;
        for succ in successors {
            let to = intern(&mut graph, succ)?;
            graph.add_edge(from, to, None);
        }
    }

    let end = graph.add_node(ActionNode::end(graph.next_id()));
    let actions = graph
        .node_ids()
        .filter(|id| *id != start && *id != end)
        .collect::<Vec<_>>();
    for id in actions {
        if graph.in_degree(id) == 0 {
            graph.add_edge(start, id, None);
        }
        if graph.out_degree(id) == 0 {
            graph.add_edge(id, end, None);
        }
    }
    if graph.out_degree(start) == 0 {
        graph.add_edge(start, end, None);
    }
    Ok(graph)
}

/// Groups actions sharing a start time into waves and fully joins
/// consecutive waves; each join edge carries its destination's duration.
fn compile_time_triggered(plan: &TimeTriggeredPlan) -> Result<ActionGraph, GraphError> {
    let mut timed = plan.timed_actions.iter().collect::<Vec<&TimedAction>>();
    timed.sort_by(|lhs, rhs| lhs.start.cmp(&rhs.start));

    let mut graph = ActionGraph::new();
    let start = graph.add_node(ActionNode::start(graph.next_id()));

    let mut waves: Vec<Vec<NodeId>> = Vec::new();
    let mut wave_start = None;
    for entry in timed {
        let mut node = ActionNode::from_instance(graph.next_id(), &entry.action)?;
        node.duration = entry.duration.or(node.duration);
        node.start_time = Some(entry.start);
        if let Some(duration) = node.duration {
            node.node_name = format!("{}({duration})", node.node_name);
        }
        let id = graph.add_node(node);

        if wave_start == Some(entry.start)
            && let Some(wave) = waves.last_mut()
        {
            wave.push(id);
        } else {
            waves.push(vec![id]);
            wave_start = Some(entry.start);
        }
    }

    let end = graph.add_node(ActionNode::end(graph.next_id()));
    let weight_of = |graph: &ActionGraph, id: NodeId| graph.node(id).and_then(|node| node.duration);

    let mut previous = vec![start];
    for wave in &waves {
        for &from in &previous {
            for &to in wave {
                let weight = weight_of(&graph, to);
                graph.add_edge(from, to, weight);
            }
        }
        previous.clone_from(wave);
    }
    for from in previous {
        graph.add_edge(from, end, None);
    }
    Ok(graph)
}
