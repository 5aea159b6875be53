use super::node::{ActionNode, NodeKind};
use crate::error::GraphError;
use crate::plan::Rational;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt::{self, Write as _};

/// Arena index of a node inside an [`ExecutionGraph`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Rational>,
}

/// Directed graph over an arena of nodes.
///
/// Topology is append-only: nodes and edges can be added while compiling,
/// never removed.
#[derive(Debug, Clone)]
pub struct ExecutionGraph<N> {
    nodes: Vec<N>,
    edges: Vec<Edge>,
    successors: Vec<Vec<NodeId>>,
    predecessors: Vec<Vec<NodeId>>,
}

impl<N> Default for ExecutionGraph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
        }
    }
}

impl<N> ExecutionGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next call to [`Self::add_node`] will return.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len())
    }

    pub fn add_node(&mut self, node: N) -> NodeId {
        let id = self.next_id();
        self.nodes.push(node);
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        id
    }

    /// Adds `from -> to`. Returns `false` when the edge already exists or an
    /// endpoint is unknown.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: Option<Rational>) -> bool {
        if from.0 >= self.nodes.len() || to.0 >= self.nodes.len() || self.has_edge(from, to) {
            return false;
        }
        self.successors[from.0].push(to);
        self.predecessors[to.0].push(from);
        self.edges.push(Edge { from, to, weight });
        true
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.successors
            .get(from.0)
            .is_some_and(|succs| succs.contains(&to))
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|edge| edge.from == from && edge.to == to)
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<N> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.successors.get(id.0).map_or(&[], Vec::as_slice)
    }

    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.predecessors.get(id.0).map_or(&[], Vec::as_slice)
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.predecessors(id).len()
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.successors(id).len()
    }

    /// Rebuilds the graph with transformed nodes and identical topology.
    pub fn try_map_nodes<M, E>(
        self,
        mut map: impl FnMut(NodeId, N) -> Result<M, E>,
    ) -> Result<ExecutionGraph<M>, E> {
        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| map(NodeId(index), node))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(ExecutionGraph {
            nodes,
            edges: self.edges,
            successors: self.successors,
            predecessors: self.predecessors,
        })
    }
}

impl<N: AsRef<ActionNode>> ExecutionGraph<N> {
    pub fn start(&self) -> Option<NodeId> {
        self.find_kind(NodeKind::Start)
    }

    pub fn end(&self) -> Option<NodeId> {
        self.find_kind(NodeKind::End)
    }

    fn find_kind(&self, kind: NodeKind) -> Option<NodeId> {
        self.nodes()
            .find_map(|(id, node)| (node.as_ref().kind == kind).then_some(id))
    }

    /// Node whose display name is `name`.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes()
            .find_map(|(id, node)| (node.as_ref().node_name == name).then_some(id))
    }

    fn label(&self, id: NodeId) -> String {
        self.node(id)
            .map_or_else(|| id.to_string(), |node| node.as_ref().node_name.clone())
    }

    /// Checks the execution-graph shape: acyclic, exactly one indegree-0
    /// start, exactly one outdegree-0 end, and every node on a start→end path.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.check_acyclic()?;

        let roots = self
            .node_ids()
            .filter(|id| self.in_degree(*id) == 0)
            .collect::<Vec<_>>();
        let start = match roots.as_slice() {
            [only] if self.node(*only).map(|n| n.as_ref().kind) == Some(NodeKind::Start) => *only,
            _ => {
                return Err(GraphError::Sentinel {
                    role: "start",
                    count: roots.len(),
                });
            }
        };

        let sinks = self
            .node_ids()
            .filter(|id| self.out_degree(*id) == 0)
            .collect::<Vec<_>>();
        let end = match sinks.as_slice() {
            [only] if self.node(*only).map(|n| n.as_ref().kind) == Some(NodeKind::End) => *only,
            _ => {
                return Err(GraphError::Sentinel {
                    role: "end",
                    count: sinks.len(),
                });
            }
        };

        let forward = self.reachable(start, |id| self.successors(id));
        let backward = self.reachable(end, |id| self.predecessors(id));
        if let Some(stray) = self
            .node_ids()
            .find(|id| !forward.contains(id) || !backward.contains(id))
        {
            return Err(GraphError::Disconnected {
                node: self.label(stray),
            });
        }

        Ok(())
    }

    fn reachable<'a>(
        &'a self,
        from: NodeId,
        next: impl Fn(NodeId) -> &'a [NodeId],
    ) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(id) = queue.pop_front() {
            for neighbor in next(id) {
                if seen.insert(*neighbor) {
                    queue.push_back(*neighbor);
                }
            }
        }
        seen
    }

    /// Depth-first search over explicit `(node, next successor)` frames.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut states = vec![VisitState::Unvisited; self.node_count()];
        let mut frames: Vec<(NodeId, usize)> = Vec::new();

        for root in self.node_ids() {
            if states[root.0] != VisitState::Unvisited {
                continue;
            }
            states[root.0] = VisitState::Visiting;
            frames.push((root, 0));

            while let Some(frame) = frames.last_mut() {
                let (id, next) = *frame;
                let Some(&neighbor) = self.successors(id).get(next) else {
                    states[id.0] = VisitState::Visited;
                    frames.pop();
                    continue;
                };
                frame.1 += 1;
                match states[neighbor.0] {
                    VisitState::Visiting => {
                        let index = frames
                            .iter()
                            .position(|(entry, _)| *entry == neighbor)
                            .unwrap_or_default();
                        let path = frames[index..]
                            .iter()
                            .map(|(entry, _)| *entry)
                            .chain(std::iter::once(neighbor))
                            .map(|entry| self.label(entry))
                            .collect();
                        return Err(GraphError::Cycle { path });
                    }
                    VisitState::Visited => {}
                    VisitState::Unvisited => {
                        states[neighbor.0] = VisitState::Visiting;
                        frames.push((neighbor, 0));
                    }
                }
            }
        }
        Ok(())
    }

    /// Kahn ordering with smallest-id tie breaking.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        self.check_acyclic()?;

        let mut in_degree = self
            .node_ids()
            .map(|id| self.in_degree(id))
            .collect::<Vec<_>>();
        let mut queue = self
            .node_ids()
            .filter(|id| in_degree[id.0] == 0)
            .collect::<BTreeSet<_>>();

        let mut sorted = Vec::with_capacity(self.node_count());
        while let Some(id) = queue.pop_first() {
            sorted.push(id);
            for &neighbor in self.successors(id) {
                in_degree[neighbor.0] -= 1;
                if in_degree[neighbor.0] == 0 {
                    queue.insert(neighbor);
                }
            }
        }
        Ok(sorted)
    }

    /// Graphviz rendering; edge labels carry weights.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph plan {\n");
        for (id, node) in self.nodes() {
            let node = node.as_ref();
            let shape = if node.is_sentinel() { "doublecircle" } else { "box" };
            let _ = writeln!(
                out,
                "  {id} [label=\"{}\", shape={shape}];",
                node.node_name.replace('"', "\\\"")
            );
        }
        for edge in &self.edges {
            match edge.weight {
                Some(weight) => {
                    let _ = writeln!(out, "  {} -> {} [label=\"{weight}\"];", edge.from, edge.to);
                }
                None => {
                    let _ = writeln!(out, "  {} -> {};", edge.from, edge.to);
                }
            }
        }
        out.push_str("}\n");
        out
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self
                .nodes()
                .map(|(id, node)| {
                    let node = node.as_ref();
                    NodeSummary {
                        id,
                        kind: node.kind,
                        node_name: node.node_name.clone(),
                        action: node.action.clone(),
                        origin: node.origin.as_ref().map(ToString::to_string),
                        duration: node.duration,
                    }
                })
                .collect(),
            edges: self.edges.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Visiting,
    Visited,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub kind: NodeKind,
    pub node_name: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Rational>,
}

/// JSON-friendly view of a graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub nodes: Vec<NodeSummary>,
    pub edges: Vec<Edge>,
}
