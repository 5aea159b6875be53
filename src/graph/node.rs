use super::dag::NodeId;
use crate::context::{Context, ResolvedAction};
use crate::error::GraphError;
use crate::plan::{ActionInstance, ConditionExpr, Effect, InstanceId, Interval, Rational};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Start,
    End,
    Action,
}

/// Compiled plan step with its raw, per-interval conditions and effects.
#[derive(Debug, Clone)]
pub struct ActionNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub node_name: String,
    pub action: String,
    /// Formal parameter → concrete object name, in template order.
    pub parameters: Vec<(String, String)>,
    pub preconditions: BTreeMap<Interval, Vec<ConditionExpr>>,
    pub postconditions: BTreeMap<Interval, Vec<Effect>>,
    pub duration: Option<Rational>,
    pub start_time: Option<Rational>,
    /// Plan step this node was compiled from.
    pub origin: Option<InstanceId>,
}

impl ActionNode {
    pub fn start(id: NodeId) -> Self {
        Self::sentinel(id, NodeKind::Start, "start")
    }

    pub fn end(id: NodeId) -> Self {
        Self::sentinel(id, NodeKind::End, "end")
    }

    fn sentinel(id: NodeId, kind: NodeKind, name: &str) -> Self {
        Self {
            id,
            kind,
            node_name: name.to_string(),
            action: name.to_string(),
            parameters: Vec::new(),
            preconditions: BTreeMap::new(),
            postconditions: BTreeMap::new(),
            duration: None,
            start_time: None,
            origin: None,
        }
    }

    /// Grounds `instance` into a node, checking arity against its template.
    pub fn from_instance(id: NodeId, instance: &ActionInstance) -> Result<Self, GraphError> {
        let template = &instance.template;
        if template.parameters.len() != instance.arguments.len() {
            return Err(GraphError::ArityMismatch {
                instance: instance.to_string(),
                expected: template.parameters.len(),
                actual: instance.arguments.len(),
            });
        }

        Ok(Self {
            id,
            kind: NodeKind::Action,
            node_name: instance.to_string(),
            action: template.name.clone(),
            parameters: template
                .parameters
                .iter()
                .cloned()
                .zip(instance.arguments.iter().cloned())
                .collect(),
            preconditions: template.conditions_by_interval(),
            postconditions: template.effects_by_interval(),
            duration: template.duration(),
            start_time: None,
            origin: Some(instance.id.clone()),
        })
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind != NodeKind::Action
    }

    pub fn precondition_count(&self) -> usize {
        self.preconditions.values().map(Vec::len).sum()
    }
}

impl AsRef<ActionNode> for ActionNode {
    fn as_ref(&self) -> &ActionNode {
        self
    }
}

/// Node of an executable graph: the compiled node plus its resolved
/// callable and conditions, sharing one context with every other node.
#[derive(Debug, Clone)]
pub struct ExecutableNode {
    pub node: ActionNode,
    /// `None` for the start/end sentinels.
    pub resolved: Option<ResolvedAction>,
    pub context: Arc<Context>,
}

impl ExecutableNode {
    pub fn node_name(&self) -> &str {
        &self.node.node_name
    }
}

impl AsRef<ActionNode> for ExecutableNode {
    fn as_ref(&self) -> &ActionNode {
        &self.node
    }
}
