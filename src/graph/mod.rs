pub mod compiler;
pub mod dag;
pub mod node;

pub use compiler::{ActionGraph, compile_plan};
pub use dag::{Edge, ExecutionGraph, GraphSummary, NodeId, NodeSummary};
pub use node::{ActionNode, ExecutableNode, NodeKind};

/// Graph whose nodes carry resolved callables and compiled conditions.
pub type ExecutableGraph = ExecutionGraph<ExecutableNode>;
