pub mod behavior_tree;
pub mod dispatcher;
pub mod plan_monitor;
pub mod replan;

pub use behavior_tree::{ActionBatch, BehaviorTree, Verdict};
pub use dispatcher::{DispatchReport, NodeResult, PlanDispatcher};
pub use plan_monitor::{MonitorNode, PlanMonitor};
pub use replan::{FailureKind, RecoveryRule, Replanner, RuleTable};
