pub mod document;
pub mod expr;
pub mod rational;
pub mod types;

pub use document::{FluentDecl, InstanceSpec, PlanDocument, PlanSpec, StateEntry, TimedSpec};
pub use expr::{Constant, ConditionExpr, Effect};
pub use rational::Rational;
pub use types::{
    ActionInstance, ActionKind, ActionTemplate, InstanceId, Interval, PartialOrderPlan, Plan,
    PlanKind, SequentialPlan, TimeTriggeredPlan, TimedAction,
};
