use super::expr::{ConditionExpr, Effect};
use super::rational::Rational;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Temporal scope of a condition or effect.
///
/// Instantaneous actions only use `Instant`/`Start`. Ordering follows the
/// evaluation order inside a durative action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Interval {
    Instant,
    Start,
    Overall,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    Instantaneous {
        #[serde(default)]
        preconditions: Vec<ConditionExpr>,
        #[serde(default)]
        effects: Vec<Effect>,
    },
    Durative {
        duration: Rational,
        #[serde(default)]
        conditions: BTreeMap<Interval, Vec<ConditionExpr>>,
        #[serde(default)]
        effects: BTreeMap<Interval, Vec<Effect>>,
    },
}

/// Lifted action schema: formal parameters plus conditions and effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl ActionTemplate {
    pub fn instantaneous(name: impl Into<String>, parameters: &[&str]) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(ToString::to_string).collect(),
            kind: ActionKind::Instantaneous {
                preconditions: Vec::new(),
                effects: Vec::new(),
            },
        }
    }

    pub fn durative(name: impl Into<String>, parameters: &[&str], duration: Rational) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(ToString::to_string).collect(),
            kind: ActionKind::Durative {
                duration,
                conditions: BTreeMap::new(),
                effects: BTreeMap::new(),
            },
        }
    }

    /// Adds a precondition. Instantaneous actions ignore `interval`.
    pub fn with_condition(mut self, interval: Interval, condition: ConditionExpr) -> Self {
        match &mut self.kind {
            ActionKind::Instantaneous { preconditions, .. } => preconditions.push(condition),
            ActionKind::Durative { conditions, .. } => {
                conditions.entry(interval).or_default().push(condition);
            }
        }
        self
    }

    /// Adds an effect. Instantaneous actions ignore `interval`.
    pub fn with_effect(
        mut self,
        interval: Interval,
        fluent: ConditionExpr,
        value: ConditionExpr,
    ) -> Self {
        let effect = Effect::new(fluent, value);
        match &mut self.kind {
            ActionKind::Instantaneous { effects, .. } => effects.push(effect),
            ActionKind::Durative { effects, .. } => {
                effects.entry(interval).or_default().push(effect);
            }
        }
        self
    }

    pub fn is_durative(&self) -> bool {
        matches!(self.kind, ActionKind::Durative { .. })
    }

    pub fn duration(&self) -> Option<Rational> {
        match &self.kind {
            ActionKind::Instantaneous { .. } => None,
            ActionKind::Durative { duration, .. } => Some(*duration),
        }
    }

    /// Conditions bucketed by interval; instantaneous conditions land on `Start`.
    pub fn conditions_by_interval(&self) -> BTreeMap<Interval, Vec<ConditionExpr>> {
        match &self.kind {
            ActionKind::Instantaneous { preconditions, .. } => {
                let mut buckets = BTreeMap::new();
                if !preconditions.is_empty() {
                    buckets.insert(Interval::Start, preconditions.clone());
                }
                buckets
            }
            ActionKind::Durative { conditions, .. } => conditions.clone(),
        }
    }

    /// Effects bucketed by interval; instantaneous effects land on `Start`.
    pub fn effects_by_interval(&self) -> BTreeMap<Interval, Vec<Effect>> {
        match &self.kind {
            ActionKind::Instantaneous { effects, .. } => {
                let mut buckets = BTreeMap::new();
                if !effects.is_empty() {
                    buckets.insert(Interval::Start, effects.clone());
                }
                buckets
            }
            ActionKind::Durative { effects, .. } => effects.clone(),
        }
    }
}

/// Plan-assigned identity of one action occurrence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Grounded occurrence of a template: concrete object names for each formal.
#[derive(Debug, Clone)]
pub struct ActionInstance {
    pub id: InstanceId,
    pub template: Arc<ActionTemplate>,
    pub arguments: Vec<String>,
}

impl ActionInstance {
    pub fn new(
        id: impl Into<InstanceId>,
        template: &Arc<ActionTemplate>,
        arguments: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            template: Arc::clone(template),
            arguments: arguments.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }
}

impl fmt::Display for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.template.name, self.arguments.join(", "))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequentialPlan {
    pub actions: Vec<ActionInstance>,
}

#[derive(Debug, Clone)]
pub struct TimedAction {
    pub start: Rational,
    pub action: ActionInstance,
    pub duration: Option<Rational>,
}

#[derive(Debug, Clone, Default)]
pub struct TimeTriggeredPlan {
    pub timed_actions: Vec<TimedAction>,
}

impl TimeTriggeredPlan {
    pub fn push(&mut self, start: Rational, action: ActionInstance, duration: Option<Rational>) {
        self.timed_actions.push(TimedAction {
            start,
            action,
            duration,
        });
    }
}

/// Adjacency form: each entry lists an action and its direct successors.
#[derive(Debug, Clone, Default)]
pub struct PartialOrderPlan {
    pub adjacency: Vec<(ActionInstance, Vec<ActionInstance>)>,
}

impl PartialOrderPlan {
    pub fn with_successors(
        mut self,
        action: &ActionInstance,
        successors: &[&ActionInstance],
    ) -> Self {
        self.adjacency.push((
            action.clone(),
            successors.iter().map(|succ| (*succ).clone()).collect(),
        ));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanKind {
    Sequential,
    TimeTriggered,
    PartialOrder,
}

/// Plan as produced by the external planner.
#[derive(Debug, Clone)]
pub enum Plan {
    Sequential(SequentialPlan),
    TimeTriggered(TimeTriggeredPlan),
    PartialOrder(PartialOrderPlan),
}

impl Plan {
    pub fn kind(&self) -> PlanKind {
        match self {
            Self::Sequential(_) => PlanKind::Sequential,
            Self::TimeTriggered(_) => PlanKind::TimeTriggered,
            Self::PartialOrder(_) => PlanKind::PartialOrder,
        }
    }

    /// Number of distinct action occurrences in the plan.
    pub fn action_count(&self) -> usize {
        match self {
            Self::Sequential(plan) => plan.actions.len(),
            Self::TimeTriggered(plan) => plan.timed_actions.len(),
            Self::PartialOrder(plan) => {
                let mut ids = std::collections::BTreeSet::new();
                for (action, successors) in &plan.adjacency {
                    ids.insert(&action.id);
                    ids.extend(successors.iter().map(|succ| &succ.id));
                }
                ids.len()
            }
        }
    }
}
