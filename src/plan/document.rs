use super::expr::Constant;
use super::rational::Rational;
use super::types::{
    ActionInstance, ActionTemplate, InstanceId, PartialOrderPlan, Plan, SequentialPlan,
    TimeTriggeredPlan,
};
use crate::error::GraphError;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Declared fluent with its default value for unlisted argument tuples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluentDecl {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub default: Constant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub fluent: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub value: Constant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSpec {
    pub start: Rational,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Rational>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanSpec {
    Sequential {
        #[serde(default)]
        actions: Vec<InstanceSpec>,
    },
    TimeTriggered {
        #[serde(default)]
        actions: Vec<TimedSpec>,
    },
    PartialOrder {
        #[serde(default)]
        actions: Vec<InstanceSpec>,
        #[serde(default)]
        successors: BTreeMap<String, Vec<String>>,
    },
}

/// JSON plan file: domain declarations, initial state and the plan itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub fluents: Vec<FluentDecl>,
    #[serde(default)]
    pub actions: Vec<ActionTemplate>,
    #[serde(default)]
    pub initial_state: Vec<StateEntry>,
    pub plan: PlanSpec,
}

impl PlanDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse plan document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan document {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid plan document {}", path.display()))
    }

    pub fn template(&self, name: &str) -> Option<&ActionTemplate> {
        self.actions.iter().find(|template| template.name == name)
    }

    /// Resolves template names into shared templates and builds the plan value.
    pub fn to_plan(&self) -> std::result::Result<Plan, GraphError> {
        let templates: HashMap<&str, Arc<ActionTemplate>> = self
            .actions
            .iter()
            .map(|template| (template.name.as_str(), Arc::new(template.clone())))
            .collect();

        let instantiate = |index: usize,
                           id: Option<&String>,
                           action: &str,
                           arguments: &[String]|
         -> std::result::Result<ActionInstance, GraphError> {
            let template = templates
                .get(action)
                .ok_or_else(|| GraphError::UnknownTemplate {
                    name: action.to_string(),
                })?;
            let id = id.cloned().unwrap_or_else(|| format!("{action}#{index}"));
            Ok(ActionInstance {
                id: InstanceId(id),
                template: Arc::clone(template),
                arguments: arguments.to_vec(),
            })
        };

        match &self.plan {
            PlanSpec::Sequential { actions } => {
                let actions = actions
                    .iter()
                    .enumerate()
                    .map(|(index, spec)| {
                        instantiate(index, spec.id.as_ref(), &spec.action, &spec.arguments)
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(Plan::Sequential(SequentialPlan { actions }))
            }
            PlanSpec::TimeTriggered { actions } => {
                let mut plan = TimeTriggeredPlan::default();
                for (index, spec) in actions.iter().enumerate() {
                    let action =
                        instantiate(index, spec.id.as_ref(), &spec.action, &spec.arguments)?;
                    let duration = spec.duration.or_else(|| action.template.duration());
                    plan.push(spec.start, action, duration);
                }
                Ok(Plan::TimeTriggered(plan))
            }
            PlanSpec::PartialOrder {
                actions,
                successors,
            } => {
                let mut by_id: BTreeMap<String, ActionInstance> = BTreeMap::new();
                let mut order = Vec::with_capacity(actions.len());
                for (index, spec) in actions.iter().enumerate() {
                    let instance =
                        instantiate(index, spec.id.as_ref(), &spec.action, &spec.arguments)?;
                    let key = instance.id.0.clone();
                    if by_id.contains_key(&key) {
                        return Err(GraphError::DuplicateInstance(key));
                    }
                    order.push(key.clone());
                    by_id.insert(key, instance);
                }

                for (key, succs) in successors {
                    if !by_id.contains_key(key) {
                        return Err(GraphError::UnknownInstance(key.clone()));
                    }
                    if let Some(missing) = succs.iter().find(|succ| !by_id.contains_key(*succ)) {
                        return Err(GraphError::UnknownInstance(missing.clone()));
                    }
                }

                let mut adjacency = Vec::with_capacity(order.len());
                for key in &order {
                    let Some(instance) = by_id.get(key) else {
                        continue;
                    };
                    let succs = successors
                        .get(key)
                        .map(|names| {
                            names
                                .iter()
                                .filter_map(|name| by_id.get(name).cloned())
                                .collect()
                        })
                        .unwrap_or_default();
                    adjacency.push((instance.clone(), succs));
                }
                Ok(Plan::PartialOrder(PartialOrderPlan { adjacency }))
            }
        }
    }
}
