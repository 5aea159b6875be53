//! In-memory world for running plan documents without real actuators.
//!
//! Fluents read from a shared state table seeded from the document's initial
//! state. Every template becomes an action that writes its constant-valued
//! effects into the table and reports success.

use crate::context::{Arguments, Context};
use crate::expr::Value;
use crate::plan::{ActionTemplate, ConditionExpr, Constant, PlanDocument};
use anyhow::{Result, anyhow};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;

type StateKey = (String, Vec<String>);

#[derive(Debug, Default)]
struct StateTable {
    values: BTreeMap<StateKey, Value>,
    defaults: HashMap<String, Value>,
}

impl StateTable {
    fn get(&self, fluent: &str, args: &[String]) -> Value {
        self.values
            .get(&(fluent.to_string(), args.to_vec()))
            .or_else(|| self.defaults.get(fluent))
            .cloned()
            .unwrap_or(Value::Bool(false))
    }

    fn set(&mut self, fluent: &str, args: Vec<String>, value: Value) {
        self.values.insert((fluent.to_string(), args), value);
    }
}

fn constant_value(constant: &Constant) -> Value {
    match constant {
        Constant::Object(name) => Value::object(name.clone()),
        other => Value::from_literal(other).unwrap_or_default(),
    }
}

/// Object name an effect argument refers to under the given bindings.
fn argument_name(expr: &ConditionExpr, arguments: &Arguments) -> Option<String> {
    match expr {
        ConditionExpr::Parameter { name } => arguments.get(name).map(ToString::to_string),
        ConditionExpr::Constant { value } => Some(value.to_string()),
        _ => None,
    }
}

fn effect_value(expr: &ConditionExpr, arguments: &Arguments) -> Option<Value> {
    match expr {
        ConditionExpr::Constant { value } => Some(constant_value(value)),
        ConditionExpr::Parameter { name } => arguments.get(name).cloned(),
        _ => None,
    }
}

pub struct Simulation {
    state: Arc<Mutex<StateTable>>,
    context: Arc<Context>,
}

impl Simulation {
    pub fn new(document: &PlanDocument) -> Result<Self> {
        let mut table = StateTable::default();
        for fluent in &document.fluents {
            table
                .defaults
                .insert(fluent.name.clone(), constant_value(&fluent.default));
        }
        for entry in &document.initial_state {
            table.set(&entry.fluent, entry.args.clone(), constant_value(&entry.value));
        }
        let state = Arc::new(Mutex::new(table));

        let mut builder = Context::builder();
        for object in &document.objects {
            builder = builder.object(object.clone());
        }
        for name in fluent_names(document) {
            let state = Arc::clone(&state);
            let fluent = name.clone();
            builder = builder.fluent(name, move |args| {
                let key: Vec<String> = args.iter().map(ToString::to_string).collect();
                let table = state
                    .lock()
                    .map_err(|_| anyhow!("simulation state lock poisoned"))?;
                Ok(table.get(&fluent, &key))
            });
        }
        for template in &document.actions {
            let state = Arc::clone(&state);
            let template = template.clone();
            builder = builder.action(template.name.clone(), move |args| {
                apply_effects(&template, args, &state)?;
                Ok(Value::Bool(true))
            });
        }

        Ok(Self {
            state,
            context: builder.build(),
        })
    }

    pub fn context(&self) -> Arc<Context> {
        Arc::clone(&self.context)
    }

    /// Current value of `fluent(args)`, falling back to the declared default.
    pub fn value(&self, fluent: &str, args: &[&str]) -> Option<Value> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.state.lock().ok().map(|table| table.get(fluent, &args))
    }

    /// Every explicitly set fluent value, rendered as `name(args) = value`.
    pub fn snapshot(&self) -> Vec<String> {
        let Ok(table) = self.state.lock() else {
            return Vec::new();
        };
        table
            .values
            .iter()
            .map(|((fluent, args), value)| format!("{fluent}({}) = {value}", args.join(", ")))
            .collect()
    }
}

/// Declared fluents plus any fluent referenced by a template.
fn fluent_names(document: &PlanDocument) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = document
        .fluents
        .iter()
        .map(|fluent| fluent.name.clone())
        .collect();
    for template in &document.actions {
        for conditions in template.conditions_by_interval().values() {
            for condition in conditions {
                names.extend(condition.fluent_names().into_iter().map(str::to_string));
            }
        }
        for effects in template.effects_by_interval().values() {
            for effect in effects {
                names.extend(effect.fluent.fluent_names().into_iter().map(str::to_string));
                names.extend(effect.value.fluent_names().into_iter().map(str::to_string));
            }
        }
    }
    names
}

fn apply_effects(
    template: &ActionTemplate,
    arguments: &Arguments,
    state: &Mutex<StateTable>,
) -> Result<()> {
    let mut table = state
        .lock()
        .map_err(|_| anyhow!("simulation state lock poisoned"))?;
    for effects in template.effects_by_interval().into_values() {
        for effect in effects {
            let ConditionExpr::Fluent { name, args } = &effect.fluent else {
                debug!(action = %template.name, effect = %effect.fluent, "simulation.skip_effect");
                continue;
            };
            let Some(key) = args
                .iter()
                .map(|arg| argument_name(arg, arguments))
                .collect::<Option<Vec<_>>>()
            else {
                debug!(action = %template.name, fluent = %name, "simulation.skip_effect");
                continue;
            };
            let Some(value) = effect_value(&effect.value, arguments) else {
                debug!(action = %template.name, fluent = %name, "simulation.skip_effect");
                continue;
            };
            table.set(name, key, value);
        }
    }
    Ok(())
}
