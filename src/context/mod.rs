pub mod resolver;

pub use resolver::{ResolvedAction, resolve};

use crate::expr::{RuntimeObject, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Fluent callable: positional object arguments in, state value out.
pub type FluentFn = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Action callable: keyword-bound grounded parameters in, outcome out.
///
/// `Value::Null` reports an unknown outcome; otherwise truthiness decides
/// success.
pub type ActionFn = Arc<dyn Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync>;

/// Ordered keyword arguments passed to an action callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<(String, Value)>);

impl Arguments {
    pub fn new(pairs: Vec<(String, Value)>) -> Self {
        Self(pairs)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Registered object name bound to `name`, if it is an object.
    pub fn object_name(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_object)
            .map(RuntimeObject::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.iter().map(|(_, value)| value.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Name-keyed registry of objects, actions and fluents shared by every node
/// of one executable graph.
///
/// Read-only after [`ContextBuilder::build`]; state that callables mutate
/// lives behind their own synchronisation.
#[derive(Default)]
pub struct Context {
    objects: BTreeMap<String, Value>,
    actions: BTreeMap<String, ActionFn>,
    fluents: BTreeMap<String, FluentFn>,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    pub fn object(&self, name: &str) -> Option<&Value> {
        self.objects.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&ActionFn> {
        self.actions.get(name)
    }

    pub fn fluent(&self, name: &str) -> Option<&FluentFn> {
        self.fluents.get(name)
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn fluent_names(&self) -> impl Iterator<Item = &str> {
        self.fluents.keys().map(String::as_str)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("objects", &self.objects.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("fluents", &self.fluents.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    inner: Context,
}

impl ContextBuilder {
    /// Registers a payload-free object under `name`.
    pub fn object(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let object = RuntimeObject::symbol(name.clone());
        self.register_object(name, object)
    }

    pub fn object_with<T: std::any::Any + Send + Sync>(
        self,
        name: impl Into<String>,
        payload: T,
    ) -> Self {
        let name = name.into();
        let object = RuntimeObject::with_payload(name.clone(), payload);
        self.register_object(name, object)
    }

    fn register_object(mut self, name: String, object: RuntimeObject) -> Self {
        let value = Value::Object(Arc::new(object));
        if self.inner.objects.insert(name.clone(), value).is_some() {
            warn!(object = %name, "context.duplicate_object");
        }
        self
    }

    pub fn action<F>(mut self, name: impl Into<String>, callable: F) -> Self
    where
        F: Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .inner
            .actions
            .insert(name.clone(), Arc::new(callable))
            .is_some()
        {
            warn!(action = %name, "context.duplicate_action");
        }
        self
    }

    pub fn fluent<F>(mut self, name: impl Into<String>, callable: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .inner
            .fluents
            .insert(name.clone(), Arc::new(callable))
            .is_some()
        {
            warn!(fluent = %name, "context.duplicate_fluent");
        }
        self
    }

    pub fn build(self) -> Arc<Context> {
        Arc::new(self.inner)
    }
}
