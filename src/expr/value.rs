use crate::plan::Constant;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Registered application object.
///
/// Identity is the registration name; the payload is opaque to the executor
/// and only inspected by user callables via [`RuntimeObject::downcast_ref`].
pub struct RuntimeObject {
    name: String,
    payload: Option<Box<dyn Any + Send + Sync>>,
}

impl RuntimeObject {
    pub fn symbol(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload<T: Any + Send + Sync>(name: impl Into<String>, payload: T) -> Self {
        Self {
            name: name.into(),
            payload: Some(Box::new(payload)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for RuntimeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeObject")
            .field("name", &self.name)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

/// Runtime value produced by evaluating an executable expression or
/// returned by a user callable.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Object(Arc<RuntimeObject>),
}

impl Value {
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(Arc::new(RuntimeObject::symbol(name)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness used for action outcomes and boolean connectives:
    /// zero, `false` and `Null` are falsy, objects are truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Real(value) => *value != 0.0,
            Self::Object(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RuntimeObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Object(_) => "object",
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Self::Int(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric ordering; `None` when either side is not numeric.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if let (Self::Int(lhs), Self::Int(rhs)) = (self, other) {
            return Some(lhs.cmp(rhs));
        }
        self.as_number()?.partial_cmp(&other.as_number()?)
    }

    /// Converts a non-object constant. Object constants need a context lookup.
    pub fn from_literal(constant: &Constant) -> Option<Self> {
        match constant {
            Constant::Bool(value) => Some(Self::Bool(*value)),
            Constant::Int(value) => Some(Self::Int(*value)),
            Constant::Real(value) => Some(Self::Real(*value)),
            Constant::Object(_) => None,
        }
    }
}

/// Agrees with [`Value::compare`]: booleans count as 0/1 against numbers.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Object(lhs), Self::Object(rhs)) => lhs.name == rhs.name,
            (
                Self::Bool(_) | Self::Int(_) | Self::Real(_),
                Self::Bool(_) | Self::Int(_) | Self::Real(_),
            ) => self.compare(other) == Some(Ordering::Equal),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Object(object) => f.write_str(&object.name),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::Real(value) => serializer.serialize_f64(*value),
            Self::Object(object) => serializer.serialize_str(&object.name),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<Option<bool>> for Value {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Null, Self::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_zero_and_null() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(!Value::Real(0.0).truthy());
        assert!(Value::Int(-2).truthy());
        assert!(Value::object("l1").truthy());
    }

    #[test]
    fn numeric_equality_crosses_int_and_real() {
        assert_eq!(Value::Int(2), Value::Real(2.0));
        assert_ne!(Value::Int(2), Value::Bool(true));
        assert_ne!(Value::Null, Value::Bool(false));
        assert_eq!(
            Value::Int(1).compare(&Value::Real(1.5)),
            Some(Ordering::Less)
        );
        assert!(Value::object("a").compare(&Value::Int(1)).is_none());
    }

    #[test]
    fn bool_equality_matches_ordering() {
        for (lhs, rhs) in [
            (Value::Int(1), Value::Bool(true)),
            (Value::Real(0.0), Value::Bool(false)),
            (Value::Bool(true), Value::Bool(true)),
        ] {
            assert_eq!(lhs.compare(&rhs), Some(Ordering::Equal));
            assert_eq!(lhs, rhs);
        }
        assert_ne!(Value::Bool(false), Value::Bool(true));
    }

    #[test]
    fn objects_compare_by_name() {
        let a = Value::Object(Arc::new(RuntimeObject::with_payload("l1", 7_u32)));
        assert_eq!(a, Value::object("l1"));
        assert_ne!(a, Value::object("l2"));
        assert_eq!(a.as_object().and_then(|o| o.downcast_ref::<u32>()), Some(&7));
    }

    #[test]
    fn serializes_objects_as_names() {
        let encoded = serde_json::to_string(&vec![
            Value::Null,
            Value::Bool(true),
            Value::object("l3"),
        ])
        .unwrap();
        assert_eq!(encoded, r#"[null,true,"l3"]"#);
    }
}
