//! Values read out of host objects.

use serde::{Deserialize, Serialize};

use super::ObjectId;

/// Declared kind of a member, and the runtime kind of a non-null value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    /// A named constant of an enumeration type.
    Enum,
    /// A reference to another host object.
    Object,
    /// An array, list or other enumerable of values.
    Sequence,
}

impl ValueKind {
    /// Primitive, enumeration and text kinds. Traversal never descends into these.
    pub fn is_trivial(&self) -> bool {
        matches!(
            self,
            ValueKind::Bool | ValueKind::Int | ValueKind::Float | ValueKind::Text | ValueKind::Enum
        )
    }

    /// The value a member of this kind reads as before anything was assigned.
    pub fn default_value(&self) -> Value {
        match self {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            _ => Value::Null,
        }
    }
}

/// A value read from a host object member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Enum(String),
    Object(ObjectId),
    Sequence(Vec<Value>),
}

impl Value {
    /// Runtime kind of the value, `None` for null.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Enum(_) => Some(ValueKind::Enum),
            Value::Object(_) => Some(ValueKind::Object),
            Value::Sequence(_) => Some(ValueKind::Sequence),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_trivial(&self) -> bool {
        self.kind().is_some_and(|kind| kind.is_trivial())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Sequence of object references, in order.
    pub fn objects<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = ObjectId>,
    {
        Value::Sequence(ids.into_iter().map(Value::Object).collect())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::Object(value)
    }
}

impl From<Option<ObjectId>> for Value {
    fn from(value: Option<ObjectId>) -> Self {
        value.map(Value::Object).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_kinds() {
        assert!(Value::Int(3).is_trivial());
        assert!(Value::Text("x".into()).is_trivial());
        assert!(Value::Enum("Auto".into()).is_trivial());
        assert!(!Value::Object(ObjectId::new()).is_trivial());
        assert!(!Value::Sequence(vec![]).is_trivial());
        assert!(!Value::Null.is_trivial());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(ValueKind::Int.default_value(), Value::Int(0));
        assert_eq!(ValueKind::Bool.default_value(), Value::Bool(false));
        assert_eq!(ValueKind::Object.default_value(), Value::Null);
    }

    #[test]
    fn test_conversions() {
        let id = ObjectId::new();
        assert_eq!(Value::from(Some(id)).as_object(), Some(id));
        assert!(Value::from(None::<ObjectId>).is_null());
        assert_eq!(Value::from(238_i64).as_int(), Some(238));
        assert_eq!(Value::objects([id]).as_sequence().map(|s| s.len()), Some(1));
    }
}
