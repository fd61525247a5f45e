//! Host value representation.

use std::fmt;

use super::Handle;

/// A value crossing the boundary between the host and native slots.
///
/// Primitives travel by value; instances travel as [`Handle`]s. A `Value`
/// returned from a slot that holds an `Object` owns one reference to it,
/// which the receiver must eventually close.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Absence of a value
    None,
    /// Integer (all native integer widths widen to i64)
    Int(i64),
    /// Floating point (f32 widens to f64)
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Owned string
    Str(String),
    /// Reference to a heap instance
    Object(Handle),
}

impl Value {
    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Object(_) => "object",
        }
    }

    /// Check if this is `None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Get the handle if this is an object.
    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            Value::Object(h) => Some(*h),
            _ => None,
        }
    }

    /// Get the integer if this is an int.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(h) => write!(f, "Object({:?})", h),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Value::Object(h)
    }
}
