//! Attribute descriptors: payload members, methods and module functions.

use std::fmt;

use crate::args::{ArgSpec, ParsedArgs};
use crate::convert::FromValue;
use crate::error::{NativeError, RegistrationError};
use crate::qualified_name::QualifiedName;
use crate::runtime::{CallContext, Handle, Payload, Value};

// ============================================================================
// Members
// ============================================================================

/// Native type of a payload member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// i32
    Int,
    /// i64
    Long,
    /// f32
    Float,
    /// f64
    Double,
    /// bool, one byte
    Bool,
}

impl MemberKind {
    /// Stored size in bytes.
    pub fn size(self) -> usize {
        match self {
            MemberKind::Int | MemberKind::Float => 4,
            MemberKind::Long | MemberKind::Double => 8,
            MemberKind::Bool => 1,
        }
    }

    /// Read the member at `offset` as a host value.
    pub fn read(self, payload: &Payload, offset: usize) -> Result<Value, NativeError> {
        Ok(match self {
            MemberKind::Int => Value::Int(payload.read::<i32>(offset)?.into()),
            MemberKind::Long => Value::Int(payload.read::<i64>(offset)?),
            MemberKind::Float => Value::Float(payload.read::<f32>(offset)?.into()),
            MemberKind::Double => Value::Float(payload.read::<f64>(offset)?),
            MemberKind::Bool => Value::Bool(payload.read::<bool>(offset)?),
        })
    }

    /// Convert `value` and store it at `offset`.
    pub fn write(self, payload: &mut Payload, offset: usize, value: &Value) -> Result<(), NativeError> {
        match self {
            MemberKind::Int => payload.write(offset, i32::from_value(value)?),
            MemberKind::Long => payload.write(offset, i64::from_value(value)?),
            MemberKind::Float => payload.write(offset, f32::from_value(value)?),
            MemberKind::Double => payload.write(offset, f64::from_value(value)?),
            MemberKind::Bool => payload.write(offset, bool::from_value(value)?),
        }
    }
}

/// A named, typed field at a fixed payload offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
    pub offset: usize,
    pub readonly: bool,
}

impl MemberDef {
    /// A writable member.
    pub fn new(name: impl Into<String>, kind: MemberKind, offset: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            offset,
            readonly: false,
        }
    }

    /// Mark the member read-only.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// First byte past the member.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.kind.size())
    }
}

// ============================================================================
// Methods
// ============================================================================

/// A bound method: receives the instance and its arguments.
pub type MethodFn = fn(&mut CallContext<'_>, Handle, &ParsedArgs) -> Result<Value, NativeError>;

/// A named method on a type.
#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub func: MethodFn,
    pub args: Option<ArgSpec>,
}

impl MethodDef {
    /// A method taking no arguments.
    pub fn noargs(name: impl Into<String>, func: MethodFn) -> Self {
        Self {
            name: name.into(),
            func,
            args: Some(ArgSpec::new()),
        }
    }

    /// A method taking exactly one positional argument of any type.
    pub fn single(name: impl Into<String>, func: MethodFn) -> Self {
        let spec = ArgSpec::from_format("O").unwrap_or_default();
        Self {
            name: name.into(),
            func,
            args: Some(spec),
        }
    }

    /// A method receiving the raw bundle unvalidated.
    pub fn varargs(name: impl Into<String>, func: MethodFn) -> Self {
        Self {
            name: name.into(),
            func,
            args: None,
        }
    }

    /// A method with an explicit argument spec.
    pub fn with_args(name: impl Into<String>, func: MethodFn, args: ArgSpec) -> Self {
        Self {
            name: name.into(),
            func,
            args: Some(args),
        }
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Module functions
// ============================================================================

/// A free function registered under a qualified name.
pub type FunctionFn = fn(&mut CallContext<'_>, &ParsedArgs) -> Result<Value, NativeError>;

/// A module-level function.
#[derive(Clone)]
pub struct FunctionDef {
    pub name: QualifiedName,
    pub func: FunctionFn,
    pub args: Option<ArgSpec>,
}

impl FunctionDef {
    /// Declare a function under a dotted name such as `mytest.add`.
    pub fn new(name: &str, func: FunctionFn) -> Result<Self, RegistrationError> {
        Ok(Self {
            name: QualifiedName::parse(name)?,
            func,
            args: None,
        })
    }

    /// Attach an argument spec.
    pub fn with_args(mut self, args: ArgSpec) -> Self {
        self.args = Some(args);
        self
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_sizes() {
        assert_eq!(MemberKind::Int.size(), 4);
        assert_eq!(MemberKind::Long.size(), 8);
        assert_eq!(MemberKind::Bool.size(), 1);
        assert_eq!(MemberDef::new("x", MemberKind::Long, 8).end(), Some(16));
        assert_eq!(MemberDef::new("x", MemberKind::Long, usize::MAX).end(), None);
    }

    #[test]
    fn member_read_write() {
        let mut payload = Payload::zeroed(16);
        MemberKind::Long.write(&mut payload, 0, &Value::Int(-9)).unwrap();
        MemberKind::Double.write(&mut payload, 8, &Value::Int(2)).unwrap();
        assert_eq!(MemberKind::Long.read(&payload, 0).unwrap(), Value::Int(-9));
        assert_eq!(MemberKind::Double.read(&payload, 8).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn member_write_checks_type_and_range() {
        let mut payload = Payload::zeroed(4);
        assert!(matches!(
            MemberKind::Int.write(&mut payload, 0, &Value::Str("1".into())),
            Err(NativeError::Conversion(_))
        ));
        assert!(matches!(
            MemberKind::Int.write(&mut payload, 0, &Value::Int(i64::MAX)),
            Err(NativeError::Conversion(_))
        ));
        assert!(matches!(
            MemberKind::Long.write(&mut payload, 0, &Value::Int(1)),
            Err(NativeError::PayloadBounds { .. })
        ));
    }

    #[test]
    fn method_conventions() {
        fn m(_: &mut CallContext<'_>, _: Handle, _: &ParsedArgs) -> Result<Value, NativeError> {
            Ok(Value::None)
        }
        assert_eq!(MethodDef::noargs("a", m).args.map(|a| a.len()), Some(0));
        assert_eq!(MethodDef::single("b", m).args.map(|a| a.len()), Some(1));
        assert!(MethodDef::varargs("c", m).args.is_none());
    }

    #[test]
    fn function_names_are_validated() {
        fn f(_: &mut CallContext<'_>, _: &ParsedArgs) -> Result<Value, NativeError> {
            Ok(Value::None)
        }
        assert!(FunctionDef::new("mytest.add", f).is_ok());
        assert!(FunctionDef::new("", f).is_err());
    }
}
