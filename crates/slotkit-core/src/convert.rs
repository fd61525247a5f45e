//! Conversion traits between host values and native Rust values.
//!
//! - [`FromValue`]: extract a Rust value from a [`Value`]
//! - [`IntoValue`]: convert a Rust value into a [`Value`]
//!
//! Native slots use these through [`ParsedArgs::get`](crate::ParsedArgs::get)
//! and when building return values.
//!
//! ## Example
//!
//! ```
//! use slotkit_core::{FromValue, IntoValue, Value};
//!
//! let value = 42i32.into_value();
//! assert_eq!(value, Value::Int(42));
//! assert_eq!(i32::from_value(&value).unwrap(), 42);
//! ```

use crate::error::ConversionError;
use crate::runtime::{Handle, Value};

/// Extract a native value from a host value.
pub trait FromValue: Sized {
    /// Returns a `ConversionError` if the value has an incompatible type.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Convert a native value into a host value.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        _ => Err(ConversionError::TypeMismatch {
                            expected: "int",
                            actual: value.type_name(),
                        }),
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Int(self as i64)
                }
            }
        )*
    };
}

impl_value_int!(i8, i16, i32, i64, isize, u8, u16, u32);

// u64 reinterprets bits so the full range survives the trip through i64
impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(v) => Ok(*v as u64),
            _ => Err(ConversionError::TypeMismatch {
                expected: "int",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoValue for u64 {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

// ============================================================================
// Float implementations
// ============================================================================

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            _ => Err(ConversionError::TypeMismatch {
                expected: "float",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        let v = f64::from_value(value)?;
        if v.is_finite() && (v > f32::MAX as f64 || v < f32::MIN as f64) {
            return Err(ConversionError::FloatConversion {
                value: v,
                target_type: "f32",
            });
        }
        Ok(v as f32)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(self as f64)
    }
}

// ============================================================================
// Other implementations
// ============================================================================

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(v) => Ok(*v),
            _ => Err(ConversionError::TypeMismatch {
                expected: "bool",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            _ => Err(ConversionError::TypeMismatch {
                expected: "str",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for Handle {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Object(h) => Ok(*h),
            _ => Err(ConversionError::TypeMismatch {
                expected: "object",
                actual: value.type_name(),
            }),
        }
    }
}

impl IntoValue for Handle {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value_narrow_ints() {
        assert_eq!(i8::from_value(&Value::Int(-128)).unwrap(), -128i8);
        assert!(i8::from_value(&Value::Int(128)).is_err());
        assert_eq!(i32::from_value(&Value::Int(100000)).unwrap(), 100000);
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn from_value_unsigned() {
        assert_eq!(u8::from_value(&Value::Int(255)).unwrap(), 255u8);
        assert!(matches!(
            u8::from_value(&Value::Int(-1)),
            Err(ConversionError::IntegerOverflow { value: -1, target_type: "u8" })
        ));
        assert_eq!(u64::from_value(&Value::Int(-1)).unwrap(), u64::MAX);
    }

    #[test]
    fn from_value_type_mismatch() {
        let err = i64::from_value(&Value::Str("x".into())).unwrap_err();
        assert_eq!(
            err,
            ConversionError::TypeMismatch {
                expected: "int",
                actual: "str"
            }
        );
    }

    #[test]
    fn floats_accept_ints() {
        assert_eq!(f64::from_value(&Value::Int(3)).unwrap(), 3.0);
        assert!(f32::from_value(&Value::Float(1e300)).is_err());
        assert!(f32::from_value(&Value::Float(f64::INFINITY)).unwrap().is_infinite());
    }

    #[test]
    fn into_value_roundtrip_types() {
        assert_eq!(7u32.into_value(), Value::Int(7));
        assert_eq!(true.into_value(), Value::Bool(true));
        assert_eq!("hi".into_value(), Value::Str("hi".into()));
        assert_eq!(().into_value(), Value::None);
    }
}
