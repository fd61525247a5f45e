//! Unified error types for slotkit.
//!
//! Each phase of an object's life has its own error type so callers can
//! match precisely, and [`SlotkitError`] wraps all of them for code that
//! only wants to propagate.
//!
//! ## Error Hierarchy
//!
//! ```text
//! SlotkitError (top-level wrapper)
//! ├── RegistrationError - type/function declaration errors
//! ├── AllocationError   - host allocator exhaustion
//! ├── ArgumentError     - positional/keyword extraction failures
//! ├── ConstructError    - failures of the `new` + `init` sequence
//! ├── DispatchError     - protocol calls on live instances
//! └── RuntimeError      - handle and namespace lookups
//! ```
//!
//! [`NativeError`] is what native slot code reports. The core never
//! inspects it; it is carried verbatim inside `ConstructError` and
//! `DispatchError`.

use thiserror::Error;

use crate::SlotKind;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors that occur while declaring a type or function.
///
/// All of these are detected before anything is added to the namespace, so
/// a failed declaration leaves the namespace unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Two slot entries share the same slot kind.
    #[error("type '{type_name}' declares slot {slot} more than once")]
    DuplicateSlot {
        /// The type being declared.
        type_name: String,
        /// The duplicated kind.
        slot: SlotKind,
    },

    /// The type or function name is empty or malformed.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A slot's function does not follow its kind's calling convention.
    #[error("slot {slot} of '{type_name}' expects the {expected} convention, got {actual}")]
    SignatureMismatch {
        /// The type being declared.
        type_name: String,
        /// The slot kind.
        slot: SlotKind,
        /// The convention required by the kind.
        expected: &'static str,
        /// The convention of the supplied function.
        actual: &'static str,
    },

    /// A type or function with this name is already registered.
    #[error("duplicate registration: '{0}' is already registered")]
    DuplicateType(String),

    /// A raw slot id does not name any known slot.
    #[error("unknown slot id {0}")]
    UnknownSlot(u32),

    /// A member descriptor does not fit the payload.
    #[error("member '{member}' of '{type_name}' at offset {offset} (size {size}) exceeds payload of {payload_size} bytes")]
    InvalidMember {
        /// The type being declared.
        type_name: String,
        /// The member name.
        member: String,
        /// Byte offset of the member.
        offset: usize,
        /// Byte size of the member.
        size: usize,
        /// Declared payload size.
        payload_size: usize,
    },

    /// Two members or methods share a name.
    #[error("type '{type_name}' declares '{member}' more than once")]
    DuplicateMember {
        /// The type being declared.
        type_name: String,
        /// The duplicated name.
        member: String,
    },

    /// An argument format string could not be understood.
    #[error("invalid argument spec '{format}': {reason}")]
    InvalidArgSpec {
        /// The format string.
        format: String,
        /// What is wrong with it.
        reason: String,
    },
}

// ============================================================================
// Allocation Errors
// ============================================================================

/// The host allocator could not satisfy a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The heap already holds its maximum number of objects.
    #[error("out of memory: object limit of {limit} reached")]
    OutOfObjects {
        /// The configured object limit.
        limit: usize,
    },

    /// The payload would exceed the configured payload budget.
    #[error("out of memory: {requested} payload bytes requested, {available} available")]
    OutOfPayloadMemory {
        /// Bytes requested.
        requested: usize,
        /// Bytes still available.
        available: usize,
    },
}

// ============================================================================
// Argument Errors
// ============================================================================

/// Errors raised while extracting typed arguments from a raw bundle.
///
/// These are always raised by the trampoline before the native slot runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A required argument was not supplied.
    #[error("missing required argument '{name}' (pos {position})")]
    Missing {
        /// Name (or positional placeholder) of the argument.
        name: String,
        /// Zero-based position.
        position: usize,
    },

    /// An argument has the wrong type.
    #[error("argument '{name}' must be {expected}, not {actual}")]
    TypeMismatch {
        /// Name (or positional placeholder) of the argument.
        name: String,
        /// The expected kind.
        expected: &'static str,
        /// The type that was supplied.
        actual: &'static str,
    },

    /// An integer argument does not fit the native type.
    #[error("argument '{name}' value {value} does not fit in {target}")]
    Overflow {
        /// Name (or positional placeholder) of the argument.
        name: String,
        /// The supplied value.
        value: i64,
        /// The native type.
        target: &'static str,
    },

    /// More positional arguments than parameters.
    #[error("takes at most {max} positional arguments ({given} given)")]
    TooMany {
        /// Maximum accepted.
        max: usize,
        /// Number supplied.
        given: usize,
    },

    /// A keyword does not match any parameter name.
    #[error("unexpected keyword argument '{0}'")]
    UnknownKeyword(String),

    /// An argument was given both by position and by keyword.
    #[error("argument '{0}' given by name and position")]
    Duplicate(String),
}

// ============================================================================
// Native Errors
// ============================================================================

/// Errors converting between host values and native Rust values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Integer does not fit the target type.
    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow { value: i64, target_type: &'static str },

    /// Float does not fit the target type.
    #[error("float conversion error: value {value} cannot be represented as {target_type}")]
    FloatConversion { value: f64, target_type: &'static str },
}

/// Errors signalled by native slot code.
///
/// The core treats these as opaque and forwards them unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// An index was out of the range the slot accepts.
    #[error("IndexError: {0}")]
    IndexError(String),

    /// An operand had the wrong type.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// An operand had the right type but a bad value.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// A payload access fell outside the payload region.
    #[error("payload access at offset {offset} (size {size}) outside payload of {len} bytes")]
    PayloadBounds {
        /// Byte offset requested.
        offset: usize,
        /// Byte size requested.
        size: usize,
        /// Payload length.
        len: usize,
    },

    /// A value conversion failed inside the slot.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// The slot asked the host allocator for storage and failed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// The slot used a stale handle or unknown type.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Any other slot-defined failure.
    #[error("{0}")]
    Other(String),
}

impl NativeError {
    /// Create an index error.
    pub fn index(message: impl Into<String>) -> Self {
        NativeError::IndexError(message.into())
    }

    /// Create a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        NativeError::TypeError(message.into())
    }

    /// Create a value error.
    pub fn value(message: impl Into<String>) -> Self {
        NativeError::ValueError(message.into())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other(message.into())
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors from handle and namespace lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A stale handle was used (object was reclaimed).
    #[error("stale handle: object at index {index} has been reclaimed")]
    StaleHandle {
        /// The index of the reclaimed object.
        index: u32,
    },

    /// No type is registered under this name.
    #[error("type not found: {0}")]
    TypeNotFound(String),

    /// No function is registered under this name.
    #[error("function not found: {0}")]
    FunctionNotFound(String),

    /// A lifecycle transition was rejected.
    #[error("invalid lifecycle transition for object {index}: {from} -> {to}")]
    InvalidTransition {
        /// Object index.
        index: u32,
        /// Current state.
        from: &'static str,
        /// Requested state.
        to: &'static str,
    },

    /// A reference field index is beyond the configured per-instance limit.
    #[error("field index {index} out of range: instances hold at most {limit} fields")]
    FieldIndexOutOfRange {
        /// The requested field.
        index: usize,
        /// The configured limit.
        limit: usize,
    },
}

// ============================================================================
// Construction and Dispatch Errors
// ============================================================================

/// Errors from the construction entry point (`new` then `init`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructError {
    /// The type name is not registered.
    #[error("type not found: {0}")]
    TypeNotFound(String),

    /// The argument bundle did not match a slot's argument spec.
    #[error("{type_name}(): {source}")]
    Argument {
        /// The type being constructed.
        type_name: String,
        /// The extraction failure.
        #[source]
        source: ArgumentError,
    },

    /// The host allocator is exhausted.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// The `new` slot failed.
    #[error("{type_name}.__new__ failed: {source}")]
    NewFailed {
        /// The type being constructed.
        type_name: String,
        /// The slot's own error.
        #[source]
        source: NativeError,
    },

    /// The `init` slot failed; the half-built object has been released.
    #[error("{type_name}.__init__ failed: {source}")]
    InitFailed {
        /// The type being constructed.
        type_name: String,
        /// The slot's own error.
        #[source]
        source: NativeError,
    },
}

impl ConstructError {
    /// Check if this failure happened before any native code ran.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConstructError::TypeNotFound(_) | ConstructError::Argument { .. }
        )
    }
}

/// Errors from protocol calls on an existing instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// The instance's type has no entry for this slot.
    #[error("'{type_name}' does not support {slot}")]
    NotImplemented {
        /// The instance's type.
        type_name: String,
        /// The requested slot.
        slot: SlotKind,
    },

    /// No member or method with this name.
    #[error("'{type_name}' object has no attribute '{name}'")]
    NoSuchAttribute {
        /// The instance's type.
        type_name: String,
        /// The requested name.
        name: String,
    },

    /// The member is read-only.
    #[error("attribute '{name}' of '{type_name}' objects is not writable")]
    ReadOnly {
        /// The instance's type.
        type_name: String,
        /// The member name.
        name: String,
    },

    /// Arguments did not match the callee's spec.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Handle or namespace lookup failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The native slot failed; forwarded verbatim.
    #[error(transparent)]
    Native(#[from] NativeError),
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for all slotkit operations.
///
/// Each variant uses `#[from]` so `?` converts phase errors automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlotkitError {
    /// A declaration error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// An allocation error.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// An argument error.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// A construction error.
    #[error(transparent)]
    Construct(#[from] ConstructError),

    /// A dispatch error.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl SlotkitError {
    /// Check if this is a registration error.
    pub fn is_registration(&self) -> bool {
        matches!(self, SlotkitError::Registration(_))
    }

    /// Check if this is a construction error.
    pub fn is_construct(&self) -> bool {
        matches!(self, SlotkitError::Construct(_))
    }

    /// Check if this is a dispatch error.
    pub fn is_dispatch(&self) -> bool {
        matches!(self, SlotkitError::Dispatch(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, SlotkitError::Runtime(_))
    }
}

/// Result alias used throughout slotkit.
pub type SlotkitResult<T> = Result<T, SlotkitError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_slot_display() {
        let err = RegistrationError::DuplicateSlot {
            type_name: "mytest.Point".into(),
            slot: SlotKind::Init,
        };
        assert_eq!(
            err.to_string(),
            "type 'mytest.Point' declares slot tp_init more than once"
        );
    }

    #[test]
    fn argument_error_display() {
        let err = ArgumentError::TypeMismatch {
            name: "x".into(),
            expected: "int",
            actual: "str",
        };
        assert_eq!(err.to_string(), "argument 'x' must be int, not str");

        let err = ArgumentError::TooMany { max: 2, given: 3 };
        assert!(err.to_string().contains("(3 given)"));
    }

    #[test]
    fn construct_error_carries_slot_error() {
        let err = ConstructError::InitFailed {
            type_name: "mytest.Point".into(),
            source: NativeError::value("x must be positive"),
        };
        assert_eq!(
            err.to_string(),
            "mytest.Point.__init__ failed: ValueError: x must be positive"
        );
        assert!(!err.is_validation());
    }

    #[test]
    fn construct_error_validation() {
        let err = ConstructError::Argument {
            type_name: "mytest.Point".into(),
            source: ArgumentError::UnknownKeyword("z".into()),
        };
        assert!(err.is_validation());
        assert!(ConstructError::TypeNotFound("x".into()).is_validation());
    }

    #[test]
    fn native_error_forwarded_verbatim() {
        let native = NativeError::index("index out of range");
        let dispatch: DispatchError = native.clone().into();
        assert_eq!(dispatch.to_string(), native.to_string());
        assert_eq!(dispatch, DispatchError::Native(native));
    }

    #[test]
    fn slotkit_error_predicates() {
        let err: SlotkitError = RegistrationError::DuplicateType("a.B".into()).into();
        assert!(err.is_registration());
        assert!(!err.is_runtime());

        let err: SlotkitError = RuntimeError::StaleHandle { index: 3 }.into();
        assert!(err.is_runtime());

        let err: SlotkitError = DispatchError::Runtime(RuntimeError::StaleHandle { index: 3 }).into();
        assert!(err.is_dispatch());
    }

    #[test]
    fn allocation_error_display() {
        let err = AllocationError::OutOfObjects { limit: 4 };
        assert_eq!(err.to_string(), "out of memory: object limit of 4 reached");
    }
}
