//! Core types for slotkit.
//!
//! This crate holds everything a native module needs to describe a type
//! and everything the host needs to run it:
//!
//! - [`SlotKind`], [`SlotFn`], [`SlotDef`]: slot tables
//! - [`ArgSpec`], [`Args`], [`ParsedArgs`]: eager argument extraction
//! - [`MemberDef`], [`MethodDef`], [`FunctionDef`]: attribute descriptors
//! - [`TypeDescriptor`]: the immutable registered form of a type
//! - [`runtime`]: handles, payloads, the object heap and its collector
//! - [`error`]: one error type per phase plus [`SlotkitError`]

pub mod args;
pub mod convert;
pub mod error;
pub mod member;
pub mod qualified_name;
pub mod runtime;
pub mod slot;
pub mod type_def;
pub mod type_hash;

pub use args::{ArgKind, ArgParam, ArgSpec, Args, ParsedArgs};
pub use convert::{FromValue, IntoValue};
pub use error::{
    AllocationError, ArgumentError, ConstructError, ConversionError, DispatchError, NativeError,
    RegistrationError, RuntimeError, SlotkitError, SlotkitResult,
};
pub use member::{FunctionDef, FunctionFn, MemberDef, MemberKind, MethodDef, MethodFn};
pub use qualified_name::QualifiedName;
pub use runtime::{
    CallContext, CollectStats, Handle, HeapCreateInfo, HeapSettings, InvalidHandleHook,
    LifecycleState, ObjectHeap, Payload, PayloadScalar, ReclaimPolicy, Value,
};
pub use slot::{CallConvention, DestroyFn, InitFn, ItemFn, NewFn, SlotDef, SlotFn, SlotKind, generic_new};
pub use type_def::{TypeDescriptor, TypeFlags};
pub use type_hash::TypeHash;
