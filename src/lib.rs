//! slotkit - native types for a reference-counted, cycle-collected host.
//!
//! A native module describes each of its types as a slot table: which
//! protocol operations (`new`, `init`, `item-get`, `destroy`) it implements
//! and with which function. The [`Context`] turns that table into a
//! registered type, constructs instances in two phases (`new` allocates,
//! `init` sets up), routes protocol calls through a trampoline that
//! validates arguments before any native code runs, and runs each
//! instance's `destroy` exactly once when the host finds it unreachable.
//!
//! # Example
//!
//! ```
//! use slotkit::prelude::*;
//!
//! fn init(ctx: &mut CallContext<'_>, this: Handle, args: &ParsedArgs) -> Result<(), NativeError> {
//!     ctx.write::<i64>(this, 0, args.get(0)?)?;
//!     ctx.write::<i64>(this, 8, args.get(1)?)
//! }
//!
//! let mut ctx = Context::new();
//! ctx.define_type(
//!     TypeSpec::new("mytest.Point")
//!         .payload_size(16)
//!         .slot(SlotDef::init(init).with_args(ArgSpec::with_keywords("ll", &["x", "y"]).unwrap()))
//!         .member(MemberDef::new("x", MemberKind::Long, 0))
//!         .member(MemberDef::new("y", MemberKind::Long, 8)),
//! )
//! .unwrap();
//!
//! let p = ctx
//!     .construct("mytest.Point", &Args::positional([Value::Int(1), Value::Int(2)]))
//!     .unwrap();
//! assert_eq!(ctx.get_attr(p, "x").unwrap(), Value::Int(1));
//! assert_eq!(ctx.get_attr(p, "y").unwrap(), Value::Int(2));
//! ctx.close(p).unwrap();
//! ```

mod context;
mod dispatch;

pub use context::Context;
pub use dispatch::SlotCall;

pub use slotkit_core::{error, runtime};
pub use slotkit_registry::{TypeNamespace, TypeSpec};

pub mod prelude {
    pub use crate::{Context, SlotCall};
    pub use slotkit_core::{
        AllocationError, ArgKind, ArgSpec, ArgumentError, Args, CallContext, CollectStats,
        ConstructError, DispatchError, FromValue, FunctionDef, Handle, HeapCreateInfo, IntoValue,
        InvalidHandleHook, LifecycleState, MemberDef, MemberKind, MethodDef, NativeError, ParsedArgs, Payload,
        ReclaimPolicy, RegistrationError, RuntimeError, SlotDef, SlotFn, SlotKind, SlotkitError,
        SlotkitResult, TypeDescriptor, Value,
    };
    pub use slotkit_registry::TypeSpec;
}
