//! Slot kinds and slot table entries.
//!
//! A native type describes its behavior as data: an ordered list of
//! [`SlotDef`]s, each pairing a [`SlotKind`] with a function. Each kind fixes
//! one [`CallConvention`], and [`SlotFn`] carries a typed function pointer
//! per convention, so the function's shape is known when the table is
//! declared. The type builder compares `kind.convention()` against
//! `func.convention()` and rejects mismatches before anything is registered.
//!
//! # Example
//!
//! ```
//! use slotkit_core::{SlotDef, SlotKind, Payload};
//!
//! fn destroy(_payload: &mut Payload) {}
//!
//! let def = SlotDef::destroy(destroy);
//! assert_eq!(def.kind, SlotKind::Destroy);
//! assert!(def.is_well_formed());
//! ```

use std::fmt;
use std::sync::Arc;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::args::{ArgSpec, ParsedArgs};
use crate::error::{NativeError, RegistrationError};
use crate::runtime::{CallContext, Handle, Payload, Value};
use crate::type_def::TypeDescriptor;

/// A protocol operation a type may implement.
///
/// The discriminants are stable wire ids; [`SlotKind::from_id`] maps a raw
/// id back to a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum SlotKind {
    /// Sequence indexing by signed integer.
    ItemGet = 44,
    /// Post-allocation setup from constructor arguments.
    Init = 60,
    /// Raw allocation hook.
    New = 65,
    /// Finalizer; sees the payload only.
    Destroy = 1000,
}

impl SlotKind {
    /// Every slot kind, in id order.
    pub const ALL: [SlotKind; 4] = [SlotKind::ItemGet, SlotKind::Init, SlotKind::New, SlotKind::Destroy];

    /// Map a raw slot id to a kind.
    pub fn from_id(id: u32) -> Result<Self, RegistrationError> {
        SlotKind::try_from(id).map_err(|_| RegistrationError::UnknownSlot(id))
    }

    /// The stable raw id.
    pub fn id(self) -> u32 {
        self.into()
    }

    /// The calling convention every function for this kind must follow.
    pub fn convention(self) -> CallConvention {
        match self {
            SlotKind::New => CallConvention::Keywords,
            SlotKind::Init => CallConvention::InitProc,
            SlotKind::ItemGet => CallConvention::SsizeArg,
            SlotKind::Destroy => CallConvention::Destroy,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SlotKind::New => "tp_new",
            SlotKind::Init => "tp_init",
            SlotKind::ItemGet => "sq_item",
            SlotKind::Destroy => "tp_destroy",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Argument and return shape of a slot function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallConvention {
    /// `(type, args) -> handle`
    Keywords,
    /// `(self, args) -> status`
    InitProc,
    /// `(self, index) -> value`
    SsizeArg,
    /// `(payload)`
    Destroy,
}

impl CallConvention {
    pub fn name(self) -> &'static str {
        match self {
            CallConvention::Keywords => "keywords",
            CallConvention::InitProc => "initproc",
            CallConvention::SsizeArg => "ssizeargfunc",
            CallConvention::Destroy => "destroyfunc",
        }
    }
}

/// `new`: allocate an instance of the given type.
pub type NewFn =
    fn(&mut CallContext<'_>, &Arc<TypeDescriptor>, &ParsedArgs) -> Result<Handle, NativeError>;

/// `init`: set up a freshly allocated instance.
pub type InitFn = fn(&mut CallContext<'_>, Handle, &ParsedArgs) -> Result<(), NativeError>;

/// `item-get`: index into an instance.
pub type ItemFn = fn(&mut CallContext<'_>, Handle, isize) -> Result<Value, NativeError>;

/// `destroy`: release resources held by the payload.
///
/// Receives the payload only, so it cannot reach the heap or resurrect the
/// instance.
pub type DestroyFn = fn(&mut Payload);

/// A typed slot function.
#[derive(Clone, Copy)]
pub enum SlotFn {
    New(NewFn),
    Init(InitFn),
    Item(ItemFn),
    Destroy(DestroyFn),
}

impl SlotFn {
    /// The convention this function follows.
    pub fn convention(&self) -> CallConvention {
        match self {
            SlotFn::New(_) => CallConvention::Keywords,
            SlotFn::Init(_) => CallConvention::InitProc,
            SlotFn::Item(_) => CallConvention::SsizeArg,
            SlotFn::Destroy(_) => CallConvention::Destroy,
        }
    }
}

impl fmt::Debug for SlotFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotFn({})", self.convention().name())
    }
}

/// One slot table entry.
#[derive(Debug, Clone)]
pub struct SlotDef {
    /// Which protocol operation this implements.
    pub kind: SlotKind,
    /// The native function.
    pub func: SlotFn,
    /// Arguments validated by the trampoline before the slot runs.
    ///
    /// Only meaningful for `New` and `Init`. `None` passes the raw bundle
    /// through unvalidated.
    pub args: Option<ArgSpec>,
}

impl SlotDef {
    /// Pair a kind with a function. The pairing is checked by the type
    /// builder, not here.
    pub fn new(kind: SlotKind, func: SlotFn) -> Self {
        Self {
            kind,
            func,
            args: None,
        }
    }

    /// Build an entry from a raw slot id.
    pub fn from_id(id: u32, func: SlotFn) -> Result<Self, RegistrationError> {
        Ok(Self::new(SlotKind::from_id(id)?, func))
    }

    /// A custom `new` slot.
    pub fn new_fn(func: NewFn) -> Self {
        Self::new(SlotKind::New, SlotFn::New(func))
    }

    /// An `init` slot.
    pub fn init(func: InitFn) -> Self {
        Self::new(SlotKind::Init, SlotFn::Init(func))
    }

    /// An `item-get` slot.
    pub fn item(func: ItemFn) -> Self {
        Self::new(SlotKind::ItemGet, SlotFn::Item(func))
    }

    /// A `destroy` slot.
    pub fn destroy(func: DestroyFn) -> Self {
        Self::new(SlotKind::Destroy, SlotFn::Destroy(func))
    }

    /// The default `new` installed when a type declares none.
    pub fn generic_new() -> Self {
        Self::new_fn(generic_new)
    }

    /// Attach an argument spec.
    pub fn with_args(mut self, args: ArgSpec) -> Self {
        self.args = Some(args);
        self
    }

    /// Check that the function follows the kind's convention.
    pub fn is_well_formed(&self) -> bool {
        self.kind.convention() == self.func.convention()
    }
}

/// Allocate a zeroed instance and nothing else.
pub fn generic_new(
    ctx: &mut CallContext<'_>,
    ty: &Arc<TypeDescriptor>,
    _args: &ParsedArgs,
) -> Result<Handle, NativeError> {
    Ok(ctx.allocate(ty)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(_: &mut CallContext<'_>, _: Handle, index: isize) -> Result<Value, NativeError> {
        Ok(Value::Int(index as i64))
    }

    fn destroy(_: &mut Payload) {}

    #[test]
    fn slot_ids_round_trip() {
        for kind in SlotKind::ALL {
            assert_eq!(SlotKind::from_id(kind.id()).unwrap(), kind);
        }
        assert_eq!(SlotKind::New.id(), 65);
        assert_eq!(SlotKind::Destroy.id(), 1000);
    }

    #[test]
    fn unknown_slot_id() {
        assert_eq!(SlotKind::from_id(7), Err(RegistrationError::UnknownSlot(7)));
        assert!(SlotDef::from_id(999, SlotFn::Destroy(destroy)).is_err());
    }

    #[test]
    fn typed_constructors_are_well_formed() {
        assert!(SlotDef::item(item).is_well_formed());
        assert!(SlotDef::destroy(destroy).is_well_formed());
        assert!(SlotDef::generic_new().is_well_formed());
    }

    #[test]
    fn mismatched_pairing_detected() {
        let def = SlotDef::new(SlotKind::Init, SlotFn::Item(item));
        assert!(!def.is_well_formed());
        assert_eq!(def.kind.convention().name(), "initproc");
        assert_eq!(def.func.convention().name(), "ssizeargfunc");
    }

    #[test]
    fn slot_names() {
        assert_eq!(SlotKind::ItemGet.to_string(), "sq_item");
        assert_eq!(format!("{:?}", SlotFn::Destroy(destroy)), "SlotFn(destroyfunc)");
    }
}
