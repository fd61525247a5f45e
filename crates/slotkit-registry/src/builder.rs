//! TypeSpec - fluent declaration of a native type.
//!
//! A `TypeSpec` collects a name, a payload size, a slot table, members and
//! methods, then [`build`](TypeSpec::build) validates all of it at once and
//! produces an immutable [`TypeDescriptor`]. Nothing is registered until
//! the descriptor is handed to a [`TypeNamespace`](crate::TypeNamespace),
//! so a rejected declaration has no side effects.
//!
//! # Example
//!
//! ```
//! use slotkit_core::{ArgSpec, CallContext, Handle, MemberDef, MemberKind, NativeError, ParsedArgs, SlotDef, SlotKind};
//! use slotkit_registry::TypeSpec;
//!
//! fn init(ctx: &mut CallContext<'_>, this: Handle, args: &ParsedArgs) -> Result<(), NativeError> {
//!     ctx.write::<i64>(this, 0, args.get(0)?)?;
//!     ctx.write::<i64>(this, 8, args.get(1)?)
//! }
//!
//! let point = TypeSpec::new("mytest.Point")
//!     .payload_size(16)
//!     .slot(SlotDef::init(init).with_args(ArgSpec::with_keywords("ll", &["x", "y"]).unwrap()))
//!     .member(MemberDef::new("x", MemberKind::Long, 0))
//!     .member(MemberDef::new("y", MemberKind::Long, 8))
//!     .build()
//!     .unwrap();
//!
//! // A default `new` is installed when none is declared.
//! assert!(point.has_slot(SlotKind::New));
//! ```

use rustc_hash::FxHashSet;

use slotkit_core::{
    ArgSpec, MemberDef, MethodDef, QualifiedName, RegistrationError, SlotDef, SlotKind,
    TypeDescriptor,
};

/// Declaration of a native type, validated by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct TypeSpec {
    name: String,
    payload_size: usize,
    slots: Vec<SlotDef>,
    members: Vec<MemberDef>,
    methods: Vec<MethodDef>,
}

impl TypeSpec {
    /// Start declaring a type with a dotted name such as `mytest.Point`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload_size: 0,
            slots: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Declare a type from its name, payload size and slot table in one go.
    pub fn from_slots(
        name: impl Into<String>,
        payload_size: usize,
        slots: impl IntoIterator<Item = SlotDef>,
    ) -> Self {
        Self {
            payload_size,
            slots: slots.into_iter().collect(),
            ..Self::new(name)
        }
    }

    /// Set the per-instance payload size in bytes.
    pub fn payload_size(mut self, size: usize) -> Self {
        self.payload_size = size;
        self
    }

    /// Add a slot table entry.
    pub fn slot(mut self, slot: SlotDef) -> Self {
        self.slots.push(slot);
        self
    }

    /// Expose a payload field as an attribute.
    pub fn member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    /// Add a method.
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// The declared name, unvalidated.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate the declaration and produce a descriptor.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::InvalidName`] for an empty or malformed name
    /// - [`RegistrationError::DuplicateSlot`] when two entries share a kind
    /// - [`RegistrationError::SignatureMismatch`] when a function does not
    ///   follow its kind's calling convention
    /// - [`RegistrationError::InvalidMember`] when a member does not fit
    ///   the payload
    /// - [`RegistrationError::DuplicateMember`] when two members or methods
    ///   share a name
    pub fn build(self) -> Result<TypeDescriptor, RegistrationError> {
        let qname = QualifiedName::parse(&self.name)?;
        let type_name = qname.to_string();

        let mut seen = FxHashSet::default();
        for slot in &self.slots {
            if !seen.insert(slot.kind) {
                return Err(RegistrationError::DuplicateSlot {
                    type_name,
                    slot: slot.kind,
                });
            }
            if !slot.is_well_formed() {
                return Err(RegistrationError::SignatureMismatch {
                    type_name,
                    slot: slot.kind,
                    expected: slot.kind.convention().name(),
                    actual: slot.func.convention().name(),
                });
            }
        }

        let mut names = FxHashSet::default();
        for member in &self.members {
            let fits = member.end().is_some_and(|end| end <= self.payload_size);
            if !fits {
                return Err(RegistrationError::InvalidMember {
                    type_name,
                    member: member.name.clone(),
                    offset: member.offset,
                    size: member.kind.size(),
                    payload_size: self.payload_size,
                });
            }
            if !names.insert(member.name.as_str()) {
                return Err(RegistrationError::DuplicateMember {
                    type_name,
                    member: member.name.clone(),
                });
            }
        }
        for method in &self.methods {
            if !names.insert(method.name.as_str()) {
                return Err(RegistrationError::DuplicateMember {
                    type_name,
                    member: method.name.clone(),
                });
            }
        }

        let custom_new = seen.contains(&SlotKind::New);
        let mut slots = self.slots;
        if !custom_new {
            // the default allocator takes no arguments of its own; leave
            // them for `init` when there is one, otherwise refuse them
            let mut default_new = SlotDef::generic_new();
            if !seen.contains(&SlotKind::Init) {
                default_new = default_new.with_args(ArgSpec::new());
            }
            slots.push(default_new);
        }

        Ok(TypeDescriptor::new(
            qname,
            self.payload_size,
            slots,
            self.members,
            self.methods,
            custom_new,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotkit_core::{
        CallContext, Handle, MemberKind, NativeError, ParsedArgs, Payload, SlotFn, TypeFlags,
        Value,
    };

    fn item(_: &mut CallContext<'_>, _: Handle, index: isize) -> Result<Value, NativeError> {
        Ok(Value::Int(index as i64 * 2))
    }

    fn init(_: &mut CallContext<'_>, _: Handle, _: &ParsedArgs) -> Result<(), NativeError> {
        Ok(())
    }

    fn destroy(_: &mut Payload) {}

    fn norm(_: &mut CallContext<'_>, _: Handle, _: &ParsedArgs) -> Result<Value, NativeError> {
        Ok(Value::Float(0.0))
    }

    #[test]
    fn installs_default_new() {
        let ty = TypeSpec::from_slots("mytest.Dummy", 0, [SlotDef::item(item)])
            .build()
            .unwrap();
        let new = ty.slot(SlotKind::New).unwrap();
        assert!(matches!(new.func, SlotFn::New(_)));
        assert_eq!(new.args.as_ref().map(ArgSpec::len), Some(0));
        assert!(!ty.flags().contains(TypeFlags::CUSTOM_NEW));
        assert!(ty.flags().contains(TypeFlags::HAS_ITEM));
    }

    #[test]
    fn default_new_defers_arguments_to_init() {
        let ty = TypeSpec::new("mytest.Point")
            .slot(SlotDef::init(init))
            .build()
            .unwrap();
        assert!(ty.slot(SlotKind::New).unwrap().args.is_none());
    }

    #[test]
    fn empty_slot_table_is_accepted() {
        let ty = TypeSpec::new("mytest.Empty").build().unwrap();
        assert_eq!(ty.slots().len(), 1);
        assert_eq!(ty.payload_size(), 0);
    }

    #[test]
    fn duplicate_slot_rejected() {
        let err = TypeSpec::new("mytest.Twice")
            .slot(SlotDef::destroy(destroy))
            .slot(SlotDef::destroy(destroy))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateSlot {
                type_name: "mytest.Twice".into(),
                slot: SlotKind::Destroy
            }
        );
    }

    #[test]
    fn invalid_names_rejected() {
        for name in ["", "mytest.", ".Point", "my test.Point", "1abc"] {
            assert!(
                matches!(
                    TypeSpec::new(name).build(),
                    Err(RegistrationError::InvalidName { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn signature_mismatch_rejected() {
        let err = TypeSpec::new("mytest.Bad")
            .slot(SlotDef::new(SlotKind::Init, SlotFn::Item(item)))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::SignatureMismatch {
                slot: SlotKind::Init,
                expected: "initproc",
                actual: "ssizeargfunc",
                ..
            }
        ));
    }

    #[test]
    fn member_must_fit_payload() {
        let err = TypeSpec::new("mytest.Point")
            .payload_size(8)
            .member(MemberDef::new("x", MemberKind::Long, 0))
            .member(MemberDef::new("y", MemberKind::Long, 8))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::InvalidMember { ref member, offset: 8, .. } if member == "y"
        ));
    }

    #[test]
    fn duplicate_attribute_names_rejected() {
        let err = TypeSpec::new("mytest.Point")
            .payload_size(8)
            .member(MemberDef::new("norm", MemberKind::Long, 0))
            .method(MethodDef::noargs("norm", norm))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateMember { .. }));
    }

    #[test]
    fn custom_new_is_kept() {
        fn new(
            ctx: &mut CallContext<'_>,
            ty: &std::sync::Arc<TypeDescriptor>,
            _: &ParsedArgs,
        ) -> Result<Handle, NativeError> {
            Ok(ctx.allocate(ty)?)
        }
        let ty = TypeSpec::new("mytest.Custom")
            .slot(SlotDef::new_fn(new))
            .build()
            .unwrap();
        assert!(ty.flags().contains(TypeFlags::CUSTOM_NEW));
        assert_eq!(ty.slots().len(), 1);
    }
}
