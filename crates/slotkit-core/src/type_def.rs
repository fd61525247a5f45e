//! Type descriptors: the immutable, registered form of a native type.
//!
//! A [`TypeDescriptor`] is produced once by the type builder and shared as
//! `Arc<TypeDescriptor>` by the namespace and by every instance of the type.
//! Nothing in it changes after registration.

use std::fmt;

use bitflags::bitflags;

use crate::member::{MemberDef, MethodDef};
use crate::qualified_name::QualifiedName;
use crate::slot::{SlotDef, SlotKind};
use crate::type_hash::TypeHash;

bitflags! {
    /// Summary of what a type implements, computed at build time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// Instances carry a non-empty payload.
        const HAS_PAYLOAD = 1 << 0;
        /// The type supplied its own `new` slot.
        const CUSTOM_NEW = 1 << 1;
        /// The type has an `init` slot.
        const HAS_INIT = 1 << 2;
        /// The type has a `destroy` slot.
        const HAS_DESTROY = 1 << 3;
        /// The type supports indexing.
        const HAS_ITEM = 1 << 4;
    }
}

/// A registered native type.
pub struct TypeDescriptor {
    name: QualifiedName,
    display: String,
    type_hash: TypeHash,
    payload_size: usize,
    slots: Vec<SlotDef>,
    members: Vec<MemberDef>,
    methods: Vec<MethodDef>,
    flags: TypeFlags,
}

impl TypeDescriptor {
    /// Assemble a descriptor from already-validated parts.
    ///
    /// `custom_new` records whether the `New` entry came from the declaring
    /// module rather than being installed as the default.
    pub fn new(
        name: QualifiedName,
        payload_size: usize,
        slots: Vec<SlotDef>,
        members: Vec<MemberDef>,
        methods: Vec<MethodDef>,
        custom_new: bool,
    ) -> Self {
        let mut flags = TypeFlags::empty();
        flags.set(TypeFlags::HAS_PAYLOAD, payload_size > 0);
        flags.set(TypeFlags::CUSTOM_NEW, custom_new);
        for slot in &slots {
            match slot.kind {
                SlotKind::Init => flags |= TypeFlags::HAS_INIT,
                SlotKind::Destroy => flags |= TypeFlags::HAS_DESTROY,
                SlotKind::ItemGet => flags |= TypeFlags::HAS_ITEM,
                SlotKind::New => {}
            }
        }

        Self {
            display: name.to_string(),
            type_hash: name.to_type_hash(),
            name,
            payload_size,
            slots,
            members,
            methods,
            flags,
        }
    }

    /// The qualified name.
    pub fn qualified_name(&self) -> &QualifiedName {
        &self.name
    }

    /// The dotted name used in messages, e.g. `mytest.Point`.
    pub fn name(&self) -> &str {
        &self.display
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Payload size in bytes.
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Slot table in declaration order.
    pub fn slots(&self) -> &[SlotDef] {
        &self.slots
    }

    /// Look up the entry for a slot kind.
    pub fn slot(&self, kind: SlotKind) -> Option<&SlotDef> {
        self.slots.iter().find(|s| s.kind == kind)
    }

    /// Check if the type implements a slot kind.
    pub fn has_slot(&self, kind: SlotKind) -> bool {
        self.slot(kind).is_some()
    }

    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    /// Look up a payload member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Look up a method by name.
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.display)
            .field("type_hash", &self.type_hash)
            .field("payload_size", &self.payload_size)
            .field("slots", &self.slots.iter().map(|s| s.kind).collect::<Vec<_>>())
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberKind;
    use crate::runtime::Payload;

    fn destroy(_: &mut Payload) {}

    fn point() -> TypeDescriptor {
        TypeDescriptor::new(
            QualifiedName::parse("mytest.Point").unwrap(),
            16,
            vec![SlotDef::generic_new(), SlotDef::destroy(destroy)],
            vec![
                MemberDef::new("x", MemberKind::Long, 0),
                MemberDef::new("y", MemberKind::Long, 8),
            ],
            Vec::new(),
            false,
        )
    }

    #[test]
    fn flags_reflect_slots() {
        let ty = point();
        assert!(ty.flags().contains(TypeFlags::HAS_PAYLOAD | TypeFlags::HAS_DESTROY));
        assert!(!ty.flags().contains(TypeFlags::CUSTOM_NEW));
        assert!(!ty.flags().contains(TypeFlags::HAS_INIT));
    }

    #[test]
    fn slot_and_member_lookup() {
        let ty = point();
        assert!(ty.has_slot(SlotKind::New));
        assert!(ty.slot(SlotKind::ItemGet).is_none());
        assert_eq!(ty.member("y").map(|m| m.offset), Some(8));
        assert!(ty.member("z").is_none());
        assert!(ty.method("norm").is_none());
    }

    #[test]
    fn name_and_hash() {
        let ty = point();
        assert_eq!(ty.name(), "mytest.Point");
        assert_eq!(ty.type_hash(), TypeHash::from_name("mytest.Point"));
        assert_eq!(ty.qualified_name().simple_name(), "Point");
    }
}
