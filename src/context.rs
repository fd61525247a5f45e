//! Host context for native types.
//!
//! A `Context` owns the type namespace and the object heap. Native modules
//! declare types and functions on it, and external code constructs
//! instances, dispatches protocol calls, and manages references through it.
//!
//! # Example
//!
//! ```
//! use slotkit::prelude::*;
//!
//! fn item(_: &mut CallContext<'_>, _: Handle, index: isize) -> Result<Value, NativeError> {
//!     Ok(Value::Int(index as i64 * 2))
//! }
//!
//! let mut ctx = Context::new();
//! ctx.define_type(TypeSpec::from_slots("mytest.Dummy", 0, [SlotDef::item(item)]))
//!     .unwrap();
//!
//! let dummy = ctx.construct("mytest.Dummy", &Args::new()).unwrap();
//! assert_eq!(ctx.get_item(dummy, 21).unwrap(), Value::Int(42));
//! ctx.close(dummy).unwrap();
//! ```

use std::sync::Arc;

use slotkit_core::{
    CallContext, CollectStats, FunctionDef, Handle, HeapCreateInfo, HeapSettings, LifecycleState,
    ObjectHeap, RegistrationError, RuntimeError, TypeDescriptor,
};
use slotkit_registry::{TypeNamespace, TypeSpec};

/// The host runtime native types are embedded in.
///
/// Single-threaded: every operation takes `&mut self`.
#[derive(Debug, Default)]
pub struct Context {
    pub(crate) namespace: TypeNamespace,
    pub(crate) heap: ObjectHeap,
}

impl Context {
    /// Create a context with default heap settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context, overriding selected heap settings.
    pub fn with_info(info: HeapCreateInfo) -> Self {
        Self {
            namespace: TypeNamespace::new(),
            heap: ObjectHeap::with_settings(HeapSettings::from(info)),
        }
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Validate and register a type. It is constructible immediately.
    ///
    /// On error nothing is registered.
    pub fn define_type(&mut self, spec: TypeSpec) -> Result<Arc<TypeDescriptor>, RegistrationError> {
        let ty = Arc::new(spec.build()?);
        self.namespace.register_type(Arc::clone(&ty))?;
        Ok(ty)
    }

    /// Register a module function.
    pub fn define_function(&mut self, func: FunctionDef) -> Result<(), RegistrationError> {
        self.namespace.register_function(func)
    }

    /// Look up a registered type by dotted name.
    pub fn lookup_type(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.namespace.lookup(name).cloned()
    }

    pub fn namespace(&self) -> &TypeNamespace {
        &self.namespace
    }

    // ==========================================================================
    // References
    // ==========================================================================

    /// Take another reference to an instance.
    pub fn dup(&mut self, handle: Handle) -> Result<Handle, RuntimeError> {
        self.heap.add_ref(handle)?;
        Ok(handle)
    }

    /// Drop a reference. The last drop makes the instance unreachable.
    pub fn close(&mut self, handle: Handle) -> Result<(), RuntimeError> {
        self.heap.release(handle)
    }

    /// Force a collection pass: finalize and reclaim everything unreachable,
    /// including reference cycles.
    pub fn collect(&mut self) -> CollectStats {
        self.heap.collect()
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Check if protocol calls may still be made on `handle`.
    pub fn is_alive(&self, handle: Handle) -> bool {
        self.heap.is_alive(handle)
    }

    /// Lifecycle state of an instance. Reclaimed for stale handles.
    pub fn lifecycle_state(&self, handle: Handle) -> LifecycleState {
        self.heap.state(handle)
    }

    /// Type of a live instance.
    pub fn type_of(&self, handle: Handle) -> Result<Arc<TypeDescriptor>, RuntimeError> {
        self.heap.type_of(handle).cloned()
    }

    /// Check if `handle` is a live instance of the type called `name`.
    pub fn type_check(&self, handle: Handle, name: &str) -> bool {
        match (self.heap.type_of(handle), self.namespace.lookup(name)) {
            (Ok(actual), Some(expected)) => Arc::ptr_eq(actual, expected),
            _ => false,
        }
    }

    /// A call context for working with instances outside of a slot.
    pub fn call_context(&mut self) -> CallContext<'_> {
        CallContext::new(&mut self.heap)
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    /// Start a new handle-tracking generation. See [`ObjectHeap::new_generation`].
    pub fn new_generation(&mut self) -> u64 {
        self.heap.new_generation()
    }

    /// Handles allocated since generation `since` that are still open.
    pub fn open_handles(&self, since: u64) -> Vec<Handle> {
        self.heap.open_handles(since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotkit_core::{ReclaimPolicy, SlotDef};

    #[test]
    fn context_new_is_empty() {
        let ctx = Context::new();
        assert_eq!(ctx.namespace().type_count(), 0);
        assert!(ctx.heap().is_empty());
        assert_eq!(ctx.heap().settings(), &HeapSettings::default());
    }

    #[test]
    fn context_with_info() {
        let ctx = Context::with_info(HeapCreateInfo {
            reclaim_policy: Some(ReclaimPolicy::Deferred),
            ..Default::default()
        });
        assert_eq!(ctx.heap().settings().reclaim_policy, ReclaimPolicy::Deferred);
    }

    #[test]
    fn define_type_registers() {
        let mut ctx = Context::new();
        let ty = ctx.define_type(TypeSpec::new("mytest.Empty")).unwrap();
        assert!(Arc::ptr_eq(&ctx.lookup_type("mytest.Empty").unwrap(), &ty));
    }

    #[test]
    fn failed_define_leaves_namespace_unchanged() {
        fn destroy(_: &mut slotkit_core::Payload) {}

        let mut ctx = Context::new();
        let spec = TypeSpec::new("mytest.Twice")
            .slot(SlotDef::destroy(destroy))
            .slot(SlotDef::destroy(destroy));
        assert!(matches!(
            ctx.define_type(spec),
            Err(RegistrationError::DuplicateSlot { .. })
        ));
        assert!(ctx.lookup_type("mytest.Twice").is_none());

        ctx.define_type(TypeSpec::new("mytest.Once")).unwrap();
        assert!(matches!(
            ctx.define_type(TypeSpec::new("mytest.Once")),
            Err(RegistrationError::DuplicateType(_))
        ));
        assert_eq!(ctx.namespace().type_count(), 1);
    }
}
