//! Dispatch trampoline: routes host protocol calls to native slots.
//!
//! Every entry point follows the same shape:
//!
//! 1. Resolve the instance's type (stale handles fail here).
//! 2. Find the slot, method or member; absence is reported, never called.
//! 3. Validate the raw argument bundle against the callee's [`ArgSpec`].
//! 4. Only then run native code, forwarding its error unchanged.
//!
//! Construction runs `new` then `init` on the same arguments. Both argument
//! specs are checked before `new` runs, so a bad call never allocates.

use std::sync::Arc;

use log::{trace, warn};

use slotkit_core::{
    ArgSpec, ArgumentError, Args, CallContext, ConstructError, DispatchError, Handle,
    NativeError, NewFn, ParsedArgs, RuntimeError, SlotDef, SlotFn, SlotKind,
    TypeDescriptor, Value, generic_new,
};

use crate::Context;

/// A protocol call on an existing instance, keyed by slot kind.
#[derive(Debug, Clone, Copy)]
pub enum SlotCall<'a> {
    /// Re-run `init` with new arguments.
    Init(&'a Args),
    /// Index with a signed integer.
    ItemGet(isize),
}

impl SlotCall<'_> {
    /// The slot this call is routed to.
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotCall::Init(_) => SlotKind::Init,
            SlotCall::ItemGet(_) => SlotKind::ItemGet,
        }
    }
}

fn parse(spec: Option<&ArgSpec>, args: &Args) -> Result<ParsedArgs, ArgumentError> {
    match spec {
        Some(spec) => spec.parse(args),
        None => Ok(ParsedArgs::unchecked(args)),
    }
}

impl Context {
    // ==========================================================================
    // Construction
    // ==========================================================================

    /// Construct an instance of the type registered as `name`.
    ///
    /// Returns a `Live` instance owning one reference. On failure no handle
    /// escapes; if `init` fails the half-built instance is released and its
    /// `destroy` runs exactly once, immediately or at the next collection
    /// depending on the reclaim policy.
    pub fn construct(&mut self, name: &str, args: &Args) -> Result<Handle, ConstructError> {
        let ty = self
            .namespace
            .lookup(name)
            .cloned()
            .ok_or_else(|| ConstructError::TypeNotFound(name.to_string()))?;
        self.construct_type(&ty, args)
    }

    /// Construct an instance of an already-resolved type.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn construct_type(
        &mut self,
        ty: &Arc<TypeDescriptor>,
        args: &Args,
    ) -> Result<Handle, ConstructError> {
        let type_name = ty.name();
        trace!("construct {} with {} argument(s)", type_name, args.len());

        let argument_error = |source| ConstructError::Argument {
            type_name: type_name.to_string(),
            source,
        };

        let (new_fn, new_spec) = match ty.slot(SlotKind::New) {
            Some(SlotDef {
                func: SlotFn::New(f),
                args: spec,
                ..
            }) => (*f, spec.as_ref()),
            _ => (generic_new as NewFn, None),
        };
        let new_args = parse(new_spec, args).map_err(argument_error)?;
        let init = match ty.slot(SlotKind::Init) {
            Some(SlotDef {
                func: SlotFn::Init(f),
                args: spec,
                ..
            }) => Some((*f, parse(spec.as_ref(), args).map_err(argument_error)?)),
            _ => None,
        };

        let handle = new_fn(&mut CallContext::new(&mut self.heap), ty, &new_args).map_err(
            |source| match source {
                NativeError::Allocation(err) => ConstructError::Allocation(err),
                source => ConstructError::NewFailed {
                    type_name: type_name.to_string(),
                    source,
                },
            },
        )?;

        // a custom `new` may hand back an instance of another type; only
        // instances of this type are initialized
        let returned = self
            .heap
            .type_of(handle)
            .map_err(|err| ConstructError::NewFailed {
                type_name: type_name.to_string(),
                source: err.into(),
            })?;
        let same_type = Arc::ptr_eq(returned, ty);

        if same_type && let Some((init_fn, init_args)) = init {
            if let Err(source) = init_fn(&mut CallContext::new(&mut self.heap), handle, &init_args) {
                trace!("init of {} failed, releasing {:?}", type_name, handle);
                if let Err(err) = self.heap.release(handle) {
                    warn!("could not release {:?} after failed init of {}: {}", handle, type_name, err);
                }
                return Err(ConstructError::InitFailed {
                    type_name: type_name.to_string(),
                    source,
                });
            }
        }

        if let Err(err) = self.heap.complete_construction(handle) {
            warn!("could not complete construction of {:?} ({}): {}", handle, type_name, err);
            return Err(ConstructError::NewFailed {
                type_name: type_name.to_string(),
                source: err.into(),
            });
        }
        Ok(handle)
    }

    // ==========================================================================
    // Slot protocol
    // ==========================================================================

    /// Route a protocol call to the instance's slot.
    ///
    /// `Init` returns `Value::None` on success.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn dispatch(&mut self, handle: Handle, call: SlotCall<'_>) -> Result<Value, DispatchError> {
        let ty = Arc::clone(self.heap.type_of(handle)?);
        let kind = call.kind();
        trace!("dispatch {} on {:?} ({})", kind, handle, ty.name());

        let slot = ty
            .slot(kind)
            .ok_or_else(|| DispatchError::NotImplemented {
                type_name: ty.name().to_string(),
                slot: kind,
            })?;
        let mut ctx = CallContext::new(&mut self.heap);

        match (call, slot.func) {
            (SlotCall::Init(args), SlotFn::Init(f)) => {
                let parsed = parse(slot.args.as_ref(), args)?;
                f(&mut ctx, handle, &parsed)?;
                Ok(Value::None)
            }
            (SlotCall::ItemGet(index), SlotFn::Item(f)) => Ok(f(&mut ctx, handle, index)?),
            _ => Err(DispatchError::NotImplemented {
                type_name: ty.name().to_string(),
                slot: kind,
            }),
        }
    }

    /// Index into an instance. Bounds are entirely the slot's business.
    pub fn get_item(&mut self, handle: Handle, index: isize) -> Result<Value, DispatchError> {
        self.dispatch(handle, SlotCall::ItemGet(index))
    }

    // ==========================================================================
    // Attributes
    // ==========================================================================

    /// Read a payload member.
    pub fn get_attr(&self, handle: Handle, name: &str) -> Result<Value, DispatchError> {
        let ty = self.heap.type_of(handle)?;
        let member = ty
            .member(name)
            .ok_or_else(|| DispatchError::NoSuchAttribute {
                type_name: ty.name().to_string(),
                name: name.to_string(),
            })?;
        let payload = self.heap.payload(handle)?;
        Ok(member.kind.read(payload, member.offset)?)
    }

    /// Write a payload member, converting `value` to its native type.
    pub fn set_attr(&mut self, handle: Handle, name: &str, value: &Value) -> Result<(), DispatchError> {
        let ty = Arc::clone(self.heap.type_of(handle)?);
        let member = ty
            .member(name)
            .ok_or_else(|| DispatchError::NoSuchAttribute {
                type_name: ty.name().to_string(),
                name: name.to_string(),
            })?;
        if member.readonly {
            return Err(DispatchError::ReadOnly {
                type_name: ty.name().to_string(),
                name: name.to_string(),
            });
        }
        let payload = self.heap.payload_mut(handle)?;
        Ok(member.kind.write(payload, member.offset, value)?)
    }

    /// Call a method on an instance.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call_method(
        &mut self,
        handle: Handle,
        name: &str,
        args: &Args,
    ) -> Result<Value, DispatchError> {
        let ty = Arc::clone(self.heap.type_of(handle)?);
        trace!("call {}.{} on {:?}", ty.name(), name, handle);
        let method = ty
            .method(name)
            .ok_or_else(|| DispatchError::NoSuchAttribute {
                type_name: ty.name().to_string(),
                name: name.to_string(),
            })?;
        let parsed = parse(method.args.as_ref(), args)?;
        Ok((method.func)(&mut CallContext::new(&mut self.heap), handle, &parsed)?)
    }

    /// Call a module function by dotted name.
    pub fn call_function(&mut self, name: &str, args: &Args) -> Result<Value, DispatchError> {
        let func = self
            .namespace
            .lookup_function(name)
            .cloned()
            .ok_or_else(|| RuntimeError::FunctionNotFound(name.to_string()))?;
        trace!("call {}", func.name);
        let parsed = parse(func.args.as_ref(), args)?;
        Ok((func.func)(&mut CallContext::new(&mut self.heap), &parsed)?)
    }
}
