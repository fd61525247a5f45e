//! Call context handed to native slots.

use std::fmt;
use std::sync::Arc;

use crate::error::{AllocationError, NativeError};
use crate::type_def::TypeDescriptor;

use super::{Handle, ObjectHeap, Payload, PayloadScalar};

/// Context for native slot calls.
///
/// This is the only way slot code reaches the host: it allocates through
/// it, reads and writes payloads through it, and manages references
/// through it. Slots never see the heap's internal representation.
///
/// ```ignore
/// fn init(ctx: &mut CallContext<'_>, this: Handle, args: &ParsedArgs) -> Result<(), NativeError> {
///     let x: i64 = args.get(0)?;
///     ctx.write(this, 0, x)
/// }
/// ```
pub struct CallContext<'rt> {
    heap: &'rt mut ObjectHeap,
}

impl<'rt> CallContext<'rt> {
    /// Create a new call context over the host heap.
    pub fn new(heap: &'rt mut ObjectHeap) -> Self {
        Self { heap }
    }

    /// Allocate a zeroed instance of `ty`. Used by `new` slots.
    pub fn allocate(&mut self, ty: &Arc<TypeDescriptor>) -> Result<Handle, AllocationError> {
        self.heap.allocate(ty)
    }

    /// Borrow an instance's payload.
    pub fn payload(&self, handle: Handle) -> Result<&Payload, NativeError> {
        Ok(self.heap.payload(handle)?)
    }

    /// Mutably borrow an instance's payload.
    pub fn payload_mut(&mut self, handle: Handle) -> Result<&mut Payload, NativeError> {
        Ok(self.heap.payload_mut(handle)?)
    }

    /// Read a scalar from an instance's payload.
    pub fn read<T: PayloadScalar>(&self, handle: Handle, offset: usize) -> Result<T, NativeError> {
        self.payload(handle)?.read(offset)
    }

    /// Write a scalar into an instance's payload.
    pub fn write<T: PayloadScalar>(
        &mut self,
        handle: Handle,
        offset: usize,
        value: T,
    ) -> Result<(), NativeError> {
        self.payload_mut(handle)?.write(offset, value)
    }

    /// Take a new reference to `handle`.
    pub fn dup(&mut self, handle: Handle) -> Result<Handle, NativeError> {
        self.heap.add_ref(handle)?;
        Ok(handle)
    }

    /// Drop a reference to `handle`.
    pub fn close(&mut self, handle: Handle) -> Result<(), NativeError> {
        Ok(self.heap.release(handle)?)
    }

    /// Store a traced reference inside `owner`.
    pub fn field_store(
        &mut self,
        owner: Handle,
        index: usize,
        value: Option<Handle>,
    ) -> Result<(), NativeError> {
        Ok(self.heap.field_store(owner, index, value)?)
    }

    /// Load a traced reference from `owner` as a new reference.
    pub fn field_load(&mut self, owner: Handle, index: usize) -> Result<Option<Handle>, NativeError> {
        Ok(self.heap.field_load(owner, index)?)
    }

    /// Type of an instance.
    pub fn type_of(&self, handle: Handle) -> Result<&Arc<TypeDescriptor>, NativeError> {
        Ok(self.heap.type_of(handle)?)
    }

    /// Get a reference to the heap.
    pub fn heap(&self) -> &ObjectHeap {
        self.heap
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("heap", &self.heap)
            .finish()
    }
}
