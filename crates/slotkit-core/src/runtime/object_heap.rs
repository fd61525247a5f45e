//! Generational arena for reference-counted native instances.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error, trace, warn};

use crate::error::{AllocationError, RuntimeError};
use crate::slot::{SlotFn, SlotKind};
use crate::type_def::TypeDescriptor;

use super::{Handle, HeapSettings, LifecycleState, Payload, ReclaimPolicy};

/// Host bookkeeping plus native payload for one object.
pub(super) struct Instance {
    pub(super) ty: Arc<TypeDescriptor>,
    pub(super) ref_count: u32,
    pub(super) state: LifecycleState,
    pub(super) payload: Payload,
    // host references stored inside the object; each one holds a reference
    pub(super) fields: Vec<Option<Handle>>,
    // allocation order, used to finalize garbage deterministically
    pub(super) serial: u64,
    // tracking generation current when the instance was allocated
    pub(super) opened_in: u64,
}

pub(super) struct HeapSlot {
    pub(super) generation: u32,
    pub(super) instance: Option<Instance>,
}

/// Heap storage for native instances.
///
/// Objects live in a `Vec` of slots. When an object is reclaimed its slot
/// is reused but the generation is incremented, so handles to the old
/// object are detected as stale instead of aliasing the new one.
///
/// Each instance carries a reference count covering both external handles
/// and handles stored in other instances' fields. What happens when it
/// reaches zero depends on [`ReclaimPolicy`]; cycles are only reclaimed by
/// [`collect`](ObjectHeap::collect).
///
/// Dropping the heap finalizes every instance that has not been finalized
/// yet, in allocation order, so `destroy` still runs exactly once for
/// objects that outlive their last collection pass.
pub struct ObjectHeap {
    pub(super) slots: Vec<HeapSlot>,
    pub(super) free_list: Vec<u32>,
    pub(super) settings: HeapSettings,
    pub(super) live: usize,
    pub(super) payload_bytes: usize,
    pub(super) allocs_since_collect: usize,
    pub(super) next_serial: u64,
    pub(super) collecting: bool,
    tracking_generation: u64,
    closed: VecDeque<Handle>,
}

impl ObjectHeap {
    /// Create an empty heap with default settings.
    pub fn new() -> Self {
        Self::with_settings(HeapSettings::default())
    }

    /// Create an empty heap.
    pub fn with_settings(settings: HeapSettings) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            settings,
            live: 0,
            payload_bytes: 0,
            allocs_since_collect: 0,
            next_serial: 0,
            collecting: false,
            tracking_generation: 0,
            closed: VecDeque::new(),
        }
    }

    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    /// Number of instances holding storage (not yet reclaimed).
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Payload bytes currently held by all instances.
    pub fn payload_bytes(&self) -> usize {
        self.payload_bytes
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate a zeroed instance of `ty` with one reference.
    ///
    /// Runs a collection pass first when the automatic threshold is reached.
    /// The instance starts `Allocated`; nothing type-specific runs.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn allocate(&mut self, ty: &Arc<TypeDescriptor>) -> Result<Handle, AllocationError> {
        let threshold = self.settings.gc_threshold;
        if threshold > 0 && self.allocs_since_collect >= threshold && !self.collecting {
            self.collect();
        }

        if self.live >= self.settings.max_objects {
            return Err(AllocationError::OutOfObjects {
                limit: self.settings.max_objects,
            });
        }
        let size = ty.payload_size();
        let available = self.settings.max_payload_bytes.saturating_sub(self.payload_bytes);
        if size > available {
            return Err(AllocationError::OutOfPayloadMemory {
                requested: size,
                available,
            });
        }

        let instance = Instance {
            ty: Arc::clone(ty),
            ref_count: 1,
            state: LifecycleState::Allocated,
            payload: Payload::zeroed(size),
            fields: Vec::new(),
            serial: self.next_serial,
            opened_in: self.tracking_generation,
        };
        self.next_serial += 1;
        self.live += 1;
        self.payload_bytes += size;
        self.allocs_since_collect += 1;

        let handle = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.instance = Some(instance);
            Handle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                instance: Some(instance),
            });
            Handle::new(index, 0)
        };

        trace!("allocated {:?} of {} ({} payload bytes)", handle, ty.name(), size);
        Ok(handle)
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub(super) fn instance(&self, handle: Handle) -> Result<&Instance, RuntimeError> {
        self.slots
            .get(handle.slot())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.instance.as_ref())
            .ok_or(RuntimeError::StaleHandle {
                index: handle.index(),
            })
    }

    pub(super) fn instance_mut(&mut self, handle: Handle) -> Result<&mut Instance, RuntimeError> {
        self.slots
            .get_mut(handle.slot())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.instance.as_mut())
            .ok_or(RuntimeError::StaleHandle {
                index: handle.index(),
            })
    }

    /// Check if the handle refers to an instance that still holds storage.
    pub fn contains(&self, handle: Handle) -> bool {
        self.instance(handle).is_ok()
    }

    /// Check if slots may be dispatched on the handle.
    ///
    /// False once the last reference has been dropped, even if `destroy`
    /// has not run yet.
    pub fn is_alive(&self, handle: Handle) -> bool {
        self.instance(handle)
            .map(|i| i.state.is_dispatchable())
            .unwrap_or(false)
    }

    /// Like [`instance`](Self::instance) but rejects objects whose last
    /// reference is gone.
    pub(super) fn live_instance(&self, handle: Handle) -> Result<&Instance, RuntimeError> {
        if !self.is_alive(handle) {
            return Err(self.invalid_handle(handle));
        }
        self.instance(handle)
    }

    pub(super) fn live_instance_mut(&mut self, handle: Handle) -> Result<&mut Instance, RuntimeError> {
        if !self.is_alive(handle) {
            return Err(self.invalid_handle(handle));
        }
        self.instance_mut(handle)
    }

    fn invalid_handle(&self, handle: Handle) -> RuntimeError {
        debug!("use of invalid handle {handle:?}");
        if let Some(hook) = self.settings.on_invalid_handle {
            (hook.0)(handle);
        }
        RuntimeError::StaleHandle {
            index: handle.index(),
        }
    }

    /// The type of a live instance.
    pub fn type_of(&self, handle: Handle) -> Result<&Arc<TypeDescriptor>, RuntimeError> {
        Ok(&self.live_instance(handle)?.ty)
    }

    /// Current lifecycle state. Stale handles report `Reclaimed`.
    pub fn state(&self, handle: Handle) -> LifecycleState {
        self.instance(handle)
            .map(|i| i.state)
            .unwrap_or(LifecycleState::Reclaimed)
    }

    /// Move an instance to `next`, rejecting illegal edges.
    pub(crate) fn set_state(&mut self, handle: Handle, next: LifecycleState) -> Result<(), RuntimeError> {
        let instance = self.instance_mut(handle)?;
        let current = instance.state;
        if !current.can_transition_to(next) {
            warn!("rejected lifecycle transition {current} -> {next} for {handle:?}");
            return Err(RuntimeError::InvalidTransition {
                index: handle.index(),
                from: current.name(),
                to: next.name(),
            });
        }
        instance.state = next;
        debug!("{:?} ({}): {} -> {}", handle, instance.ty.name(), current, next);
        Ok(())
    }

    /// Finish construction: move a freshly built instance to `Live`.
    ///
    /// `Allocated` and `Initialized` instances advance to `Live`; an
    /// instance that is already `Live` (a custom `new` may hand back an
    /// existing object) is left alone. Any other state is an error.
    ///
    /// This is the only way to move an instance forward from outside the
    /// crate; arbitrary transitions are not exposed:
    ///
    /// ```compile_fail
    /// use slotkit_core::{Handle, LifecycleState, ObjectHeap};
    ///
    /// fn strand(heap: &mut ObjectHeap, handle: Handle) {
    ///     heap.set_state(handle, LifecycleState::Unreachable).unwrap();
    /// }
    /// ```
    pub fn complete_construction(&mut self, handle: Handle) -> Result<(), RuntimeError> {
        if self.live_instance(handle)?.state == LifecycleState::Allocated {
            self.set_state(handle, LifecycleState::Initialized)?;
        }
        if self.instance(handle)?.state == LifecycleState::Initialized {
            self.set_state(handle, LifecycleState::Live)?;
        }
        Ok(())
    }

    /// Reference count, or `None` for stale handles.
    pub fn ref_count(&self, handle: Handle) -> Option<u32> {
        self.instance(handle).ok().map(|i| i.ref_count)
    }

    /// Payload of a live instance.
    pub fn payload(&self, handle: Handle) -> Result<&Payload, RuntimeError> {
        Ok(&self.live_instance(handle)?.payload)
    }

    /// Mutable payload of a live instance.
    pub fn payload_mut(&mut self, handle: Handle) -> Result<&mut Payload, RuntimeError> {
        Ok(&mut self.live_instance_mut(handle)?.payload)
    }

    // ========================================================================
    // Reference counting
    // ========================================================================

    /// Take one more reference.
    pub fn add_ref(&mut self, handle: Handle) -> Result<(), RuntimeError> {
        let instance = self.live_instance_mut(handle)?;
        instance.ref_count = instance.ref_count.saturating_add(1);
        Ok(())
    }

    /// Drop one reference.
    ///
    /// When the count reaches zero the instance becomes `Unreachable`. Under
    /// [`ReclaimPolicy::Immediate`] it is then finalized and reclaimed at
    /// once, releasing its fields in turn. Under `Deferred` it waits for the
    /// next collection pass.
    pub fn release(&mut self, handle: Handle) -> Result<(), RuntimeError> {
        let instance = self.live_instance_mut(handle)?;
        instance.ref_count = instance.ref_count.saturating_sub(1);
        if instance.ref_count > 0 {
            return Ok(());
        }

        self.mark_unreachable(handle);
        if self.settings.reclaim_policy == ReclaimPolicy::Immediate && !self.collecting {
            self.reclaim_cascade(handle);
        }
        Ok(())
    }

    /// Drop a reference held by a field that is being cleared.
    ///
    /// Unlike [`release`](Self::release) this tolerates stale and already
    /// unreachable targets, which is normal while tearing down garbage.
    pub(super) fn release_field_ref(&mut self, handle: Handle) -> bool {
        let Ok(instance) = self.instance_mut(handle) else {
            return false;
        };
        if !instance.state.is_dispatchable() || instance.ref_count == 0 {
            return false;
        }
        instance.ref_count -= 1;
        if instance.ref_count > 0 {
            return false;
        }
        self.mark_unreachable(handle);
        true
    }

    /// Move a dispatchable instance to `Unreachable`; other states are left
    /// as they are.
    pub(super) fn mark_unreachable(&mut self, handle: Handle) {
        if let Ok(instance) = self.instance_mut(handle)
            && instance.state.can_transition_to(LifecycleState::Unreachable)
        {
            debug!("{:?} ({}): {} -> Unreachable", handle, instance.ty.name(), instance.state);
            instance.state = LifecycleState::Unreachable;
        }
    }

    fn reclaim_cascade(&mut self, start: Handle) {
        let mut worklist = vec![start];
        while let Some(handle) = worklist.pop() {
            self.finalize(handle);
            let fields = self.take_fields(handle);
            self.reclaim(handle);
            for child in fields {
                if self.release_field_ref(child) {
                    worklist.push(child);
                }
            }
        }
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Store a reference to `value` in field `index` of `owner`.
    ///
    /// The field takes its own reference; the caller keeps theirs. Whatever
    /// the field held before is released.
    pub fn field_store(
        &mut self,
        owner: Handle,
        index: usize,
        value: Option<Handle>,
    ) -> Result<(), RuntimeError> {
        self.live_instance(owner)?;
        let limit = self.settings.max_fields;
        let len = index
            .checked_add(1)
            .filter(|&len| len <= limit)
            .ok_or(RuntimeError::FieldIndexOutOfRange { index, limit })?;
        if let Some(value) = value {
            self.add_ref(value)?;
        }

        let instance = self.live_instance_mut(owner)?;
        if instance.fields.len() < len {
            instance.fields.resize(len, None);
        }
        let previous = std::mem::replace(&mut instance.fields[index], value);

        if let Some(previous) = previous {
            self.release(previous)?;
        }
        Ok(())
    }

    /// Load field `index` of `owner` as a new reference the caller must
    /// release. Empty and never-stored fields load as `None`.
    pub fn field_load(&mut self, owner: Handle, index: usize) -> Result<Option<Handle>, RuntimeError> {
        let loaded = self
            .live_instance(owner)?
            .fields
            .get(index)
            .copied()
            .flatten();
        if let Some(handle) = loaded {
            self.add_ref(handle)?;
        }
        Ok(loaded)
    }

    pub(super) fn take_fields(&mut self, handle: Handle) -> Vec<Handle> {
        match self.instance_mut(handle) {
            Ok(instance) => std::mem::take(&mut instance.fields).into_iter().flatten().collect(),
            Err(_) => Vec::new(),
        }
    }

    // ========================================================================
    // Finalization
    // ========================================================================

    /// Run the `destroy` slot of an unreachable instance.
    ///
    /// Returns false if the instance was already finalized. The state is
    /// moved to `Finalized` before the slot runs, so `destroy` can never run
    /// twice for the same instance. A panicking `destroy` is logged and
    /// swallowed.
    pub(super) fn finalize(&mut self, handle: Handle) -> bool {
        let Ok(instance) = self.instance_mut(handle) else {
            return false;
        };
        if instance.state != LifecycleState::Unreachable {
            if !instance.state.is_finalized() {
                warn!("refusing to finalize {:?} in state {}", handle, instance.state);
            }
            return false;
        }
        instance.state = LifecycleState::Finalized;

        let destroy = match instance.ty.slot(SlotKind::Destroy).map(|s| s.func) {
            Some(SlotFn::Destroy(f)) => Some(f),
            _ => None,
        };
        if let Some(destroy) = destroy {
            let payload = &mut instance.payload;
            if panic::catch_unwind(AssertUnwindSafe(|| destroy(payload))).is_err() {
                error!("destroy slot of {} panicked for {:?}", instance.ty.name(), handle);
            }
        }
        debug!("finalized {:?} ({})", handle, instance.ty.name());
        true
    }

    /// Return a finalized instance's storage to the free list.
    pub(super) fn reclaim(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.slot()) else {
            return false;
        };
        if slot.generation != handle.generation() {
            return false;
        }
        match slot.instance.as_ref() {
            Some(instance) if instance.state == LifecycleState::Finalized => {}
            _ => return false,
        }
        let Some(instance) = slot.instance.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index());
        self.live -= 1;
        self.payload_bytes -= instance.payload.len();
        if self.settings.closed_handles_limit > 0 {
            if self.closed.len() >= self.settings.closed_handles_limit {
                self.closed.pop_front();
            }
            self.closed.push_back(handle);
        }
        trace!("reclaimed {:?} ({})", handle, instance.ty.name());
        true
    }

    // ========================================================================
    // Handle tracking
    // ========================================================================

    /// Start a new tracking generation and return its number.
    ///
    /// Instances allocated from now on are tagged with it, so
    /// [`open_handles`](Self::open_handles) can report what a piece of code
    /// allocated and never released.
    pub fn new_generation(&mut self) -> u64 {
        self.tracking_generation += 1;
        self.tracking_generation
    }

    /// The tracking generation new instances are tagged with.
    pub fn current_generation(&self) -> u64 {
        self.tracking_generation
    }

    /// Instances allocated in generation `since` or later that still hold
    /// references, in allocation order.
    pub fn open_handles(&self, since: u64) -> Vec<Handle> {
        let mut open: Vec<(u64, Handle)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let instance = slot.instance.as_ref()?;
                let open = instance.opened_in >= since
                    && instance.ref_count > 0
                    && instance.state.is_dispatchable();
                open.then(|| (instance.serial, Handle::new(index as u32, slot.generation)))
            })
            .collect();
        open.sort_unstable_by_key(|&(serial, _)| serial);
        open.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Most recently reclaimed handles, oldest first, bounded by
    /// `closed_handles_limit`.
    pub fn closed_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.closed.iter().copied()
    }

    /// Check if `handle` is among the remembered reclaimed handles.
    pub fn was_closed(&self, handle: Handle) -> bool {
        self.closed.contains(&handle)
    }
}

impl Drop for ObjectHeap {
    fn drop(&mut self) {
        self.collecting = true;
        let mut survivors: Vec<(u64, Handle)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let instance = slot.instance.as_ref()?;
                (!instance.state.is_finalized())
                    .then(|| (instance.serial, Handle::new(index as u32, slot.generation)))
            })
            .collect();
        if survivors.is_empty() {
            return;
        }
        survivors.sort_unstable_by_key(|&(serial, _)| serial);
        debug!("finalizing {} instance(s) at heap teardown", survivors.len());

        for &(_, handle) in &survivors {
            self.mark_unreachable(handle);
        }
        for &(_, handle) in &survivors {
            self.finalize(handle);
        }
        for &(_, handle) in &survivors {
            self.take_fields(handle);
        }
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .field("live", &self.live)
            .field("payload_bytes", &self.payload_bytes)
            .finish()
    }
}
