use std::fmt;

/// Opaque reference to a host-managed object.
///
/// A handle is a generational index into the [`ObjectHeap`](super::ObjectHeap).
/// It is `Copy`, has no arithmetic, and compares equal only to handles of
/// the same object. When an object is reclaimed its slot generation is
/// bumped, so any handle still pointing at it becomes stale and every heap
/// operation rejects it instead of touching the reused slot.
///
/// Handles do not own memory. Reference ownership is tracked by the heap's
/// reference count: [`CallContext::dup`](super::CallContext::dup) and
/// [`CallContext::close`](super::CallContext::close) adjust it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> u32 {
        self.index
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }

    pub(crate) fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}
