//! Cycle collection by trial deletion.
//!
//! Reference counting alone cannot reclaim instances that refer to each
//! other through fields. A collection pass finds them:
//!
//! 1. Start each instance's `gc_refs` at its reference count.
//! 2. Subtract one for every field reference held by another instance.
//!    Whatever remains was taken by something outside the heap.
//! 3. Instances with `gc_refs > 0` are roots; mark everything reachable
//!    from them through fields.
//! 4. Unmarked instances are garbage. Finalize all of them first (in
//!    allocation order), then clear their fields, then reclaim storage.
//!
//! Clearing fields can orphan more instances, so the pass repeats until it
//! finds no new garbage.

use std::fmt;

use log::debug;

use super::{Handle, ObjectHeap};

/// Outcome of one [`ObjectHeap::collect`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Instances inspected, summed over all rounds.
    pub examined: usize,
    /// `destroy` ran (or would have, for types without one).
    pub finalized: usize,
    /// Storage returned to the free list.
    pub reclaimed: usize,
}

impl fmt::Display for CollectStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined {}, finalized {}, reclaimed {}",
            self.examined, self.finalized, self.reclaimed
        )
    }
}

impl ObjectHeap {
    /// Run a full collection pass.
    ///
    /// Instances already finalized are never finalized again, so calling
    /// this repeatedly is harmless.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collect(&mut self) -> CollectStats {
        let mut stats = CollectStats::default();
        if self.collecting {
            return stats;
        }
        self.collecting = true;

        loop {
            let garbage = self.find_garbage(&mut stats.examined);
            if garbage.is_empty() {
                break;
            }

            for &handle in &garbage {
                self.mark_unreachable(handle);
            }
            for &handle in &garbage {
                if self.finalize(handle) {
                    stats.finalized += 1;
                }
            }

            let mut released = Vec::new();
            for &handle in &garbage {
                released.extend(self.take_fields(handle));
            }
            for &handle in &garbage {
                if self.reclaim(handle) {
                    stats.reclaimed += 1;
                }
            }
            for handle in released {
                self.release_field_ref(handle);
            }
        }

        self.collecting = false;
        self.allocs_since_collect = 0;
        debug!("collection pass: {stats}");
        stats
    }

    /// Instances not reachable from any external reference, in allocation
    /// order.
    fn find_garbage(&self, examined: &mut usize) -> Vec<Handle> {
        let count = self.slots.len();
        let mut gc_refs = vec![0i64; count];
        let mut tracked = vec![false; count];

        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(instance) = &slot.instance
                && !instance.state.is_finalized()
            {
                tracked[index] = true;
                gc_refs[index] = i64::from(instance.ref_count);
                *examined += 1;
            }
        }

        for slot in &self.slots {
            let Some(instance) = &slot.instance else {
                continue;
            };
            if instance.state.is_finalized() {
                continue;
            }
            for &child in instance.fields.iter().flatten() {
                if self.contains(child) && tracked[child.slot()] {
                    gc_refs[child.slot()] -= 1;
                }
            }
        }

        let mut reachable = vec![false; count];
        let mut stack: Vec<usize> = (0..count).filter(|&i| tracked[i] && gc_refs[i] > 0).collect();
        for &root in &stack {
            reachable[root] = true;
        }
        while let Some(index) = stack.pop() {
            let Some(instance) = &self.slots[index].instance else {
                continue;
            };
            for &child in instance.fields.iter().flatten() {
                let slot = child.slot();
                if self.contains(child) && tracked[slot] && !reachable[slot] {
                    reachable[slot] = true;
                    stack.push(slot);
                }
            }
        }

        let mut garbage: Vec<(u64, Handle)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|&(index, _)| tracked[index] && !reachable[index])
            .filter_map(|(index, slot)| {
                slot.instance
                    .as_ref()
                    .map(|i| (i.serial, Handle::new(index as u32, slot.generation)))
            })
            .collect();
        garbage.sort_unstable_by_key(|&(serial, _)| serial);
        garbage.into_iter().map(|(_, handle)| handle).collect()
    }
}
