//! Heap configuration.

use std::fmt;

use super::Handle;

/// What happens when an instance's reference count reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Finalize and reclaim synchronously on the last release.
    #[default]
    Immediate,
    /// Only mark the instance unreachable; the next collection pass
    /// finalizes it.
    Deferred,
}

/// Called with the offending handle whenever a reclaimed or unreachable
/// handle is used.
#[derive(Clone, Copy)]
pub struct InvalidHandleHook(pub fn(Handle));

impl PartialEq for InvalidHandleHook {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::fn_addr_eq(self.0, other.0)
    }
}

impl Eq for InvalidHandleHook {}

impl fmt::Debug for InvalidHandleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InvalidHandleHook(..)")
    }
}

/// User-facing heap options. `None` keeps the default.
#[derive(Debug, Clone, Default)]
pub struct HeapCreateInfo {
    pub reclaim_policy: Option<ReclaimPolicy>,
    // allocations between automatic collection passes, 0 disables them
    pub gc_threshold: Option<usize>,
    pub max_objects: Option<usize>,
    // total payload bytes across all live instances
    pub max_payload_bytes: Option<usize>,
    // reference fields per instance
    pub max_fields: Option<usize>,
    // how many reclaimed handles are remembered
    pub closed_handles_limit: Option<usize>,
    pub on_invalid_handle: Option<InvalidHandleHook>,
}

/// Resolved heap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapSettings {
    pub reclaim_policy: ReclaimPolicy,
    pub gc_threshold: usize,
    pub max_objects: usize,
    pub max_payload_bytes: usize,
    pub max_fields: usize,
    pub closed_handles_limit: usize,
    pub on_invalid_handle: Option<InvalidHandleHook>,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            reclaim_policy: ReclaimPolicy::Immediate,
            gc_threshold: 700,
            max_objects: u32::MAX as usize,
            max_payload_bytes: 64 * 1024 * 1024,
            max_fields: 1024,
            closed_handles_limit: 1024,
            on_invalid_handle: None,
        }
    }
}

impl From<HeapCreateInfo> for HeapSettings {
    fn from(info: HeapCreateInfo) -> Self {
        let mut settings = HeapSettings::default();
        info.reclaim_policy
            .inspect(|&val| settings.reclaim_policy = val);
        info.gc_threshold.inspect(|&val| settings.gc_threshold = val);
        info.max_objects.inspect(|&val| settings.max_objects = val);
        info.max_payload_bytes
            .inspect(|&val| settings.max_payload_bytes = val);
        info.max_fields.inspect(|&val| settings.max_fields = val);
        info.closed_handles_limit
            .inspect(|&val| settings.closed_handles_limit = val);
        settings.on_invalid_handle = info.on_invalid_handle;
        settings
    }
}
