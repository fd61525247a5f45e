//! Host heap and slot execution context.
//!
//! This module provides the in-process host that native types plug into.
//!
//! ## Key Types
//!
//! - [`Handle`]: Generational reference to a heap instance
//! - [`Value`]: Argument and result representation
//! - [`Payload`]: Per-instance native byte region
//! - [`ObjectHeap`]: Generational arena with reference counts and a cycle collector
//! - [`CallContext`]: What a native slot sees of the host
//! - [`LifecycleState`]: Per-instance state machine

mod call_context;
mod collector;
mod handle;
mod lifecycle;
mod object_heap;
mod payload;
mod settings;
mod value;

pub use call_context::CallContext;
pub use collector::CollectStats;
pub use handle::Handle;
pub use lifecycle::LifecycleState;
pub use object_heap::ObjectHeap;
pub use payload::{Payload, PayloadScalar};
pub use settings::{HeapCreateInfo, HeapSettings, InvalidHandleHook, ReclaimPolicy};
pub use value::Value;
