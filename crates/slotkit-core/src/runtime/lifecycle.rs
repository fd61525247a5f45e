//! Per-instance lifecycle state machine.

use std::fmt;

/// Where an instance is in its life.
///
/// ```text
/// Allocated -> Initialized -> Live -> Unreachable -> Finalized -> Reclaimed
///      \             \                    ^
///       `-------------`-------------------'
/// ```
///
/// An instance whose construction fails can go straight from `Allocated` or
/// `Initialized` to `Unreachable`. Every other edge is strictly forward, so
/// an instance can only reach `Finalized` once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Storage exists; `init` has not run.
    Allocated,
    /// `init` succeeded (or the type has none).
    Initialized,
    /// Construction completed; handed to the caller.
    Live,
    /// No references remain; waiting for `destroy`.
    Unreachable,
    /// `destroy` has run.
    Finalized,
    /// Storage returned to the allocator. Terminal.
    Reclaimed,
}

impl LifecycleState {
    /// Check if moving to `next` is a legal edge.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Allocated, Initialized)
                | (Allocated, Unreachable)
                | (Initialized, Live)
                | (Initialized, Unreachable)
                | (Live, Unreachable)
                | (Unreachable, Finalized)
                | (Finalized, Reclaimed)
        )
    }

    /// Check if protocol slots may still be dispatched in this state.
    pub fn is_dispatchable(self) -> bool {
        matches!(
            self,
            LifecycleState::Allocated | LifecycleState::Initialized | LifecycleState::Live
        )
    }

    /// Check if `destroy` has already run.
    pub fn is_finalized(self) -> bool {
        matches!(self, LifecycleState::Finalized | LifecycleState::Reclaimed)
    }

    pub fn name(self) -> &'static str {
        match self {
            LifecycleState::Allocated => "Allocated",
            LifecycleState::Initialized => "Initialized",
            LifecycleState::Live => "Live",
            LifecycleState::Unreachable => "Unreachable",
            LifecycleState::Finalized => "Finalized",
            LifecycleState::Reclaimed => "Reclaimed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
