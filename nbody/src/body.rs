//! Per-body simulation state.

use serde::{Deserialize, Serialize};

use crate::vector2::Vector2;

/// Identifier for a body, unique among currently-live bodies and stable for
/// its lifetime. `BodyManager` assigns the lowest id not currently in use, so
/// deleting a body frees its id for a future `create_body` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl BodyId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Sentinel meaning "this body is not in the dense enabled-subset list".
pub(crate) const NOT_ENABLED: usize = usize::MAX;

/// A simulation entity: mutable mass/position/velocity/acceleration state
/// plus the bookkeeping `BodyManager` needs to maintain its dense
/// enabled-subset view (spec.md §4.2).
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub(crate) id: BodyId,
    pub(crate) enabled: bool,
    pub mass: f64,
    pub position: Vector2,
    pub velocity: Vector2,
    pub acceleration: Vector2,

    /// Half-step velocity computed during the KDK Velocity-Verlet kick-drift
    /// phase, consumed by the second half-kick in the same step
    /// (spec.md §9 "Half-step velocity storage").
    pub(crate) v_half: Vector2,

    /// Index of this body within `BodyManager`'s dense enabled list, or
    /// `NOT_ENABLED` when the body is disabled.
    pub(crate) enabled_index: usize,
}

impl Body {
    pub(crate) fn new(id: BodyId) -> Self {
        Self {
            id,
            enabled: false,
            mass: 0.0,
            position: Vector2::ZERO,
            velocity: Vector2::ZERO,
            acceleration: Vector2::ZERO,
            v_half: Vector2::ZERO,
            enabled_index: NOT_ENABLED,
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}
