//! Generational entity handles.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A `(slot id, generation)` pair naming one incarnation of a registry slot.
///
/// A handle stays valid until its slot is destroyed; the slot's generation is
/// bumped on destroy, so any copy taken earlier no longer matches.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct EntityHandle {
    /// Slot index into the registry arrays.
    pub id: u32,
    /// Generation of the slot at the time the handle was issued.
    pub generation: u32,
}

static_assertions::assert_eq_size!(EntityHandle, u64);

impl EntityHandle {
    /// Sentinel handle that never names a live entity.
    pub const INVALID: Self = Self {
        id: u32::MAX,
        generation: 0,
    };

    /// Create a handle from its parts.
    pub const fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }

    /// Whether this handle is anything other than the sentinel.
    ///
    /// This says nothing about liveness; use `Registry::is_alive` for that.
    pub const fn is_valid(self) -> bool {
        self.id != u32::MAX
    }

    /// Slot index as `usize`.
    pub const fn index(self) -> usize {
        self.id as usize
    }

    /// Pack into a single `u64` (`generation` in the high half).
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.id as u64
    }

    /// Inverse of [`to_bits`](Self::to_bits).
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            id: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}v{}", self.id, self.generation)
        } else {
            write!(f, "invalid")
        }
    }
}
