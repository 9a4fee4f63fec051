//! Baked sprite-sheet animation.
//!
//! Playing an animation copies its definition into per-entity registry
//! arrays once (the "baker"); the per-tick [`AnimationSystem::update`] then
//! runs over plain SoA data without touching the definition table.

pub mod defs;
pub mod system;

pub use defs::{AnimDef, AnimTable, AnimTableError};
pub use system::{AnimationSystem, MIN_ANIM_VALUE};
