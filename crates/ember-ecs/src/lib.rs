//! Structure-of-arrays entity storage for the Ember engine.
//!
//! Entities are slots in a fixed-capacity [`Registry`]; every per-entity
//! field is a parallel array indexed by slot id. Slots are addressed through
//! generational [`EntityHandle`]s so copies held after a destroy stay invalid
//! forever.

pub mod color;
pub mod entity;
pub mod flags;
pub mod registry;

#[cfg(test)]
mod registry_tests;

pub use color::Color;
pub use entity::EntityHandle;
pub use flags::{components, state};
pub use registry::{MAX_ENTITIES, Registry};
