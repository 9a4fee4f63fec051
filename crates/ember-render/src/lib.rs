//! Depth-sorted sprite rendering for the Ember engine.
//!
//! Each frame the [`RenderSystem`] culls the spatial hash against the
//! [`CameraSystem`]'s cull bounds, packs a 64-bit sort key per visible entity
//! (`layer | batch | depth | id`), sorts, and walks the result into a
//! [`DrawBackend`], switching render state whenever the batch id changes.

pub mod backend;
pub mod batch;
pub mod camera;
pub mod sort_key;
pub mod system;

#[cfg(test)]
mod system_tests;

pub use backend::{Camera2D, DrawBackend, DrawCall, RecordingBackend, SpriteDraw};
pub use batch::{BatchTable, BlendMode, FilterMode, MAX_BATCHES, RenderState, batch_ids};
pub use camera::{CameraMode, CameraSettings, CameraSystem};
pub use sort_key::{DepthMath, DepthMathError, DepthPreset, SortFields, quantize_depth};
pub use system::{MAX_VISIBLE_ENTITIES, RenderSettings, RenderStats, RenderSystem};
