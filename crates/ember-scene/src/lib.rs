//! Scenes and deferred scene switching.
//!
//! A [`Scene`] is a set of optional lifecycle hooks. The [`SceneManager`]
//! owns the active scene, builds new ones through a factory, and applies
//! switch requests at the top of the next update so a scene never unloads
//! itself mid-frame.

mod context;
mod manager;

pub use context::SceneContext;
pub use manager::{Scene, SceneFactory, SceneId, SceneManager};
