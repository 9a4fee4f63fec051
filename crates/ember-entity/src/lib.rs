//! Entity lifecycle API, lifecycle hooks, and the ENTITY-domain consumer.
//!
//! Game code mutates entities only through [`EntityApi`], which reserves
//! slots synchronously and defers everything else onto the command bus.
//! [`EntitySystem`] applies those commands at the start of the simulation
//! phase and fires the registered [`EntityHooks`].

pub mod api;
pub mod hooks;
pub mod system;


pub use api::EntityApi;
pub use hooks::{CloneHook, DestroyHook, EntityHooks, HookList, MAX_HOOKS, SpawnHook};
pub use system::{EntityStats, EntitySystem};
