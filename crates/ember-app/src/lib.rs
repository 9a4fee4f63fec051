//! Ember engine application layer.
//!
//! [`Engine`] owns every subsystem and runs the fixed per-tick phase order;
//! [`GameLoop`] turns wall-clock time into fixed simulation steps; [`demo`]
//! holds the scenes the headless binary plays.

pub mod demo;
pub mod engine;
pub mod game_loop;

#[cfg(test)]
mod engine_tests;

pub use engine::{Engine, EngineError, HeadlessEngine, Providers};
pub use game_loop::GameLoop;
