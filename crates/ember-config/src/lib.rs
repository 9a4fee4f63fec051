//! Configuration system for the Ember engine.
//!
//! Every tunable constant of the simulation core (capacities, spatial grid
//! sizes, solver parameters, sort-key quantisation, camera limits) lives here
//! as a RON-persisted setting with a sensible default. CLI overrides are
//! applied on top via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, CameraConfig, Config, CoreConfig, DebugConfig, PhysicsConfig, RenderConfig,
    SpatialConfig, WindowConfig,
};
pub use error::ConfigError;
