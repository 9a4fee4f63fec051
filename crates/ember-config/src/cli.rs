//! Command-line argument parsing for the Ember engine.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Ember engine command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "ember", about = "Ember 2D simulation engine")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Number of entity slots.
    #[arg(long)]
    pub max_entities: Option<u32>,

    /// Depth sort preset (flat, y_origin, y_bottom, isometric).
    #[arg(long)]
    pub depth_preset: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Debug overlay shown at startup (off, spatial_hash, entity_state, ...).
    #[arg(long)]
    pub overlay: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run this many frames headless, then exit.
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(n) = args.max_entities {
            self.core.max_entities = n;
        }
        if let Some(ref preset) = args.depth_preset {
            self.render.depth_preset = preset.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(ref overlay) = args.overlay {
            self.debug.overlay = overlay.clone();
        }
    }
}
