//! Headless entry point: runs the demo for a fixed number of frames and
//! prints the final debug snapshot as JSON.

use clap::Parser;
use ember_app::{Engine, GameLoop, Providers, demo};
use ember_config::{CliArgs, Config};
use ember_platform::PlatformDirs;

/// Frames run when `--frames` is not given.
const DEFAULT_FRAMES: u64 = 600;

fn main() {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(root) => PlatformDirs::with_root(root),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to resolve platform directories: {e}");
                std::process::exit(1);
            }
        },
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
        std::process::exit(1);
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e}");
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);

    ember_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    let target_fps = config.window.target_fps;
    let show_stats = config.debug.show_stats;
    let providers = Providers::headless(&config, demo::anim_table());
    let mut engine = match Engine::new(config, providers) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to start engine: {e}");
            std::process::exit(1);
        }
    };
    engine.set_scene_factory(demo::factory());
    engine.request_scene(demo::scene_ids::MENU);

    let frames = args.frames.unwrap_or(DEFAULT_FRAMES);
    let mut game_loop = GameLoop::new(target_fps);
    let step = game_loop.step();
    for frame in 0..frames {
        demo::script(frame, engine.input_mut());
        game_loop.advance(step, |dt| engine.tick(dt));
    }
    engine.shutdown_scene();

    match engine.debug_state().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize debug state: {e}"),
    }
    if show_stats {
        match serde_json::to_string_pretty(&engine.overlay()) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize overlay: {e}"),
        }
    }
}
