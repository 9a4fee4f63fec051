//! Configuration structs with engine defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window and virtual resolution settings.
    pub window: WindowConfig,
    /// Fixed capacities of the simulation core.
    pub core: CoreConfig,
    /// Spatial hash geometry and pool sizes.
    pub spatial: SpatialConfig,
    /// Collision solver settings.
    pub physics: PhysicsConfig,
    /// Sort-key quantisation and depth preset.
    pub render: RenderConfig,
    /// Camera limits and smoothing.
    pub camera: CameraConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in physical pixels.
    pub width: u32,
    /// Window height in physical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync.
    pub vsync: bool,
    /// Window title.
    pub title: String,
    /// Simulation rate of the frame loop in Hz.
    pub target_fps: u32,
    /// Height of the virtual canvas; width follows the aspect ratio.
    pub virtual_height: u32,
    /// Frames a resize must stay stable before it is reported.
    pub resize_debounce_frames: u32,
}

/// Capacities of the registry, command bus, and visibility buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// Number of entity slots in the registry.
    pub max_entities: u32,
    /// Ring size of the command bus. Must be a power of two.
    pub cmd_buffer_size: u32,
    /// Upper bound on entities returned by a culling query.
    pub max_visible_entities: u32,
}

/// Spatial hash configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpatialConfig {
    /// Cell edge length in world units. Must be a power of two.
    pub grid_size: u32,
    /// Number of bucket heads. Must be a power of two.
    pub hash_size: u32,
    /// Node pool size of the persistent layer.
    pub max_static: u32,
    /// Node pool size of the per-frame layer.
    pub max_dynamic: u32,
}

/// Collision solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Solver iterations per tick.
    pub sub_steps: u32,
    /// Speed below which an entity falls asleep.
    pub sleep_epsilon: f32,
    /// Fraction of the overlap corrected per tick (0.5 = smooth, 1.0 = snap).
    pub separation_factor: f32,
    /// Upper clamp on the integration step in seconds.
    pub max_dt: f32,
}

/// Render sort-key configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Offset added to raw depth before quantisation.
    pub depth_bias: f32,
    /// Multiplier applied to biased depth before quantisation.
    pub depth_precision: f32,
    /// Depth preset name: `flat`, `y_origin`, `y_bottom` or `isometric`.
    pub depth_preset: String,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Smallest allowed zoom factor.
    pub min_zoom: f32,
    /// Largest allowed zoom factor.
    pub max_zoom: f32,
    /// World units added on every side of the view for culling.
    pub cull_margin: f32,
    /// Follow smoothing rate (0 = snap to target).
    pub smooth_speed: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Collect and print frame statistics.
    pub show_stats: bool,
    /// Initial overlay mode (`off`, `spatial_hash`, `entity_state`, `velocity`, `layers`).
    pub overlay: String,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Ember Engine".to_string(),
            target_fps: 120,
            virtual_height: 1080,
            resize_debounce_frames: 12,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_entities: 10_000,
            cmd_buffer_size: 16_384,
            max_visible_entities: 5_000,
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            grid_size: 128,
            hash_size: 4096,
            max_static: 40_000,
            max_dynamic: 20_000,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            sub_steps: 4,
            sleep_epsilon: 2.0,
            separation_factor: 0.5,
            max_dt: 0.05,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            depth_bias: 100_000.0,
            depth_precision: 100.0,
            depth_preset: "flat".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.2,
            max_zoom: 5.0,
            cull_margin: 256.0,
            smooth_speed: 10.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_stats: false,
            overlay: "off".to_string(),
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

fn require_power_of_two(name: &str, value: u32) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} {value} is not a power of 2"
        )))
    }
}

impl Config {
    /// Check the settings the core relies on for mask arithmetic and clamping.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_power_of_two("core.cmd_buffer_size", self.core.cmd_buffer_size)?;
        require_power_of_two("spatial.grid_size", self.spatial.grid_size)?;
        require_power_of_two("spatial.hash_size", self.spatial.hash_size)?;

        if self.core.max_entities == 0 || self.core.max_entities >= u32::MAX {
            return Err(ConfigError::Invalid(format!(
                "core.max_entities {} is out of range",
                self.core.max_entities
            )));
        }
        if self.physics.sub_steps == 0 {
            return Err(ConfigError::Invalid(
                "physics.sub_steps must be at least 1".to_string(),
            ));
        }
        if !(self.camera.min_zoom > 0.0 && self.camera.min_zoom <= self.camera.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "camera zoom range [{}, {}] is empty",
                self.camera.min_zoom, self.camera.max_zoom
            )));
        }
        Ok(())
    }

    /// Integer shift matching `spatial.grid_size`.
    pub fn grid_shift(&self) -> u32 {
        self.spatial.grid_size.trailing_zeros()
    }
}

// --- Load / Save / Reload ---

/// File name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(ConfigError::read(path))?;
    ron::from_str(&contents).map_err(ConfigError::ParseError)
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::write(config_dir))?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::write(&config_path))?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
