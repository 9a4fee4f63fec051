//! Debug snapshot and overlay data for the Ember engine.
//!
//! [`DebugState`] is refreshed by the engine every tick and serializes to
//! JSON for tooling. [`OverlayData`] is the per-mode payload a debug overlay
//! would draw.

pub mod overlay;


use serde::{Deserialize, Serialize};
use tracing::info;

pub use overlay::{
    EntityStateCounts, LayerHistogram, MAX_HEATMAP_CELLS, OverlayData, SpatialHeatmap,
    VelocityStats,
};

/// Which overlay is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    #[default]
    Off,
    SpatialHash,
    EntityState,
    VelocityField,
    CollisionLayers,
}

impl DebugMode {
    pub const ALL: [Self; 5] = [
        Self::Off,
        Self::SpatialHash,
        Self::EntityState,
        Self::VelocityField,
        Self::CollisionLayers,
    ];

    /// Next mode, wrapping back to `Off`.
    pub fn cycle(self) -> Self {
        let i = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::SpatialHash => "spatial_hash",
            Self::EntityState => "entity_state",
            Self::VelocityField => "velocity_field",
            Self::CollisionLayers => "collision_layers",
        }
    }

    /// Parse a config or CLI name. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "velocity" => Some(Self::VelocityField),
            "layers" => Some(Self::CollisionLayers),
            other => Self::ALL.into_iter().find(|m| m.name() == other),
        }
    }
}

/// Per-frame engine snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugState {
    pub frame_count: u64,
    pub fps: f64,
    pub frame_time_ms: f64,
    pub physics_time_ms: f64,
    pub active_entities: u32,
    pub visible_entities: u32,
    pub draw_calls: u32,
    /// Commands pending on the bus when the snapshot was taken.
    pub bus_depth: u32,
    pub mode: DebugMode,
    pub scene: Option<String>,
}

impl DebugState {
    /// Advance the frame counter and derive fps from this frame's time.
    pub fn record_frame(&mut self, frame_time_secs: f64) {
        self.frame_count += 1;
        self.frame_time_ms = frame_time_secs * 1000.0;
        self.fps = if frame_time_secs > 0.0 {
            1.0 / frame_time_secs
        } else {
            0.0
        };
    }

    pub fn cycle_mode(&mut self) {
        self.mode = self.mode.cycle();
        info!("Debug overlay: {}", self.mode.name());
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
