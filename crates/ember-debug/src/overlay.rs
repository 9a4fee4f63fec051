//! Data behind each debug overlay mode.

use std::collections::BTreeMap;

use ember_ecs::{Registry, components, state};
use ember_spatial::{Aabb, SpatialHash};
use serde::{Deserialize, Serialize};

use crate::DebugMode;

/// Upper bound on heatmap cells sampled in one snapshot.
pub const MAX_HEATMAP_CELLS: usize = 64 * 64;

/// Spatial-hash node count per grid cell over a view rectangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialHeatmap {
    /// Grid coordinates of the top-left sampled cell.
    pub min_cell: (i32, i32),
    pub cols: u32,
    pub rows: u32,
    pub cell_size: u32,
    /// Row-major populations, `cols * rows` long.
    pub cells: Vec<u32>,
    pub max: u32,
    /// Whether the view covered more cells than were sampled.
    pub truncated: bool,
}

impl SpatialHeatmap {
    pub fn sample(spatial: &SpatialHash, view: Aabb) -> Self {
        let (min_x, min_y, max_x, max_y) = spatial.cell_span(view);
        let full_cols = (max_x - min_x + 1).max(0) as usize;
        let full_rows = (max_y - min_y + 1).max(0) as usize;

        let side = (MAX_HEATMAP_CELLS as f64).sqrt() as usize;
        let cols = full_cols.min(side);
        let rows = full_rows.min(side);

        let mut cells = Vec::with_capacity(cols * rows);
        for cy in 0..rows as i32 {
            for cx in 0..cols as i32 {
                cells.push(spatial.cell_population(min_x + cx, min_y + cy));
            }
        }
        let max = cells.iter().copied().max().unwrap_or(0);
        Self {
            min_cell: (min_x, min_y),
            cols: cols as u32,
            rows: rows as u32,
            cell_size: spatial.cell_size(),
            cells,
            max,
            truncated: cols < full_cols || rows < full_rows,
        }
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|&&n| n > 0).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStateCounts {
    pub active: u32,
    /// Physics bodies that are neither sleeping nor static.
    pub awake: u32,
    pub sleeping: u32,
    pub culled: u32,
    pub statics: u32,
}

impl EntityStateCounts {
    pub fn count(reg: &Registry) -> Self {
        let mut counts = Self::default();
        for i in 0..reg.max_used_bound() as usize {
            let flags = reg.state_flags[i];
            if flags & state::ACTIVE == 0 {
                continue;
            }
            counts.active += 1;
            if flags & state::SLEEPING != 0 {
                counts.sleeping += 1;
            }
            if flags & state::CULLED != 0 {
                counts.culled += 1;
            }
            if flags & state::STATIC != 0 {
                counts.statics += 1;
            } else if flags & state::SLEEPING == 0
                && reg.has_components(i, components::PHYSICS)
            {
                counts.awake += 1;
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityStats {
    /// Active entities with non-zero velocity.
    pub moving: u32,
    pub max_speed: f32,
    pub mean_speed: f32,
    /// Sum of `m v^2 / 2` over bodies with finite mass.
    pub kinetic_energy: f32,
}

impl VelocityStats {
    pub fn measure(reg: &Registry) -> Self {
        let mut stats = Self::default();
        let mut total_speed = 0.0;
        for i in 0..reg.max_used_bound() as usize {
            if reg.state_flags[i] & state::ACTIVE == 0 {
                continue;
            }
            let speed_sq = reg.vel_x[i] * reg.vel_x[i] + reg.vel_y[i] * reg.vel_y[i];
            if speed_sq == 0.0 {
                continue;
            }
            let speed = speed_sq.sqrt();
            stats.moving += 1;
            stats.max_speed = stats.max_speed.max(speed);
            total_speed += speed;
            let inv_mass = reg.inv_mass[i];
            if inv_mass > 0.0 {
                stats.kinetic_energy += 0.5 * speed_sq / inv_mass;
            }
        }
        if stats.moving > 0 {
            stats.mean_speed = total_speed / stats.moving as f32;
        }
        stats
    }
}

/// How many active entities sit on each collision layer bit, and how many
/// share each layer/mask pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerHistogram {
    pub per_bit: [u32; 16],
    pub pairs: BTreeMap<String, u32>,
}

impl LayerHistogram {
    pub fn build(reg: &Registry) -> Self {
        let mut histogram = Self::default();
        for i in 0..reg.max_used_bound() as usize {
            let flags = reg.state_flags[i];
            if flags & state::ACTIVE == 0 {
                continue;
            }
            let layer = state::get_layer(flags);
            for (bit, count) in histogram.per_bit.iter_mut().enumerate() {
                if layer & (1 << bit) != 0 {
                    *count += 1;
                }
            }
            let key = format!("{layer:04x}/{:04x}", state::get_mask(flags));
            *histogram.pairs.entry(key).or_default() += 1;
        }
        histogram
    }
}

/// Payload for the active [`DebugMode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OverlayData {
    #[default]
    Off,
    SpatialHash(SpatialHeatmap),
    EntityState(EntityStateCounts),
    VelocityField(VelocityStats),
    CollisionLayers(LayerHistogram),
}

impl OverlayData {
    pub fn collect(mode: DebugMode, reg: &Registry, spatial: &SpatialHash, view: Aabb) -> Self {
        match mode {
            DebugMode::Off => Self::Off,
            DebugMode::SpatialHash => Self::SpatialHash(SpatialHeatmap::sample(spatial, view)),
            DebugMode::EntityState => Self::EntityState(EntityStateCounts::count(reg)),
            DebugMode::VelocityField => Self::VelocityField(VelocityStats::measure(reg)),
            DebugMode::CollisionLayers => Self::CollisionLayers(LayerHistogram::build(reg)),
        }
    }

    pub fn mode(&self) -> DebugMode {
        match self {
            Self::Off => DebugMode::Off,
            Self::SpatialHash(_) => DebugMode::SpatialHash,
            Self::EntityState(_) => DebugMode::EntityState,
            Self::VelocityField(_) => DebugMode::VelocityField,
            Self::CollisionLayers(_) => DebugMode::CollisionLayers,
        }
    }
}
