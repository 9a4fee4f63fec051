//! Cull, sort and dispatch.

use ember_bus::{CommandBus, CommandKind};
use ember_ecs::{Registry, components, state};
use ember_spatial::{Aabb, SpatialHash};
use glam::Vec2;
use tracing::{debug, warn};

use crate::backend::{DrawBackend, SpriteDraw};
use crate::batch::BatchTable;
use crate::camera::CameraSystem;
use crate::sort_key::{
    DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_PRECISION, DepthMath, DepthMathError, ID_MASK,
    quantize_depth,
};

/// Upper bound on entities returned by one culling query.
pub const MAX_VISIBLE_ENTITIES: usize = 5_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub max_visible: usize,
    pub depth_bias: f32,
    pub depth_precision: f32,
    /// Initial depth configuration.
    pub depth: DepthMath,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_visible: MAX_VISIBLE_ENTITIES,
            depth_bias: DEFAULT_DEPTH_BIAS,
            depth_precision: DEFAULT_DEPTH_PRECISION,
            depth: DepthMath::FLAT,
        }
    }
}

/// Counters from the most recent [`RenderSystem::draw_entities`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Ids returned by the culling query.
    pub candidates: u32,
    pub drawn: u32,
    /// Backend state switches.
    pub batches: u32,
}

/// Owner of the RENDER command domain.
pub struct RenderSystem {
    settings: RenderSettings,
    depth: DepthMath,
    batches: BatchTable,
    visible: Vec<u32>,
    keys: Vec<u64>,
    /// Generation of the incarnation each slot was synced as a decoration.
    synced: Vec<Option<u32>>,
    synced_epoch: u32,
    decorations: u32,
    stats: RenderStats,
}

impl RenderSystem {
    /// `max_entities` must match the registry capacity.
    pub fn new(settings: RenderSettings, max_entities: u32) -> Self {
        let depth = match settings.depth.validate() {
            Ok(()) => settings.depth,
            Err(err) => {
                warn!("Rejected initial depth math: {err}; using flat sorting");
                DepthMath::FLAT
            }
        };
        let max_visible = settings.max_visible.max(1);
        Self {
            settings,
            depth,
            batches: BatchTable::new(),
            visible: vec![0; max_visible],
            keys: Vec::with_capacity(max_visible),
            synced: vec![None; max_entities as usize],
            synced_epoch: 0,
            decorations: 0,
            stats: RenderStats::default(),
        }
    }

    pub fn depth_math(&self) -> DepthMath {
        self.depth
    }

    /// Replace the depth configuration. An invalid one leaves the current
    /// configuration in place.
    pub fn set_depth_math(&mut self, math: DepthMath) -> Result<(), DepthMathError> {
        math.validate()?;
        self.depth = math;
        Ok(())
    }

    pub fn batches(&self) -> &BatchTable {
        &self.batches
    }

    pub fn batches_mut(&mut self) -> &mut BatchTable {
        &mut self.batches
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Entities inserted into the static layer as decorations and still tracked.
    pub fn decoration_count(&self) -> u32 {
        self.decorations
    }

    /// Apply every RENDER command in the current snapshot.
    pub fn process_commands(&mut self, bus: &mut CommandBus) {
        let mut iter = bus.iterator();
        while let Some(cmd) = bus.next(&mut iter) {
            if let CommandKind::RenderSetDepthMath(depth) = cmd.kind
                && let Err(err) = self.set_depth_math(DepthMath::from(depth))
            {
                warn!("Ignoring depth math command: {err}");
            }
        }
    }

    /// Insert ACTIVE+STATIC sprites without PHYSICS into the static layer,
    /// once per entity incarnation.
    pub fn sync_decorations(&mut self, reg: &Registry, spatial: &mut SpatialHash) {
        if spatial.static_epoch() != self.synced_epoch {
            self.synced.fill(None);
            self.synced_epoch = spatial.static_epoch();
            self.decorations = 0;
        }

        let bound = (reg.max_used_bound() as usize).min(self.synced.len());
        let mut added = 0u32;
        for i in 0..bound {
            let flags = reg.state_flags[i];
            if flags & (state::ACTIVE | state::STATIC) != state::ACTIVE | state::STATIC
                || !reg.has_components(i, components::SPRITE)
                || reg.has_components(i, components::PHYSICS)
            {
                continue;
            }
            let generation = reg.generation(i as u32);
            if self.synced[i] == Some(generation) {
                continue;
            }
            let aabb = Aabb::from_pivot(
                reg.pos_x[i],
                reg.pos_y[i],
                reg.size_w[i],
                reg.size_h[i],
                reg.pivot_x[i],
                reg.pivot_y[i],
            );
            if spatial.add_static(i as u32, aabb) {
                self.synced[i] = Some(generation);
                added += 1;
            }
        }
        if added > 0 {
            self.decorations += added;
            debug!("Synced {added} decorations into the static layer");
        }
    }

    /// Cull against `cull`, sort by key and submit sprites to `backend`.
    pub fn draw_entities(
        &mut self,
        reg: &Registry,
        spatial: &mut SpatialHash,
        cull: Aabb,
        backend: &mut dyn DrawBackend,
    ) {
        self.stats = RenderStats::default();
        let count = spatial.query(cull, &mut self.visible);
        self.stats.candidates = count as u32;

        self.keys.clear();
        for &id in &self.visible[..count] {
            let i = id as usize;
            if id >= reg.capacity() || u64::from(id) > ID_MASK {
                continue;
            }
            if reg.state_flags[i] & (state::ACTIVE | state::VISIBLE) != state::ACTIVE | state::VISIBLE
            {
                continue;
            }
            let raw = self.depth.raw_depth(reg.position(i), reg.size_h[i]);
            let depth = quantize_depth(raw, self.settings.depth_bias, self.settings.depth_precision);
            self.keys
                .push(self.depth.pack(reg.render_layer[i], reg.batch_ids[i], depth, id));
        }
        self.keys.sort_unstable();

        let mut last_batch = None;
        for &key in &self.keys {
            let fields = self.depth.unpack(key);
            if last_batch != Some(fields.batch) {
                backend.set_state(&self.batches.get(fields.batch));
                last_batch = Some(fields.batch);
                self.stats.batches += 1;
            }
            let i = fields.id as usize;
            backend.draw_sprite(&SpriteDraw {
                sprite_id: reg.sprite_ids[i],
                position: reg.position(i),
                size: reg.size(i),
                pivot: Vec2::new(reg.pivot_x[i], reg.pivot_y[i]),
                rotation: reg.rotation[i],
                flip_x: false,
                flip_y: false,
                tint: reg.colors[i],
            });
        }
        self.stats.drawn = self.keys.len() as u32;
        backend.end_batch();
    }

    /// Full world pass: commands, decoration sync, then a culled draw inside
    /// the camera's world mode.
    pub fn draw(
        &mut self,
        reg: &Registry,
        bus: &mut CommandBus,
        spatial: &mut SpatialHash,
        camera: &CameraSystem,
        backend: &mut dyn DrawBackend,
    ) {
        self.process_commands(bus);
        self.sync_decorations(reg, spatial);
        backend.begin_world(&camera.internal());
        self.draw_entities(reg, spatial, camera.cull_bounds(), backend);
        backend.end_world();
    }
}
