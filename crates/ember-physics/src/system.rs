//! Command ingest, integration and the sub-step solver.

use ember_bus::{Command, CommandBus, CommandKind, PhysDef, phys_flags};
use ember_ecs::{Registry, components, state};
use ember_spatial::{Aabb, SpatialHash};
use glam::Vec2;
use tracing::{debug, warn};

use crate::collision::{circle_contact, normal_impulse, should_collide};
use crate::material::{MaterialTable, material_ids};

/// Neighbours considered per body per sub-step.
pub const NEIGHBOUR_CAPACITY: usize = 32;

/// Bits that keep a body from initiating contacts.
const NOT_AWAKE: u64 = state::SLEEPING | state::CULLED | state::STATIC;

/// Solver tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsSettings {
    /// Resolve passes per tick.
    pub sub_steps: u32,
    /// Bodies slower than this fall asleep.
    pub sleep_epsilon: f32,
    /// Share of the overlap corrected per pass (0.5 smooth, 1.0 hard snap).
    pub separation_factor: f32,
    /// Upper clamp on the tick delta.
    pub max_dt: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            sub_steps: 4,
            sleep_epsilon: 2.0,
            separation_factor: 0.5,
            max_dt: 0.05,
        }
    }
}

/// Counters from the most recent [`PhysicsSystem::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicsStats {
    pub awake: u32,
    pub sleeping: u32,
    /// Resolved (non-sensor) contacts across all sub-steps.
    pub contacts: u32,
    pub sensor_overlaps: u32,
}

/// Owner of the PHYS command domain and the dynamic spatial layer.
#[derive(Debug, Default)]
pub struct PhysicsSystem {
    settings: PhysicsSettings,
    materials: MaterialTable,
    stats: PhysicsStats,
}

impl PhysicsSystem {
    pub fn new(settings: PhysicsSettings) -> Self {
        Self {
            settings,
            materials: MaterialTable::new(),
            stats: PhysicsStats::default(),
        }
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialTable {
        &mut self.materials
    }

    pub fn stats(&self) -> PhysicsStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Command ingest
    // -----------------------------------------------------------------------

    /// Apply every PHYS command in the current snapshot.
    pub fn process_commands(
        &mut self,
        reg: &mut Registry,
        bus: &mut CommandBus,
        spatial: &mut SpatialHash,
    ) {
        let mut iter = bus.iterator();
        while let Some(cmd) = bus.next(&mut iter) {
            apply(reg, spatial, cmd);
        }
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Integrate, rebuild the dynamic layer, then run the resolve passes.
    pub fn update(&mut self, reg: &mut Registry, spatial: &mut SpatialHash, dt: f32) {
        let dt = dt.clamp(0.0, self.settings.max_dt);
        self.stats = PhysicsStats::default();
        spatial.clear_dynamic();

        let bound = reg.max_used_bound() as usize;
        self.integrate(reg, spatial, bound, dt);

        let steps = self.settings.sub_steps.max(1);
        let push_scale = self.settings.separation_factor / steps as f32;
        let mut neighbours = [0u32; NEIGHBOUR_CAPACITY];

        for _ in 0..steps {
            for i in 0..bound {
                let flags_i = reg.state_flags[i];
                if flags_i & state::ACTIVE == 0 || flags_i & NOT_AWAKE != 0 || !is_body(reg, i) {
                    continue;
                }
                let count = spatial.query(body_aabb(reg, i), &mut neighbours);
                for &other in &neighbours[..count] {
                    let j = other as usize;
                    if j == i {
                        continue;
                    }
                    let flags_j = reg.state_flags[j];
                    if flags_j & state::ACTIVE == 0 || !is_body(reg, j) {
                        continue;
                    }
                    // Lower awake ids already resolved this pair.
                    if j < i && flags_j & NOT_AWAKE == 0 {
                        continue;
                    }
                    if !should_collide(flags_i, flags_j) {
                        continue;
                    }
                    self.resolve_pair(reg, i, j, push_scale);
                }
            }
        }
    }

    fn integrate(&mut self, reg: &mut Registry, spatial: &mut SpatialHash, bound: usize, dt: f32) {
        let sleep_sq = self.settings.sleep_epsilon * self.settings.sleep_epsilon;
        for i in 0..bound {
            let flags = reg.state_flags[i];
            if flags & state::ACTIVE == 0
                || flags & state::CULLED != 0
                || !reg.has_components(i, components::PHYSICS)
            {
                continue;
            }
            // Static bodies never integrate but stay visible to queries.
            if flags & state::STATIC != 0 {
                spatial.add_dynamic(i as u32, body_aabb(reg, i));
                continue;
            }

            let vel = reg.velocity(i);
            let asleep = vel.length_squared() < sleep_sq && flags & state::ALWAYS_AWAKE == 0;
            if asleep {
                reg.state_flags[i] |= state::SLEEPING;
                self.stats.sleeping += 1;
            } else {
                reg.state_flags[i] &= !state::SLEEPING;
                self.stats.awake += 1;
                let vel = vel / (1.0 + reg.drag[i] * dt);
                reg.vel_x[i] = vel.x;
                reg.vel_y[i] = vel.y;
                reg.pos_x[i] += vel.x * dt;
                reg.pos_y[i] += vel.y * dt;
            }

            spatial.add_dynamic(i as u32, body_aabb(reg, i));
        }
    }

    fn resolve_pair(&mut self, reg: &mut Registry, i: usize, j: usize, push_scale: f32) {
        let Some(contact) = circle_contact(
            centre(reg, i),
            reg.size_w[i] * 0.5,
            centre(reg, j),
            reg.size_w[j] * 0.5,
        ) else {
            return;
        };

        let (flags_i, flags_j) = (reg.state_flags[i], reg.state_flags[j]);
        if (flags_i | flags_j) & state::SENSOR != 0 {
            self.stats.sensor_overlaps += 1;
            return;
        }
        self.stats.contacts += 1;

        let inv_i = inv_mass(flags_i);
        let inv_j = inv_mass(flags_j);
        let push = contact.normal * (contact.overlap * push_scale);
        if inv_i > 0.0 {
            reg.pos_x[i] += push.x;
            reg.pos_y[i] += push.y;
        }
        if inv_j > 0.0 {
            reg.pos_x[j] -= push.x;
            reg.pos_y[j] -= push.y;
        }

        let bouncy = reg.material_id[i] == material_ids::BOUNCY
            || reg.material_id[j] == material_ids::BOUNCY;
        if bouncy {
            let e = self
                .materials
                .combined_restitution(reg.material_id[i], reg.material_id[j]);
            let relative = reg.velocity(i) - reg.velocity(j);
            if let Some(impulse) = normal_impulse(relative, contact.normal, e, inv_i + inv_j) {
                let dv = contact.normal * impulse;
                reg.vel_x[i] += dv.x * inv_i;
                reg.vel_y[i] += dv.y * inv_i;
                reg.vel_x[j] -= dv.x * inv_j;
                reg.vel_y[j] -= dv.y * inv_j;
            }
        }

        reg.state_flags[i] &= !state::SLEEPING;
        reg.state_flags[j] &= !state::SLEEPING;
    }
}

fn apply(reg: &mut Registry, spatial: &mut SpatialHash, cmd: &Command) {
    let entity = cmd.entity;
    match cmd.kind {
        CommandKind::PhysLoadStatic => load_static(reg, spatial),
        CommandKind::PhysReset => spatial.clear_all(),
        CommandKind::PhysMove(pos) if reg.is_alive(entity) => {
            let i = entity.index();
            let rehash = reg.state_flags[i] & state::STATIC != 0
                && spatial.remove_static(entity.id, body_aabb(reg, i)) > 0;
            reg.pos_x[i] = pos.x;
            reg.pos_y[i] = pos.y;
            reg.state_flags[i] &= !state::SLEEPING;
            if rehash && !spatial.add_static(entity.id, body_aabb(reg, i)) {
                warn!("Static body {entity} dropped from the spatial hash after a move");
            }
        }
        CommandKind::PhysSetVelocity(vel) if reg.is_alive(entity) => {
            let i = entity.index();
            reg.vel_x[i] = vel.x;
            reg.vel_y[i] = vel.y;
            reg.state_flags[i] &= !state::SLEEPING;
        }
        CommandKind::PhysDefine(def) if reg.is_alive(entity) => define(reg, entity.index(), def),
        _ => {}
    }
}

fn define(reg: &mut Registry, i: usize, def: PhysDef) {
    reg.material_id[i] = def.material_id;
    reg.drag[i] = def.drag.max(0.0);
    reg.component_masks[i] |= components::PHYSICS;

    if def.flags & phys_flags::STATIC != 0 {
        reg.state_flags[i] |= state::STATIC;
        reg.inv_mass[i] = 0.0;
        reg.vel_x[i] = 0.0;
        reg.vel_y[i] = 0.0;
    }
    if def.flags & phys_flags::SENSOR != 0 {
        reg.state_flags[i] |= state::SENSOR;
    }
    if def.flags & phys_flags::BULLET != 0 {
        reg.state_flags[i] |= state::BULLET;
    }
}

/// Rebuild the static layer from every live STATIC+PHYSICS body.
fn load_static(reg: &Registry, spatial: &mut SpatialHash) {
    spatial.clear_static();
    let mut loaded = 0u32;
    for i in reg.active_ids() {
        if reg.state_flags[i] & state::STATIC != 0
            && reg.has_components(i, components::PHYSICS)
            && spatial.add_static(i as u32, body_aabb(reg, i))
        {
            loaded += 1;
        }
    }
    debug!("Loaded {loaded} static bodies into the spatial hash");
}

#[inline]
fn is_body(reg: &Registry, i: usize) -> bool {
    reg.has_components(i, components::PHYSICS)
        && reg.component_masks[i] & (components::COLLISION_CIRCLE | components::COLLISION_AABB) != 0
}

/// Unit mass for movable bodies, zero for static ones.
#[inline]
fn inv_mass(flags: u64) -> f32 {
    if flags & state::STATIC != 0 { 0.0 } else { 1.0 }
}

/// Geometric centre, independent of the pivot.
#[inline]
fn centre(reg: &Registry, i: usize) -> Vec2 {
    Vec2::new(
        reg.pos_x[i] + reg.size_w[i] * (0.5 - reg.pivot_x[i]),
        reg.pos_y[i] + reg.size_h[i] * (0.5 - reg.pivot_y[i]),
    )
}

/// Spatial-hash box of slot `i`.
#[inline]
pub(crate) fn body_aabb(reg: &Registry, i: usize) -> Aabb {
    Aabb::from_pivot(
        reg.pos_x[i],
        reg.pos_y[i],
        reg.size_w[i],
        reg.size_h[i],
        reg.pivot_x[i],
        reg.pivot_y[i],
    )
}
