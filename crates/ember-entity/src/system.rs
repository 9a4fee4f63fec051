//! ENTITY-domain consumer.

use ember_bus::{Command, CommandBus, CommandKind, Domain, EntityClone};
use ember_ecs::{EntityHandle, Registry, state};
use ember_spatial::{Aabb, SpatialHash};
use tracing::debug;

use crate::hooks::EntityHooks;

/// Counters for the most recent drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityStats {
    /// Commands that changed the registry.
    pub applied: u32,
    /// Commands dropped because their handle was stale.
    pub stale: u32,
}

/// Applies queued lifecycle and field mutations and fires entity hooks.
#[derive(Debug, Default)]
pub struct EntitySystem {
    stats: EntityStats,
}

/// Which hook registry a landed copy notifies.
#[derive(Clone, Copy)]
enum CopyHooks {
    Spawn,
    Clone,
    None,
}

impl EntitySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> EntityStats {
        self.stats
    }

    /// Drain every ENTITY command in the current snapshot, in push order.
    ///
    /// Hooks may push commands of other domains; those land after the
    /// snapshot end and are seen by later phases.
    pub fn process_commands(
        &mut self,
        reg: &mut Registry,
        bus: &mut CommandBus,
        hooks: &mut EntityHooks,
        spatial: &mut SpatialHash,
    ) {
        self.stats = EntityStats::default();
        let mut iter = bus.iterator();
        while let Some(cmd) = bus.next(&mut iter).copied() {
            if cmd.domain() != Domain::Entity {
                continue;
            }
            if apply(reg, bus, hooks, spatial, cmd) {
                self.stats.applied += 1;
            } else {
                self.stats.stale += 1;
            }
        }
    }
}

fn apply(
    reg: &mut Registry,
    bus: &mut CommandBus,
    hooks: &mut EntityHooks,
    spatial: &mut SpatialHash,
    cmd: Command,
) -> bool {
    let entity = cmd.entity;
    match cmd.kind {
        CommandKind::EntitySpawn(clone) => copy(reg, bus, hooks, entity, clone, CopyHooks::Spawn),
        CommandKind::EntitySpawnUntracked(c) => copy(reg, bus, hooks, entity, c, CopyHooks::None),
        CommandKind::EntityClone(clone) => copy(reg, bus, hooks, entity, clone, CopyHooks::Clone),
        CommandKind::EntityDestroy => destroy(reg, bus, hooks, spatial, entity),
        CommandKind::EntityReset => {
            reg.reset();
            spatial.clear_all();
            debug!("Entity reset: registry and spatial layers cleared");
            true
        }
        kind => {
            if !reg.is_alive(entity) {
                debug!("Dropping {:#06x} for stale entity {entity}", kind.code());
                return false;
            }
            let i = entity.index();
            match kind {
                CommandKind::EntityAddComponent(bits) => reg.component_masks[i] |= bits,
                CommandKind::EntityRemoveComponent(bits) => reg.component_masks[i] &= !bits,
                CommandKind::EntitySetPivot(pivot) => {
                    reg.pivot_x[i] = pivot.x;
                    reg.pivot_y[i] = pivot.y;
                }
                CommandKind::EntitySetType(t) => reg.types[i] = t,
                // ACTIVE is lifecycle-owned; neither flag command may touch it.
                CommandKind::EntitySetFlags(bits) => reg.state_flags[i] |= bits & !state::ACTIVE,
                CommandKind::EntityClearFlags(bits) => {
                    reg.state_flags[i] &= !(bits & !state::ACTIVE)
                }
                _ => return false,
            }
            true
        }
    }
}

fn copy(
    reg: &mut Registry,
    bus: &mut CommandBus,
    hooks: &mut EntityHooks,
    dst: EntityHandle,
    clone: EntityClone,
    notify: CopyHooks,
) -> bool {
    if !reg.clone_into(dst, clone.prototype, clone.position) {
        debug!("Clone of {} into {dst} rejected", clone.prototype);
        return false;
    }
    match notify {
        CopyHooks::Spawn => hooks.dispatch_spawn(reg, bus, dst),
        CopyHooks::Clone => hooks.dispatch_clone(reg, bus, clone.prototype, dst),
        CopyHooks::None => {}
    }
    true
}

fn destroy(
    reg: &mut Registry,
    bus: &mut CommandBus,
    hooks: &mut EntityHooks,
    spatial: &mut SpatialHash,
    entity: EntityHandle,
) -> bool {
    if !reg.is_alive(entity) {
        return false;
    }
    hooks.dispatch_destroy(reg, bus, entity);
    if !reg.is_alive(entity) {
        return false;
    }

    let i = entity.index();
    if reg.state_flags[i] & state::STATIC != 0 {
        let aabb = Aabb::from_pivot(
            reg.pos_x[i],
            reg.pos_y[i],
            reg.size_w[i],
            reg.size_h[i],
            reg.pivot_x[i],
            reg.pivot_y[i],
        );
        spatial.remove_static(entity.id, aabb);
    }
    reg.destroy(entity)
}
