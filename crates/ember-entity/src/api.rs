//! Game-facing entity mutation API.
//!
//! Spawns and clones reserve their destination slot synchronously so the
//! caller gets a handle immediately; the copy itself happens when
//! [`EntitySystem`](crate::EntitySystem) drains the ENTITY domain.

use ember_bus::{Command, CommandBus, CommandKind, EntityClone};
use ember_ecs::{EntityHandle, Registry};
use glam::Vec2;

/// Borrowed view over the registry and bus used by scene code.
pub struct EntityApi<'a> {
    reg: &'a mut Registry,
    bus: &'a mut CommandBus,
}

impl<'a> EntityApi<'a> {
    pub fn new(reg: &'a mut Registry, bus: &'a mut CommandBus) -> Self {
        Self { reg, bus }
    }

    pub fn registry(&self) -> &Registry {
        self.reg
    }

    /// Reserve a slot without activating it.
    pub fn reserve_id(&mut self) -> EntityHandle {
        self.reg.reserve_slot()
    }

    /// Clone `prototype` at `position` and fire spawn hooks once it lands.
    pub fn spawn(&mut self, prototype: EntityHandle, position: Vec2) -> EntityHandle {
        self.deferred_copy(prototype, position, CommandKind::EntitySpawn)
    }

    /// Clone `prototype` at `position` without firing any hooks.
    pub fn spawn_untracked(&mut self, prototype: EntityHandle, position: Vec2) -> EntityHandle {
        self.deferred_copy(prototype, position, CommandKind::EntitySpawnUntracked)
    }

    /// Clone `prototype` at `position` and fire clone hooks once it lands.
    pub fn clone_entity(&mut self, prototype: EntityHandle, position: Vec2) -> EntityHandle {
        self.deferred_copy(prototype, position, CommandKind::EntityClone)
    }

    fn deferred_copy(
        &mut self,
        prototype: EntityHandle,
        position: Vec2,
        kind: fn(EntityClone) -> CommandKind,
    ) -> EntityHandle {
        let dst = self.reg.reserve_slot();
        if !dst.is_valid() {
            return EntityHandle::INVALID;
        }
        let cmd = Command::new(dst, kind(EntityClone { prototype, position }));
        if !self.bus.push(cmd) {
            self.reg.return_reserved(dst);
            return EntityHandle::INVALID;
        }
        dst
    }

    pub fn destroy(&mut self, entity: EntityHandle) -> bool {
        self.bus.push(Command::new(entity, CommandKind::EntityDestroy))
    }

    /// OR `flags` into the entity's state flags.
    pub fn set_flags(&mut self, entity: EntityHandle, flags: u64) -> bool {
        self.bus
            .push(Command::new(entity, CommandKind::EntitySetFlags(flags)))
    }

    /// Clear `flags` from the entity's state flags.
    pub fn clear_flags(&mut self, entity: EntityHandle, flags: u64) -> bool {
        self.bus
            .push(Command::new(entity, CommandKind::EntityClearFlags(flags)))
    }

    pub fn set_type(&mut self, entity: EntityHandle, entity_type: u16) -> bool {
        self.bus
            .push(Command::new(entity, CommandKind::EntitySetType(entity_type)))
    }

    pub fn set_pivot(&mut self, entity: EntityHandle, pivot: Vec2) -> bool {
        self.bus
            .push(Command::new(entity, CommandKind::EntitySetPivot(pivot)))
    }

    pub fn add_component(&mut self, entity: EntityHandle, components: u64) -> bool {
        self.bus
            .push(Command::new(entity, CommandKind::EntityAddComponent(components)))
    }

    pub fn remove_component(&mut self, entity: EntityHandle, components: u64) -> bool {
        self.bus.push(Command::new(
            entity,
            CommandKind::EntityRemoveComponent(components),
        ))
    }

    /// Queue a wipe of every entity (and the static spatial layer).
    pub fn reset_all(&mut self) -> bool {
        self.bus.push(Command::global(CommandKind::EntityReset))
    }
}
