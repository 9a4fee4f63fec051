//! Bounded registries of clone/spawn/destroy callbacks.

use ember_bus::CommandBus;
use ember_ecs::{EntityHandle, Registry};

/// Slots per hook registry.
pub const MAX_HOOKS: usize = 8;

/// Called after a clone lands: `(registry, bus, prototype, new_entity)`.
pub type CloneHook = fn(&mut Registry, &mut CommandBus, EntityHandle, EntityHandle);
/// Called after a tracked spawn lands: `(registry, bus, spawned)`.
pub type SpawnHook = fn(&mut Registry, &mut CommandBus, EntityHandle);
/// Called before a destroy is applied: `(registry, bus, doomed)`.
pub type DestroyHook = fn(&mut Registry, &mut CommandBus, EntityHandle);

/// Fixed-capacity, registration-ordered callback list.
#[derive(Debug, Clone)]
pub struct HookList<F> {
    hooks: Vec<F>,
}

impl<F> Default for HookList<F> {
    fn default() -> Self {
        Self {
            hooks: Vec::with_capacity(MAX_HOOKS),
        }
    }
}

impl<F: Copy + PartialEq> HookList<F> {
    /// Append a callback. Duplicates and a full list are rejected.
    fn add(&mut self, hook: F) -> bool {
        if self.hooks.contains(&hook) || self.hooks.len() >= MAX_HOOKS {
            return false;
        }
        self.hooks.push(hook);
        true
    }

    /// Remove a callback, keeping the order of the rest.
    fn remove(&mut self, hook: F) -> bool {
        match self.hooks.iter().position(|h| *h == hook) {
            Some(pos) => {
                self.hooks.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Copy of the current list, so callbacks may run while `self` is borrowed elsewhere.
    fn snapshot(&self) -> ([Option<F>; MAX_HOOKS], usize) {
        let mut out = [None; MAX_HOOKS];
        for (slot, hook) in out.iter_mut().zip(&self.hooks) {
            *slot = Some(*hook);
        }
        (out, self.hooks.len())
    }
}

/// The three hook registries plus the dispatch-in-progress flag.
#[derive(Debug, Clone, Default)]
pub struct EntityHooks {
    clone: HookList<CloneHook>,
    spawn: HookList<SpawnHook>,
    destroy: HookList<DestroyHook>,
    dispatching: bool,
}

impl EntityHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a dispatch is running. Subscriptions are refused meanwhile.
    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    pub fn subscribe_clone(&mut self, hook: CloneHook) -> bool {
        !self.dispatching && self.clone.add(hook)
    }

    pub fn unsubscribe_clone(&mut self, hook: CloneHook) -> bool {
        !self.dispatching && self.clone.remove(hook)
    }

    pub fn subscribe_spawn(&mut self, hook: SpawnHook) -> bool {
        !self.dispatching && self.spawn.add(hook)
    }

    pub fn unsubscribe_spawn(&mut self, hook: SpawnHook) -> bool {
        !self.dispatching && self.spawn.remove(hook)
    }

    pub fn subscribe_destroy(&mut self, hook: DestroyHook) -> bool {
        !self.dispatching && self.destroy.add(hook)
    }

    pub fn unsubscribe_destroy(&mut self, hook: DestroyHook) -> bool {
        !self.dispatching && self.destroy.remove(hook)
    }

    pub fn clone_hooks(&self) -> &HookList<CloneHook> {
        &self.clone
    }

    pub fn spawn_hooks(&self) -> &HookList<SpawnHook> {
        &self.spawn
    }

    pub fn destroy_hooks(&self) -> &HookList<DestroyHook> {
        &self.destroy
    }

    /// Drop every registration (scene switch).
    pub fn clear_all(&mut self) {
        self.clone.hooks.clear();
        self.spawn.hooks.clear();
        self.destroy.hooks.clear();
        self.dispatching = false;
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Run `f` with the dispatch flag set and ENTITY commands locked out of
    /// the bus. The previous lock is restored afterwards.
    fn guarded(&mut self, bus: &mut CommandBus, f: impl FnOnce(&mut CommandBus)) {
        let previous = bus.forbidden_domain();
        self.dispatching = true;
        bus.set_forbidden_domain(Some(ember_bus::Domain::Entity));
        f(bus);
        bus.set_forbidden_domain(previous);
        self.dispatching = false;
    }

    pub(crate) fn dispatch_clone(
        &mut self,
        reg: &mut Registry,
        bus: &mut CommandBus,
        prototype: EntityHandle,
        entity: EntityHandle,
    ) {
        if self.clone.is_empty() {
            return;
        }
        let (hooks, n) = self.clone.snapshot();
        self.guarded(bus, |bus| {
            for hook in hooks[..n].iter().flatten() {
                hook(reg, bus, prototype, entity);
            }
        });
    }

    pub(crate) fn dispatch_spawn(
        &mut self,
        reg: &mut Registry,
        bus: &mut CommandBus,
        entity: EntityHandle,
    ) {
        if self.spawn.is_empty() {
            return;
        }
        let (hooks, n) = self.spawn.snapshot();
        self.guarded(bus, |bus| {
            for hook in hooks[..n].iter().flatten() {
                hook(reg, bus, entity);
            }
        });
    }

    pub(crate) fn dispatch_destroy(
        &mut self,
        reg: &mut Registry,
        bus: &mut CommandBus,
        entity: EntityHandle,
    ) {
        if self.destroy.is_empty() {
            return;
        }
        let (hooks, n) = self.destroy.snapshot();
        self.guarded(bus, |bus| {
            for hook in hooks[..n].iter().flatten() {
                hook(reg, bus, entity);
            }
        });
    }
}
