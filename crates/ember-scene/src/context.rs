//! Everything a scene hook may touch during one call.

use ember_bus::CommandBus;
use ember_ecs::Registry;
use ember_entity::{EntityApi, EntityHooks};
use ember_platform::{InputProvider, ViewportSize};
use ember_render::CameraSystem;

use crate::manager::SceneId;

/// Borrowed engine state handed to [`Scene`](crate::Scene) hooks.
///
/// Scenes read the registry directly and mutate it through [`EntityApi`] or
/// by pushing commands onto the bus.
pub struct SceneContext<'a> {
    pub reg: &'a mut Registry,
    pub bus: &'a mut CommandBus,
    pub hooks: &'a mut EntityHooks,
    pub camera: &'a mut CameraSystem,
    pub input: &'a dyn InputProvider,
    pub viewport: ViewportSize,
    requested: Option<SceneId>,
}

impl<'a> SceneContext<'a> {
    pub fn new(
        reg: &'a mut Registry,
        bus: &'a mut CommandBus,
        hooks: &'a mut EntityHooks,
        camera: &'a mut CameraSystem,
        input: &'a dyn InputProvider,
        viewport: ViewportSize,
    ) -> Self {
        Self {
            reg,
            bus,
            hooks,
            camera,
            input,
            viewport,
            requested: None,
        }
    }

    /// Entity API over this context's registry and bus.
    pub fn api(&mut self) -> EntityApi<'_> {
        EntityApi::new(self.reg, self.bus)
    }

    /// Ask for a scene switch. It is applied at the top of the next update.
    pub fn request_scene(&mut self, id: SceneId) {
        self.requested = Some(id);
    }

    pub(crate) fn take_request(&mut self) -> Option<SceneId> {
        self.requested.take()
    }
}
