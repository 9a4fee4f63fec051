//! Scene trait and the deferred-switch manager.

use tracing::{info, warn};

use crate::context::SceneContext;

pub type SceneId = u32;

/// Builds a scene for an id, or `None` when the id is unknown.
pub type SceneFactory = Box<dyn FnMut(SceneId) -> Option<Box<dyn Scene>>>;

/// A scene's lifecycle hooks. Every hook defaults to doing nothing.
pub trait Scene {
    fn name(&self) -> &str {
        "unnamed"
    }

    fn init(&mut self, _ctx: &mut SceneContext<'_>) {}

    fn update(&mut self, _ctx: &mut SceneContext<'_>, _dt: f32) {}

    fn draw(&mut self, _ctx: &mut SceneContext<'_>) {}

    fn unload(&mut self, _ctx: &mut SceneContext<'_>) {}
}

/// Owns the active scene and applies switch requests.
///
/// [`request`](Self::request) only records the target. The switch happens
/// at the top of the next [`update`](Self::update): the current scene
/// unloads, every entity hook registry is cleared, then the new scene
/// initializes.
pub struct SceneManager {
    factory: SceneFactory,
    current: Option<Box<dyn Scene>>,
    current_id: Option<SceneId>,
    pending: Option<SceneId>,
    switches: u32,
}

impl SceneManager {
    pub fn new(factory: SceneFactory) -> Self {
        Self {
            factory,
            current: None,
            current_id: None,
            pending: None,
            switches: 0,
        }
    }

    /// Schedule a switch. A later request before the next update wins.
    pub fn request(&mut self, id: SceneId) {
        self.pending = Some(id);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn current_id(&self) -> Option<SceneId> {
        self.current_id
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref().map(|scene| scene.name())
    }

    /// Completed switches since construction.
    pub fn switch_count(&self) -> u32 {
        self.switches
    }

    /// Apply a pending switch, then run the current scene's update.
    pub fn update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) {
        self.apply_pending(ctx);
        if let Some(scene) = self.current.as_mut() {
            scene.update(ctx, dt);
        }
        self.collect_request(ctx);
    }

    pub fn draw(&mut self, ctx: &mut SceneContext<'_>) {
        if let Some(scene) = self.current.as_mut() {
            scene.draw(ctx);
        }
        self.collect_request(ctx);
    }

    /// Unload the current scene and drop any pending request.
    pub fn shutdown(&mut self, ctx: &mut SceneContext<'_>) {
        self.pending = None;
        if let Some(mut scene) = self.current.take() {
            scene.unload(ctx);
            ctx.hooks.clear_all();
            info!("Scene '{}' shut down", scene.name());
        }
        self.current_id = None;
    }

    fn collect_request(&mut self, ctx: &mut SceneContext<'_>) {
        if let Some(id) = ctx.take_request() {
            self.request(id);
        }
    }

    fn apply_pending(&mut self, ctx: &mut SceneContext<'_>) {
        let Some(id) = self.pending.take() else {
            return;
        };
        let Some(mut next) = (self.factory)(id) else {
            warn!("No scene registered for id {id}; keeping the current scene");
            return;
        };

        if let Some(mut old) = self.current.take() {
            old.unload(ctx);
        }
        ctx.hooks.clear_all();

        next.init(ctx);
        // A request made during init waits for the following update.
        self.collect_request(ctx);
        info!("Switched to scene '{}' ({id})", next.name());
        self.current = Some(next);
        self.current_id = Some(id);
        self.switches += 1;
    }
}
