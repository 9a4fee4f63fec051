//! Engine: owns every subsystem and runs the per-tick phase order.
//!
//! One tick is always
//! `PlatformSync -> InputAndLogic -> Simulation -> RenderState -> Cleanup`,
//! with the simulation phase running Entity, then Physics, then Animation.
//! Commands pushed in one phase are observed by the next phase's iterator;
//! cleanup flushes everything up to a single final snapshot.

use std::time::Instant;

use ember_animation::{AnimTable, AnimationSystem};
use ember_bus::{BusPhase, CommandBus};
use ember_config::{Config, ConfigError};
use ember_debug::{DebugMode, DebugState, OverlayData};
use ember_ecs::Registry;
use ember_entity::{EntityHooks, EntitySystem};
use ember_physics::{PhysicsSettings, PhysicsSystem};
use ember_platform::{
    Atlas, HeadlessViewport, InputProvider, ScriptedInput, TextureHandle, ViewportProvider,
};
use ember_render::{
    CameraSettings, CameraSystem, DepthPreset, DrawBackend, RecordingBackend, RenderSettings,
    RenderSystem,
};
use ember_scene::{SceneContext, SceneFactory, SceneId, SceneManager};
use ember_spatial::{SpatialHash, SpatialHashConfig};
use thiserror::Error;
use tracing::{info, warn};

/// Atlas texture used by [`Providers::headless`].
pub const HEADLESS_ATLAS: TextureHandle = TextureHandle(1);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Backend surfaces the engine drives.
pub struct Providers<V, I, B> {
    pub viewport: V,
    pub input: I,
    pub backend: B,
    pub anims: AnimTable,
}

impl Providers<HeadlessViewport, ScriptedInput, RecordingBackend> {
    /// Window-less providers sized from `config.window`.
    pub fn headless(config: &Config, anims: AnimTable) -> Self {
        let window = &config.window;
        let viewport = HeadlessViewport::with_settings(
            window.width,
            window.height,
            window.virtual_height,
            window.resize_debounce_frames,
        );
        let atlas = Atlas::grid(HEADLESS_ATLAS, 16, 16, 16.0, 16.0);
        let backend = RecordingBackend::new(Box::new(atlas), viewport.get());
        Self {
            viewport,
            input: ScriptedInput::default(),
            backend,
            anims,
        }
    }
}

pub type HeadlessEngine = Engine<HeadlessViewport, ScriptedInput, RecordingBackend>;

pub struct Engine<V, I, B> {
    config: Config,
    reg: Registry,
    bus: CommandBus,
    spatial: SpatialHash,
    hooks: EntityHooks,
    entities: EntitySystem,
    physics: PhysicsSystem,
    animation: AnimationSystem,
    render: RenderSystem,
    camera: CameraSystem,
    scenes: SceneManager,
    viewport: V,
    input: I,
    backend: B,
    debug: DebugState,
}

impl<V, I, B> Engine<V, I, B>
where
    V: ViewportProvider,
    I: InputProvider,
    B: DrawBackend,
{
    /// Build every subsystem from `config`. No scene is loaded until
    /// [`request_scene`](Self::request_scene) is followed by a tick.
    pub fn new(config: Config, providers: Providers<V, I, B>) -> Result<Self, EngineError> {
        config.validate()?;
        let depth = DepthPreset::from_name(&config.render.depth_preset).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "render.depth_preset '{}' is not a known preset",
                config.render.depth_preset
            ))
        })?;

        let core = &config.core;
        let spatial = SpatialHash::new(SpatialHashConfig {
            grid_shift: config.grid_shift(),
            hash_size: config.spatial.hash_size,
            max_static: config.spatial.max_static,
            max_dynamic: config.spatial.max_dynamic,
            max_entities: core.max_entities,
        });
        let physics = PhysicsSystem::new(PhysicsSettings {
            sub_steps: config.physics.sub_steps,
            sleep_epsilon: config.physics.sleep_epsilon,
            separation_factor: config.physics.separation_factor,
            max_dt: config.physics.max_dt,
        });
        let render = RenderSystem::new(
            RenderSettings {
                max_visible: core.max_visible_entities as usize,
                depth_bias: config.render.depth_bias,
                depth_precision: config.render.depth_precision,
                depth: depth.math(),
            },
            core.max_entities,
        );
        let camera = CameraSystem::new(
            CameraSettings {
                min_zoom: config.camera.min_zoom,
                max_zoom: config.camera.max_zoom,
                cull_margin: config.camera.cull_margin,
                smooth_speed: config.camera.smooth_speed,
            },
            providers.viewport.get(),
        );

        let mode = DebugMode::from_name(&config.debug.overlay).unwrap_or_else(|| {
            warn!("Unknown debug overlay '{}', disabling", config.debug.overlay);
            DebugMode::Off
        });

        info!(
            "Engine initialized: {} entities, bus {}, grid {}, depth {:?}",
            core.max_entities, core.cmd_buffer_size, config.spatial.grid_size, depth
        );

        Ok(Self {
            reg: Registry::new(core.max_entities),
            bus: CommandBus::new(core.cmd_buffer_size),
            spatial,
            hooks: EntityHooks::new(),
            entities: EntitySystem::new(),
            physics,
            animation: AnimationSystem::new(providers.anims),
            render,
            camera,
            scenes: SceneManager::new(Box::new(|_| None)),
            viewport: providers.viewport,
            input: providers.input,
            backend: providers.backend,
            debug: DebugState {
                mode,
                ..DebugState::default()
            },
            config,
        })
    }

    /// Unload the current scene and replace the factory.
    pub fn set_scene_factory(&mut self, factory: SceneFactory) {
        self.shutdown_scene();
        self.scenes = SceneManager::new(factory);
    }

    pub fn request_scene(&mut self, id: SceneId) {
        self.scenes.request(id);
    }

    /// Run one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.platform_sync();
        self.input_and_logic(dt);
        self.simulation(dt);
        self.render_state(dt);
        self.cleanup(dt);
    }

    fn platform_sync(&mut self) {
        self.bus.set_phase(BusPhase::Open);
        self.viewport.update();
        if self.viewport.was_resized() {
            let size = self.viewport.get();
            self.camera.update_viewport_cache(size);
            self.backend.recreate_canvas(size);
        }
        self.input.update();
    }

    fn input_and_logic(&mut self, dt: f32) {
        let mut ctx = SceneContext::new(
            &mut self.reg,
            &mut self.bus,
            &mut self.hooks,
            &mut self.camera,
            &self.input,
            self.viewport.get(),
        );
        self.scenes.update(&mut ctx, dt);
    }

    fn simulation(&mut self, dt: f32) {
        self.bus.set_phase(BusPhase::Simulation);
        self.entities
            .process_commands(&mut self.reg, &mut self.bus, &mut self.hooks, &mut self.spatial);

        let started = Instant::now();
        self.physics
            .process_commands(&mut self.reg, &mut self.bus, &mut self.spatial);
        self.physics.update(&mut self.reg, &mut self.spatial, dt);
        self.debug.physics_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.animation.process_commands(&mut self.reg, &mut self.bus);
        self.animation.update(&mut self.reg, dt);
    }

    fn render_state(&mut self, dt: f32) {
        self.bus.set_phase(BusPhase::Render);
        self.camera.update(&self.reg, dt);

        self.backend.begin_frame();
        self.render.draw(
            &self.reg,
            &mut self.bus,
            &mut self.spatial,
            &self.camera,
            &mut self.backend,
        );
        let mut ctx = SceneContext::new(
            &mut self.reg,
            &mut self.bus,
            &mut self.hooks,
            &mut self.camera,
            &self.input,
            self.viewport.get(),
        );
        self.scenes.draw(&mut ctx);
        self.backend.end_frame();
    }

    fn cleanup(&mut self, dt: f32) {
        self.debug.bus_depth = self.bus.count();
        let iter = self.bus.iterator();
        self.bus.flush(&iter);
        self.bus.set_phase(BusPhase::Open);

        let stats = self.render.stats();
        self.debug.record_frame(f64::from(dt));
        self.debug.active_entities = self.reg.active_count();
        self.debug.visible_entities = stats.drawn;
        self.debug.draw_calls = stats.batches;
        self.debug.scene = self.scenes.current_name().map(str::to_owned);
    }

    /// Unload the current scene and clear the entity hooks.
    pub fn shutdown_scene(&mut self) {
        let mut ctx = SceneContext::new(
            &mut self.reg,
            &mut self.bus,
            &mut self.hooks,
            &mut self.camera,
            &self.input,
            self.viewport.get(),
        );
        self.scenes.shutdown(&mut ctx);
    }

    /// Overlay payload for the current debug mode over the camera view.
    pub fn overlay(&self) -> OverlayData {
        OverlayData::collect(
            self.debug.mode,
            &self.reg,
            &self.spatial,
            self.camera.view_bounds(),
        )
    }

    pub fn cycle_debug_mode(&mut self) {
        self.debug.cycle_mode();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn debug_state(&self) -> &DebugState {
        &self.debug
    }

    pub fn registry(&self) -> &Registry {
        &self.reg
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.reg
    }

    pub fn bus(&self) -> &CommandBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut CommandBus {
        &mut self.bus
    }

    pub fn spatial(&self) -> &SpatialHash {
        &self.spatial
    }

    pub fn hooks(&self) -> &EntityHooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut EntityHooks {
        &mut self.hooks
    }

    pub fn physics(&self) -> &PhysicsSystem {
        &self.physics
    }

    pub fn render(&self) -> &RenderSystem {
        &self.render
    }

    pub fn camera(&self) -> &CameraSystem {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraSystem {
        &mut self.camera
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
