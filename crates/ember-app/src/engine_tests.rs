use std::cell::Cell;
use std::rc::Rc;

use ember_bus::{Command, CommandKind};
use ember_config::{Config, ConfigError};
use ember_debug::{DebugMode, OverlayData};
use ember_ecs::{EntityHandle, components, state};
use ember_platform::Key;
use ember_render::{CameraMode, DepthMath};
use ember_scene::{Scene, SceneContext};
use glam::Vec2;

use crate::demo::{self, PLAYER_START, SPAWN_PER_TICK, SWARM_SIZE, entity_types, scene_ids};
use crate::{Engine, EngineError, HeadlessEngine, Providers};

const DT: f32 = 1.0 / 60.0;

fn test_config() -> Config {
    let mut config = Config::default();
    config.core.max_entities = 1024;
    config.core.cmd_buffer_size = 1024;
    config.core.max_visible_entities = 1024;
    config.spatial.max_static = 2048;
    config.spatial.max_dynamic = 8192;
    config.window.resize_debounce_frames = 2;
    config
}

fn build(config: Config) -> Result<HeadlessEngine, EngineError> {
    let providers = Providers::headless(&config, demo::anim_table());
    Engine::new(config, providers)
}

fn engine() -> HeadlessEngine {
    build(test_config()).unwrap()
}

fn demo_engine() -> HeadlessEngine {
    let mut engine = engine();
    engine.set_scene_factory(demo::factory());
    engine.request_scene(scene_ids::MENU);
    engine.tick(DT);
    engine
}

fn press_once(engine: &mut HeadlessEngine, key: Key) {
    engine.input_mut().press(key);
    engine.tick(DT);
    engine.input_mut().release(key);
}

/// Menu, Enter, then the tick that loads the arena.
fn arena_engine() -> HeadlessEngine {
    let mut engine = demo_engine();
    press_once(&mut engine, Key::Enter);
    engine.tick(DT);
    assert_eq!(engine.scenes().current_id(), Some(scene_ids::ARENA));
    engine
}

fn find_player(engine: &HeadlessEngine) -> usize {
    let reg = engine.registry();
    (0..reg.max_used_bound() as usize)
        .find(|&i| reg.state_flags[i] & state::ACTIVE != 0 && reg.types[i] == entity_types::PLAYER)
        .unwrap()
}

fn visible_enemies(engine: &HeadlessEngine) -> usize {
    let reg = engine.registry();
    (0..reg.max_used_bound() as usize)
        .filter(|&i| {
            reg.types[i] == entity_types::ENEMY
                && reg.state_flags[i] & (state::ACTIVE | state::VISIBLE)
                    == state::ACTIVE | state::VISIBLE
        })
        .count()
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn test_engine_builds_from_default_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_or_create(dir.path()).unwrap();
    let engine = build(config).unwrap();
    assert_eq!(engine.registry().capacity(), 10_000);
    assert!(dir.path().join("config.ron").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = test_config();
    config.core.cmd_buffer_size = 1000;
    assert!(matches!(
        build(config),
        Err(EngineError::Config(ConfigError::Invalid(_)))
    ));
}

#[test]
fn test_unknown_depth_preset_is_rejected() {
    let mut config = test_config();
    config.render.depth_preset = "diagonal".to_string();
    assert!(build(config).is_err());
}

#[test]
fn test_depth_preset_from_config() {
    let mut config = test_config();
    config.render.depth_preset = "y_bottom".to_string();
    let engine = build(config).unwrap();
    assert_eq!(engine.render().depth_math(), DepthMath::Y_BOTTOM);
}

#[test]
fn test_two_engines_are_independent() {
    let mut a = arena_engine();
    let b = engine();
    a.tick(DT);
    assert!(a.registry().active_count() > 0);
    assert_eq!(b.registry().active_count(), 0);
    assert_eq!(b.debug_state().frame_count, 0);
}

// ---------------------------------------------------------------------------
// Phase order
// ---------------------------------------------------------------------------

struct RecordingScene {
    entity: EntityHandle,
    phys_in_draw: Rc<Cell<Option<bool>>>,
    render_in_draw: Rc<Cell<Option<bool>>>,
}

impl Scene for RecordingScene {
    fn init(&mut self, ctx: &mut SceneContext<'_>) {
        self.entity = ctx.reg.create(
            1,
            Vec2::ZERO,
            components::PHYSICS | components::SPRITE,
            state::VISIBLE,
        );
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) {
        ctx.api().set_flags(self.entity, state::SOLID);
        ctx.bus.push(Command::new(
            self.entity,
            CommandKind::PhysMove(Vec2::new(40.0, 0.0)),
        ));
    }

    fn draw(&mut self, ctx: &mut SceneContext<'_>) {
        let phys = ctx.bus.push(Command::new(
            self.entity,
            CommandKind::PhysMove(Vec2::ZERO),
        ));
        let render = ctx.bus.push(Command::global(CommandKind::RenderSetDepthMath(
            DepthMath::Y_ORIGIN.to_command(),
        )));
        self.phys_in_draw.set(Some(phys));
        self.render_in_draw.set(Some(render));
    }
}

#[test]
fn test_logic_commands_land_in_the_same_tick() {
    let phys_in_draw = Rc::new(Cell::new(None));
    let render_in_draw = Rc::new(Cell::new(None));
    let mut engine = engine();
    let (p, r) = (Rc::clone(&phys_in_draw), Rc::clone(&render_in_draw));
    engine.set_scene_factory(Box::new(move |_| {
        Some(Box::new(RecordingScene {
            entity: EntityHandle::INVALID,
            phys_in_draw: Rc::clone(&p),
            render_in_draw: Rc::clone(&r),
        }) as Box<dyn Scene>)
    }));
    engine.request_scene(0);
    engine.tick(DT);

    let reg = engine.registry();
    assert_ne!(reg.state_flags[0] & state::SOLID, 0);
    assert_eq!(reg.pos_x[0], 40.0);
    assert!(engine.bus().is_empty());

    assert_eq!(phys_in_draw.get(), Some(false));
    assert_eq!(render_in_draw.get(), Some(true));
}

struct StaleHandleScene {
    accepted: Rc<Cell<bool>>,
}

impl Scene for StaleHandleScene {
    fn init(&mut self, ctx: &mut SceneContext<'_>) {
        let e = ctx.reg.create(1, Vec2::ZERO, components::SPRITE, 0);
        ctx.reg.destroy(e);
        self.accepted.set(ctx.api().set_flags(e, state::VISIBLE));
    }
}

#[test]
fn test_stale_handle_command_is_a_noop() {
    let accepted = Rc::new(Cell::new(false));
    let mut engine = engine();
    let flag = Rc::clone(&accepted);
    engine.set_scene_factory(Box::new(move |_| {
        Some(Box::new(StaleHandleScene {
            accepted: Rc::clone(&flag),
        }) as Box<dyn Scene>)
    }));
    engine.request_scene(0);
    engine.tick(DT);

    assert!(accepted.get());
    assert_eq!(engine.registry().state_flags[0], 0);
    assert_eq!(engine.registry().active_count(), 0);
}

#[test]
fn test_cleanup_flushes_every_tick() {
    let mut engine = arena_engine();
    for _ in 0..3 {
        engine.tick(DT);
        assert_eq!(engine.bus().count(), 0);
    }
    assert!(engine.debug_state().bus_depth > 0);
}

// ---------------------------------------------------------------------------
// Platform sync
// ---------------------------------------------------------------------------

#[test]
fn test_resize_reaches_camera_and_canvas() {
    let mut engine = engine();
    assert_eq!(engine.backend().canvas_size(), (1920, 1080));
    engine.viewport_mut().request_resize(1000, 1000);
    engine.tick(DT);
    assert_eq!(engine.backend().canvas_size(), (1920, 1080));
    engine.tick(DT);

    assert_eq!(engine.backend().canvas_size(), (1080, 1080));
    assert_eq!(engine.camera().viewport().width, 1080.0);
}

// ---------------------------------------------------------------------------
// Demo flow
// ---------------------------------------------------------------------------

#[test]
fn test_menu_confirm_loads_arena() {
    let mut engine = demo_engine();
    assert_eq!(engine.scenes().current_name(), Some("menu"));

    press_once(&mut engine, Key::Enter);
    assert_eq!(engine.scenes().current_name(), Some("menu"));
    assert!(engine.scenes().has_pending());

    engine.tick(DT);
    assert_eq!(engine.scenes().current_name(), Some("arena"));
    // Player, prototype and the first batch of clones.
    assert_eq!(engine.registry().active_count(), 2 + SPAWN_PER_TICK);
    assert_eq!(engine.hooks().clone_hooks().len(), 1);
}

#[test]
fn test_swarm_clones_are_revealed_by_hook() {
    let mut engine = arena_engine();
    assert_eq!(visible_enemies(&engine), SPAWN_PER_TICK as usize);

    for _ in 0..SWARM_SIZE / SPAWN_PER_TICK {
        engine.tick(DT);
    }
    assert_eq!(visible_enemies(&engine), SWARM_SIZE as usize);
    assert_eq!(engine.registry().active_count(), SWARM_SIZE + 2);
    assert!(engine.render().stats().drawn > 0);
}

#[test]
fn test_player_moves_and_camera_follows() {
    let mut engine = arena_engine();
    let player = find_player(&engine);
    assert_eq!(engine.camera().mode(), CameraMode::Follow);
    assert_eq!(engine.camera().target().index(), player);

    engine.input_mut().press(Key::D);
    for _ in 0..10 {
        engine.tick(DT);
    }
    let x = engine.registry().pos_x[player];
    assert!(x > PLAYER_START.x + 20.0, "player at {x}");
    assert!(engine.camera().position().x > PLAYER_START.x);
}

#[test]
fn test_far_entities_are_culled() {
    let mut engine = arena_engine();
    let player = find_player(&engine);
    engine.registry_mut().pos_x[player] = 50_000.0;
    engine.tick(DT);

    let reg = engine.registry();
    let awake_enemies = (0..reg.max_used_bound() as usize)
        .filter(|&i| {
            reg.types[i] == entity_types::ENEMY
                && reg.state_flags[i] & state::ACTIVE != 0
                && reg.state_flags[i] & state::CULLED == 0
        })
        .count();
    // Only the clones landed this tick are not yet checked.
    assert!(awake_enemies <= SPAWN_PER_TICK as usize);
    assert_eq!(reg.state_flags[player] & state::CULLED, 0);
}

#[test]
fn test_primary_zooms_in() {
    let mut engine = arena_engine();
    engine.input_mut().press(Key::E);
    engine.tick(DT);
    assert!((engine.camera().zoom() - 1.01).abs() < 1e-5);

    engine.input_mut().release(Key::E);
    engine.input_mut().press(Key::Q);
    engine.tick(DT);
    assert!((engine.camera().zoom() - 1.01 * 0.99).abs() < 1e-5);
}

#[test]
fn test_confirm_in_arena_ends_game() {
    let mut engine = arena_engine();
    press_once(&mut engine, Key::Enter);
    engine.tick(DT);

    assert_eq!(engine.scenes().current_id(), Some(scene_ids::GAME_OVER));
    assert!(engine.hooks().clone_hooks().is_empty());
    assert_eq!(engine.camera().mode(), CameraMode::Manual);
}

#[test]
fn test_arena_reload_starts_clean() {
    let mut engine = arena_engine();
    for _ in 0..4 {
        engine.tick(DT);
    }
    press_once(&mut engine, Key::Enter);
    engine.tick(DT);
    press_once(&mut engine, Key::Enter);
    engine.tick(DT);
    press_once(&mut engine, Key::Enter);
    engine.tick(DT);

    assert_eq!(engine.scenes().current_id(), Some(scene_ids::ARENA));
    assert_eq!(engine.registry().active_count(), 2 + SPAWN_PER_TICK);
    assert_eq!(engine.hooks().clone_hooks().len(), 1);
}

#[test]
fn test_scripted_run() {
    let mut engine = engine();
    engine.set_scene_factory(demo::factory());
    engine.request_scene(scene_ids::MENU);
    for frame in 0..120 {
        demo::script(frame, engine.input_mut());
        engine.tick(DT);
    }

    let debug = engine.debug_state();
    assert_eq!(debug.frame_count, 120);
    assert_eq!(debug.scene.as_deref(), Some("arena"));
    assert_eq!(debug.active_entities, SWARM_SIZE + 2);
    assert!(debug.visible_entities > 0);
}

// ---------------------------------------------------------------------------
// Debug
// ---------------------------------------------------------------------------

#[test]
fn test_debug_state_serializes() {
    let mut engine = arena_engine();
    engine.tick(DT);
    let json: serde_json::Value =
        serde_json::from_str(&engine.debug_state().to_json().unwrap()).unwrap();
    assert_eq!(json["frame_count"], 4);
    assert_eq!(json["scene"], "arena");
    assert_eq!(json["mode"], "off");
}

#[test]
fn test_overlay_from_config_mode() {
    let mut config = test_config();
    config.debug.overlay = "entity_state".to_string();
    let mut engine = build(config).unwrap();
    assert_eq!(engine.debug_state().mode, DebugMode::EntityState);

    engine.set_scene_factory(demo::factory());
    engine.request_scene(scene_ids::ARENA);
    engine.tick(DT);
    let OverlayData::EntityState(counts) = engine.overlay() else {
        panic!("expected entity state overlay");
    };
    assert_eq!(counts.active, 2 + SPAWN_PER_TICK);

    engine.cycle_debug_mode();
    assert_eq!(engine.overlay().mode(), DebugMode::VelocityField);
}
