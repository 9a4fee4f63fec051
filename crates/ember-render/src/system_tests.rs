use ember_bus::{Command, CommandBus, CommandKind, RenderDepth};
use ember_ecs::{Color, EntityHandle, Registry, components, state};
use ember_platform::{Atlas, TextureHandle, ViewportSize};
use ember_spatial::{Aabb, SpatialHash, SpatialHashConfig};
use glam::Vec2;

use crate::backend::{DrawCall, RecordingBackend};
use crate::batch::{BlendMode, RenderState, batch_ids};
use crate::camera::{CameraSettings, CameraSystem};
use crate::sort_key::DepthMath;
use crate::{RenderSettings, RenderSystem};

const DECORATION: u64 = components::SPRITE;
const SHOWN: u64 = state::VISIBLE | state::STATIC;
const EVERYWHERE: Aabb = Aabb::new(-2048.0, -2048.0, 4096.0, 4096.0);

struct World {
    reg: Registry,
    bus: CommandBus,
    spatial: SpatialHash,
    render: RenderSystem,
    backend: RecordingBackend,
}

impl World {
    fn new(depth: DepthMath) -> Self {
        let atlas = Atlas::grid(TextureHandle(1), 8, 8, 16.0, 16.0);
        Self {
            reg: Registry::new(64),
            bus: CommandBus::new(16),
            spatial: SpatialHash::new(SpatialHashConfig {
                max_entities: 64,
                max_static: 256,
                max_dynamic: 256,
                ..SpatialHashConfig::default()
            }),
            render: RenderSystem::new(
                RenderSettings {
                    max_visible: 64,
                    depth,
                    ..RenderSettings::default()
                },
                64,
            ),
            backend: RecordingBackend::new(
                Box::new(atlas),
                ViewportSize::from_window(1280, 720, 1080),
            ),
        }
    }

    fn decoration(&mut self, sprite: u16, pos: Vec2, layer: u8, batch: u8) -> EntityHandle {
        let e = self.reg.create(1, pos, DECORATION, SHOWN);
        self.reg.sprite_ids[e.index()] = sprite;
        self.reg.render_layer[e.index()] = layer;
        self.reg.batch_ids[e.index()] = batch;
        e
    }

    fn draw(&mut self) -> Vec<u16> {
        self.backend.clear();
        self.render.sync_decorations(&self.reg, &mut self.spatial);
        self.render
            .draw_entities(&self.reg, &mut self.spatial, EVERYWHERE, &mut self.backend);
        self.backend.drawn_sprites()
    }
}

#[test]
fn test_depth_sort_y_origin() {
    let mut w = World::new(DepthMath::Y_ORIGIN);
    w.decoration(10, Vec2::new(0.0, 10.0), 0, 1);
    w.decoration(5, Vec2::new(0.0, 5.0), 0, 1);
    w.decoration(15, Vec2::new(0.0, 5.0), 1, 1);

    assert_eq!(w.draw(), vec![5, 10, 15]);
}

#[test]
fn test_flat_sort_groups_by_batch_then_id() {
    let mut w = World::new(DepthMath::FLAT);
    w.decoration(0, Vec2::new(0.0, 90.0), 0, batch_ids::ENEMY);
    w.decoration(1, Vec2::new(0.0, 10.0), 0, batch_ids::PLAYER);
    w.decoration(2, Vec2::new(0.0, 50.0), 0, batch_ids::ENEMY);

    assert_eq!(w.draw(), vec![1, 0, 2]);
    assert_eq!(w.render.stats().batches, 2);
    assert_eq!(w.backend.state_changes(), 2);
}

#[test]
fn test_batch_change_switches_state() {
    let mut w = World::new(DepthMath::FLAT);
    let glow = RenderState {
        texture: Some(TextureHandle(9)),
        blend: BlendMode::Additive,
        ..RenderState::default()
    };
    w.render.batches_mut().register(7, glow);
    w.decoration(3, Vec2::ZERO, 0, 7);
    w.draw();

    assert_eq!(
        w.backend.calls()[0],
        DrawCall::SetState {
            texture: TextureHandle(9),
            shader: None,
            blend: BlendMode::Additive,
            filter: glow.filter,
        }
    );
    assert_eq!(w.backend.calls().last(), Some(&DrawCall::EndBatch));
}

#[test]
fn test_invisible_and_dead_entities_are_skipped() {
    let mut w = World::new(DepthMath::FLAT);
    let hidden = w.decoration(1, Vec2::ZERO, 0, 0);
    w.decoration(2, Vec2::new(40.0, 0.0), 0, 0);
    w.reg.state_flags[hidden.index()] &= !state::VISIBLE;

    assert_eq!(w.draw(), vec![2]);
    assert_eq!(w.render.stats().candidates, 2);
    assert_eq!(w.render.stats().drawn, 1);
}

#[test]
fn test_sprites_carry_registry_fields() {
    let mut w = World::new(DepthMath::FLAT);
    let e = w.decoration(9, Vec2::new(100.0, 50.0), 0, 0);
    let i = e.index();
    w.reg.colors[i] = Color::RED;
    w.reg.rotation[i] = 45.0;
    w.reg.pivot_x[i] = 0.0;
    w.reg.pivot_y[i] = 1.0;
    w.draw();

    let Some(DrawCall::Sprite { dest, origin, rotation, tint, .. }) = w
        .backend
        .calls()
        .iter()
        .find(|c| matches!(c, DrawCall::Sprite { .. }))
        .copied()
    else {
        panic!("no sprite drawn");
    };
    assert_eq!(dest.x, 100.0);
    assert_eq!(dest.y, 50.0);
    assert_eq!(origin, Vec2::new(0.0, 32.0));
    assert_eq!(rotation, 45.0);
    assert_eq!(tint, Color::RED);
}

#[test]
fn test_culling_excludes_far_entities() {
    let mut w = World::new(DepthMath::FLAT);
    w.decoration(1, Vec2::ZERO, 0, 0);
    w.decoration(2, Vec2::new(10_000.0, 0.0), 0, 0);
    assert_eq!(w.draw(), vec![1]);
}

#[test]
fn test_decoration_sync_is_idempotent() {
    let mut w = World::new(DepthMath::FLAT);
    w.decoration(1, Vec2::ZERO, 0, 0);
    w.render.sync_decorations(&w.reg, &mut w.spatial);
    let nodes = w.spatial.static_len();
    w.render.sync_decorations(&w.reg, &mut w.spatial);
    assert_eq!(w.spatial.static_len(), nodes);
    assert_eq!(w.render.decoration_count(), 1);
}

#[test]
fn test_physics_bodies_are_not_decorations() {
    let mut w = World::new(DepthMath::FLAT);
    w.reg
        .create(1, Vec2::ZERO, DECORATION | components::PHYSICS, SHOWN);
    w.render.sync_decorations(&w.reg, &mut w.spatial);
    assert_eq!(w.spatial.static_len(), 0);
}

#[test]
fn test_decorations_resync_after_static_wipe() {
    let mut w = World::new(DepthMath::FLAT);
    w.decoration(1, Vec2::ZERO, 0, 0);
    assert_eq!(w.draw(), vec![1]);

    w.spatial.clear_all();
    assert_eq!(w.draw(), vec![1]);
}

#[test]
fn test_depth_math_command_applies() {
    let mut w = World::new(DepthMath::FLAT);
    let cmd = Command::global(CommandKind::RenderSetDepthMath(DepthMath::Y_BOTTOM.to_command()));
    assert!(w.bus.push(cmd));
    w.render.process_commands(&mut w.bus);
    assert_eq!(w.render.depth_math(), DepthMath::Y_BOTTOM);
}

#[test]
fn test_invalid_depth_math_keeps_previous() {
    let mut w = World::new(DepthMath::Y_ORIGIN);
    let overlapping = RenderDepth {
        w_x: 0.0,
        w_y: 1.0,
        w_h: 0.0,
        shift_batch: 24,
        shift_depth: 24,
    };
    assert!(w.bus.push(Command::global(CommandKind::RenderSetDepthMath(overlapping))));
    w.render.process_commands(&mut w.bus);
    assert_eq!(w.render.depth_math(), DepthMath::Y_ORIGIN);
}

#[test]
fn test_invalid_initial_depth_falls_back_to_flat() {
    let render = RenderSystem::new(
        RenderSettings {
            depth: DepthMath::new(0.0, 0.0, 0.0, 0, 0),
            ..RenderSettings::default()
        },
        8,
    );
    assert_eq!(render.depth_math(), DepthMath::FLAT);
}

#[test]
fn test_draw_wraps_world_mode() {
    let mut w = World::new(DepthMath::FLAT);
    w.decoration(4, Vec2::ZERO, 0, 0);
    let camera = CameraSystem::new(CameraSettings::default(), ViewportSize::from_window(1280, 720, 1080));
    w.render
        .draw(&w.reg, &mut w.bus, &mut w.spatial, &camera, &mut w.backend);

    let calls = w.backend.calls();
    assert!(matches!(calls.first(), Some(DrawCall::BeginWorld(_))));
    assert_eq!(calls.last(), Some(&DrawCall::EndWorld));
    assert_eq!(w.backend.drawn_sprites(), vec![4]);
}
