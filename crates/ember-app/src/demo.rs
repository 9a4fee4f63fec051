//! Demo scenes: a menu, a playable swarm arena and a game-over screen.
//!
//! The arena spawns a player and grows a swarm by cloning one hidden enemy
//! prototype. Entities farther than [`SLEEP_RADIUS`] from the player are
//! CULLED so physics skips them. The camera follows the player; PRIMARY and
//! SECONDARY zoom.

use std::f32::consts::TAU;

use ember_animation::{AnimDef, AnimTable};
use ember_bus::{AnimPlay, Command, CommandBus, CommandKind, PhysDef, anim_flags};
use ember_ecs::{Color, EntityHandle, Registry, components, state};
use ember_physics::material_ids;
use ember_platform::{Action, Key, ScriptedInput};
use ember_render::{CameraMode, batch_ids};
use ember_scene::{Scene, SceneContext, SceneFactory};
use glam::Vec2;
use tracing::{debug, info};

pub mod scene_ids {
    use ember_scene::SceneId;

    pub const MENU: SceneId = 0;
    pub const ARENA: SceneId = 1;
    pub const GAME_OVER: SceneId = 2;
}

pub mod entity_types {
    pub const PLAYER: u16 = 0;
    pub const ENEMY: u16 = 1;
}

pub mod layers {
    pub const PLAYER: u16 = 1 << 0;
    pub const ENEMY: u16 = 1 << 1;
    pub const BULLET: u16 = 1 << 2;
}

pub mod anims {
    pub const PLAYER_RUN: u16 = 0;
    pub const ENEMY_WALK: u16 = 1;
}

pub const PLAYER_SPEED: f32 = 500.0;
pub const PLAYER_START: Vec2 = Vec2::new(100.0, 200.0);
pub const SLEEP_RADIUS: f32 = 2500.0;
pub const SWARM_SIZE: u32 = 256;
pub const SPAWN_PER_TICK: u32 = 16;
pub const ZOOM_IN: f32 = 1.01;
pub const ZOOM_OUT: f32 = 0.99;
const SCALE: f32 = 4.0;
const ENEMY_SPEED: f32 = 60.0;
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Animations the demo sprites use.
pub fn anim_table() -> AnimTable {
    let mut table = AnimTable::default();
    table.push(AnimDef::new(0.1, 4, 16, true));
    table.push(AnimDef::new(0.15, 4, 32, true));
    table
}

pub fn factory() -> SceneFactory {
    Box::new(|id| -> Option<Box<dyn Scene>> {
        match id {
            scene_ids::MENU => Some(Box::new(MenuScene)),
            scene_ids::ARENA => Some(Box::new(ArenaScene::default())),
            scene_ids::GAME_OVER => Some(Box::new(GameOverScene)),
            _ => None,
        }
    })
}

/// Key presses the headless binary feeds in on a given frame: start the
/// arena, then walk right while alternating zoom.
pub fn script(frame: u64, input: &mut ScriptedInput) {
    input.release_all();
    match frame {
        1 => input.press(Key::Enter),
        f if f >= 10 => {
            input.press(Key::D);
            if f % 240 < 60 {
                input.press(Key::E);
            } else if f % 240 < 120 {
                input.press(Key::Q);
            }
        }
        _ => {}
    }
}

pub struct MenuScene;

impl Scene for MenuScene {
    fn name(&self) -> &str {
        "menu"
    }

    fn init(&mut self, _ctx: &mut SceneContext<'_>) {
        info!("Menu ready");
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) {
        if ctx.input.is_pressed(Action::Confirm) {
            ctx.request_scene(scene_ids::ARENA);
        }
    }
}

pub struct GameOverScene;

impl Scene for GameOverScene {
    fn name(&self) -> &str {
        "game_over"
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) {
        if ctx.input.is_pressed(Action::Confirm) {
            ctx.request_scene(scene_ids::MENU);
        }
    }
}

#[derive(Default)]
pub struct ArenaScene {
    player: EntityHandle,
    prototype: EntityHandle,
    spawned: u32,
}

impl ArenaScene {
    pub fn player(&self) -> EntityHandle {
        self.player
    }

    fn spawn_player(&mut self, ctx: &mut SceneContext<'_>) {
        let comp = components::POSITION
            | components::VELOCITY
            | components::SIZE
            | components::SPRITE
            | components::COLOR
            | components::PHYSICS
            | components::COLLISION_AABB;
        let flags = state::VISIBLE
            | state::SOLID
            | state::ALWAYS_AWAKE
            | state::layer(layers::PLAYER)
            | state::mask(layers::ENEMY | layers::BULLET);
        let player = ctx.reg.create(entity_types::PLAYER, PLAYER_START, comp, flags);
        if !player.is_valid() {
            return;
        }
        let i = player.index();
        ctx.reg.size_w[i] = 16.0 * SCALE;
        ctx.reg.size_h[i] = 16.0 * SCALE;
        ctx.reg.colors[i] = Color::WHITE;
        ctx.reg.batch_ids[i] = batch_ids::PLAYER;

        ctx.bus.push(Command::new(
            player,
            CommandKind::PhysDefine(PhysDef {
                material_id: material_ids::DEFAULT,
                flags: 0,
                drag: 0.1,
            }),
        ));
        ctx.bus.push(Command::new(
            player,
            CommandKind::AnimPlay(AnimPlay {
                anim_id: anims::PLAYER_RUN,
                flags: anim_flags::LOOP_OVERRIDE,
            }),
        ));

        ctx.camera.set_target(player);
        ctx.camera.set_mode(CameraMode::Follow);
        ctx.camera.center_on(PLAYER_START);
        self.player = player;
    }

    /// Hidden, culled template every swarm member is cloned from.
    fn spawn_prototype(&mut self, ctx: &mut SceneContext<'_>) {
        let comp = components::POSITION
            | components::VELOCITY
            | components::SIZE
            | components::SPRITE
            | components::COLOR
            | components::PHYSICS
            | components::COLLISION_CIRCLE;
        let flags = state::SOLID
            | state::CULLED
            | state::layer(layers::ENEMY)
            | state::mask(layers::PLAYER | layers::ENEMY);
        let prototype = ctx.reg.create(entity_types::ENEMY, Vec2::ZERO, comp, flags);
        if !prototype.is_valid() {
            return;
        }
        let i = prototype.index();
        ctx.reg.size_w[i] = 12.0 * SCALE;
        ctx.reg.size_h[i] = 12.0 * SCALE;
        ctx.reg.colors[i] = Color::RED;
        ctx.reg.batch_ids[i] = batch_ids::ENEMY;
        ctx.reg.material_id[i] = material_ids::BOUNCY;
        self.prototype = prototype;
    }

    fn grow_swarm(&mut self, ctx: &mut SceneContext<'_>) {
        if self.spawned >= SWARM_SIZE
            || !ctx.reg.is_alive(self.prototype)
            || !ctx.reg.is_alive(self.player)
        {
            return;
        }
        let center = ctx.reg.position(self.player.index());
        let batch = SPAWN_PER_TICK.min(SWARM_SIZE - self.spawned);
        for _ in 0..batch {
            let n = self.spawned as f32;
            let angle = n * GOLDEN_ANGLE;
            let radius = 300.0 + 40.0 * n.sqrt();
            let at = center + Vec2::from_angle(angle) * radius;
            if !ctx.api().clone_entity(self.prototype, at).is_valid() {
                break;
            }
            self.spawned += 1;
        }
        debug!("Swarm at {} of {SWARM_SIZE}", self.spawned);
    }

    fn steer_player(&self, ctx: &mut SceneContext<'_>) {
        if !ctx.reg.is_alive(self.player) {
            return;
        }
        let mut vel = Vec2::ZERO;
        if ctx.input.is_down(Action::Up) {
            vel.y = -PLAYER_SPEED;
        }
        if ctx.input.is_down(Action::Down) {
            vel.y = PLAYER_SPEED;
        }
        if ctx.input.is_down(Action::Left) {
            vel.x = -PLAYER_SPEED;
        }
        if ctx.input.is_down(Action::Right) {
            vel.x = PLAYER_SPEED;
        }
        let i = self.player.index();
        ctx.reg.vel_x[i] = vel.x;
        ctx.reg.vel_y[i] = vel.y;
    }

    fn update_sleep_state(&self, reg: &mut Registry) {
        if !reg.is_alive(self.player) {
            return;
        }
        let center = reg.position(self.player.index());
        let radius_sq = SLEEP_RADIUS * SLEEP_RADIUS;
        for i in 0..reg.max_used_bound() as usize {
            if reg.state_flags[i] & state::ACTIVE == 0
                || reg.types[i] == entity_types::PLAYER
                || i == self.prototype.index()
            {
                continue;
            }
            if reg.position(i).distance_squared(center) > radius_sq {
                reg.state_flags[i] |= state::CULLED;
            } else {
                reg.state_flags[i] &= !state::CULLED;
            }
        }
    }

    fn change_zoom(ctx: &mut SceneContext<'_>) {
        let zoom = ctx.camera.zoom();
        if ctx.input.is_down(Action::Primary) {
            ctx.camera.set_zoom(zoom * ZOOM_IN);
        } else if ctx.input.is_down(Action::Secondary) {
            ctx.camera.set_zoom(zoom * ZOOM_OUT);
        }
    }
}

/// Reveal a fresh swarm member, start its walk cycle and send it drifting.
fn on_enemy_cloned(reg: &mut Registry, bus: &mut CommandBus, _src: EntityHandle, dst: EntityHandle) {
    let i = dst.index();
    reg.state_flags[i] |= state::VISIBLE;
    bus.push(Command::new(
        dst,
        CommandKind::AnimPlay(AnimPlay {
            anim_id: anims::ENEMY_WALK,
            flags: 0,
        }),
    ));
    let heading = Vec2::from_angle(i as f32 * GOLDEN_ANGLE % TAU);
    bus.push(Command::new(
        dst,
        CommandKind::PhysSetVelocity(heading * ENEMY_SPEED),
    ));
}

impl Scene for ArenaScene {
    fn name(&self) -> &str {
        "arena"
    }

    fn init(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.reg.reset();
        ctx.bus.push(Command::global(CommandKind::PhysReset));
        ctx.hooks.subscribe_clone(on_enemy_cloned);
        self.spawned = 0;
        self.spawn_player(ctx);
        self.spawn_prototype(ctx);
        info!("Arena ready, player {}", self.player);
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) {
        self.update_sleep_state(ctx.reg);
        self.grow_swarm(ctx);
        self.steer_player(ctx);
        Self::change_zoom(ctx);

        if ctx.input.is_pressed(Action::Confirm) {
            ctx.request_scene(scene_ids::GAME_OVER);
        }
    }

    fn unload(&mut self, ctx: &mut SceneContext<'_>) {
        ctx.camera.set_mode(CameraMode::Manual);
        ctx.camera.set_target(EntityHandle::INVALID);
        info!("Arena unloaded with {} swarm members", self.spawned);
    }
}
