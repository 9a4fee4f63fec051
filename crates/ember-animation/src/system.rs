//! Baker, ANIM command handlers and the per-tick advancer.

use ember_bus::{AnimPlay, CommandBus, CommandKind, Domain, anim_flags};
use ember_ecs::{Registry, components, state};
use tracing::warn;

use crate::defs::AnimTable;

/// Durations and speeds at or below this count as zero.
pub const MIN_ANIM_VALUE: f32 = 1e-4;

/// Largest delta a single update integrates.
const MAX_DT: f32 = 0.05;

/// Owner of the ANIM command domain.
#[derive(Debug, Default)]
pub struct AnimationSystem {
    table: AnimTable,
}

impl AnimationSystem {
    pub fn new(table: AnimTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &AnimTable {
        &self.table
    }

    pub fn set_table(&mut self, table: AnimTable) {
        self.table = table;
    }

    /// Start `anim_id` on slot `id`, baking the definition into the registry.
    ///
    /// Replaying the animation that is already running is a no-op unless
    /// [`anim_flags::FORCE_RESET`] is set. Returns `false` for an unknown
    /// animation id, leaving the entity untouched.
    pub fn play(&self, reg: &mut Registry, id: usize, anim_id: u16, flags: u16) -> bool {
        if reg.anim_ids[id] == anim_id
            && !reg.anim_finished[id]
            && flags & anim_flags::FORCE_RESET == 0
        {
            return true;
        }
        let Some(def) = self.table.get(anim_id) else {
            warn!(
                "Animation {anim_id} out of range ({} defined), entity {id} unchanged",
                self.table.len()
            );
            return false;
        };

        reg.anim_base_durations[id] = def.frame_duration;
        reg.anim_frame_counts[id] = def.frame_count;
        reg.anim_start_sprites[id] = def.start_sprite;
        reg.anim_loops[id] = def.looping || flags & anim_flags::LOOP_OVERRIDE != 0;

        reg.anim_ids[id] = anim_id;
        reg.anim_frames[id] = 0;
        reg.anim_timers[id] = 0.0;
        reg.anim_speeds[id] = 1.0;
        reg.anim_finished[id] = false;

        reg.sprite_ids[id] = def.start_sprite;
        reg.component_masks[id] |= components::ANIMATION;
        reg.state_flags[id] = (reg.state_flags[id] | state::ANIMATED) & !state::ANIM_PAUSED;
        true
    }

    /// Apply every ANIM command in the current snapshot.
    pub fn process_commands(&self, reg: &mut Registry, bus: &mut CommandBus) {
        let mut iter = bus.iterator();
        while let Some(cmd) = bus.next(&mut iter) {
            if cmd.domain() != Domain::Anim || !reg.is_alive(cmd.entity) {
                continue;
            }
            let id = cmd.entity.index();
            match cmd.kind {
                CommandKind::AnimPlay(AnimPlay { anim_id, flags }) => {
                    self.play(reg, id, anim_id, flags);
                }
                CommandKind::AnimStop => {
                    reg.anim_finished[id] = true;
                    reg.anim_timers[id] = 0.0;
                    reg.anim_frames[id] = 0;
                }
                CommandKind::AnimPause => reg.state_flags[id] |= state::ANIM_PAUSED,
                CommandKind::AnimResume => reg.state_flags[id] &= !state::ANIM_PAUSED,
                CommandKind::AnimSetSpeed(speed) => {
                    reg.anim_speeds[id] = if speed < MIN_ANIM_VALUE { 0.0 } else { speed };
                }
                CommandKind::AnimSetFrame(frame) => {
                    reg.anim_frames[id] = frame.min(reg.anim_frame_counts[id].saturating_sub(1));
                    reg.anim_timers[id] = 0.0;
                    reg.anim_finished[id] = false;
                }
                CommandKind::AnimSetLoop(looping) => {
                    reg.anim_loops[id] = looping;
                    if looping {
                        reg.anim_finished[id] = false;
                    }
                }
                _ => {}
            }
        }
    }

    /// Advance every running animation by `dt` seconds (clamped to 0.05).
    pub fn update(&self, reg: &mut Registry, dt: f32) {
        let dt = dt.clamp(0.0, MAX_DT);
        for i in 0..reg.max_used_bound() as usize {
            let flags = reg.state_flags[i];
            if !reg.has_components(i, components::ANIMATION)
                || flags & state::ACTIVE == 0
                || flags & state::ANIM_PAUSED != 0
            {
                continue;
            }
            let visible = flags & state::VISIBLE != 0;

            if reg.anim_finished[i] {
                if visible {
                    reg.sprite_ids[i] =
                        reg.anim_start_sprites[i].saturating_add(reg.anim_frames[i]);
                }
                continue;
            }

            let duration = reg.anim_base_durations[i];
            let frame_count = reg.anim_frame_counts[i];
            if duration <= MIN_ANIM_VALUE || frame_count == 0 {
                reg.anim_finished[i] = true;
                continue;
            }
            let speed = reg.anim_speeds[i];
            if speed <= MIN_ANIM_VALUE {
                continue;
            }

            let mut timer = reg.anim_timers[i] + dt * speed;
            let mut frame = reg.anim_frames[i];
            while timer >= duration {
                timer -= duration;
                frame += 1;
                if frame >= frame_count {
                    if reg.anim_loops[i] {
                        frame = 0;
                    } else {
                        frame = frame_count - 1;
                        timer = 0.0;
                        reg.anim_finished[i] = true;
                        break;
                    }
                }
            }
            reg.anim_timers[i] = timer;
            reg.anim_frames[i] = frame;

            if visible {
                reg.sprite_ids[i] = reg.anim_start_sprites[i].saturating_add(frame);
            }
        }
    }
}
