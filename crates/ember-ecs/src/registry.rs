//! Fixed-capacity SoA entity registry with generational slots.
//!
//! Every per-entity field is its own array addressed by slot id. Systems read
//! and write the arrays directly; lifecycle changes (create, destroy, clone,
//! reservation) go through the methods here so the free list, generation and
//! counter invariants hold:
//!
//! - a slot is live iff `ACTIVE` is set and its generation matches the handle;
//! - with no reservations outstanding, `active_count + free_count == capacity`;
//! - `max_used_bound` only grows (until [`Registry::reset`]).

use glam::Vec2;
use tracing::debug;

use crate::color::Color;
use crate::entity::EntityHandle;
use crate::flags::state;

/// Default slot count.
pub const MAX_ENTITIES: u32 = 10_000;

/// Size given to freshly created entities, in world units.
pub const DEFAULT_SIZE: f32 = 32.0;

/// Parallel per-entity arrays plus slot bookkeeping.
pub struct Registry {
    capacity: u32,

    // Spatial
    pub pos_x: Vec<f32>,
    pub pos_y: Vec<f32>,
    pub vel_x: Vec<f32>,
    pub vel_y: Vec<f32>,
    pub size_w: Vec<f32>,
    pub size_h: Vec<f32>,
    pub rotation: Vec<f32>,
    pub pivot_x: Vec<f32>,
    pub pivot_y: Vec<f32>,

    // Physics
    pub material_id: Vec<u8>,
    pub drag: Vec<f32>,
    pub inv_mass: Vec<f32>,
    pub gravity_scale: Vec<f32>,

    // Presentation
    pub sprite_ids: Vec<u16>,
    pub colors: Vec<Color>,
    pub render_layer: Vec<u8>,
    pub batch_ids: Vec<u8>,

    // Animation (dynamic)
    pub anim_ids: Vec<u16>,
    pub anim_timers: Vec<f32>,
    pub anim_speeds: Vec<f32>,
    pub anim_frames: Vec<u16>,
    pub anim_finished: Vec<bool>,

    // Animation (baked constants)
    pub anim_base_durations: Vec<f32>,
    pub anim_frame_counts: Vec<u16>,
    pub anim_start_sprites: Vec<u16>,
    pub anim_loops: Vec<bool>,

    // Identity / lifecycle
    pub types: Vec<u16>,
    pub component_masks: Vec<u64>,
    pub state_flags: Vec<u64>,
    generations: Vec<u32>,
    reserved: Vec<bool>,
    free_list: Vec<u32>,
    active_count: u32,
    max_used_bound: u32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(MAX_ENTITIES)
    }
}

impl Registry {
    /// Allocate a registry with `capacity` slots, all free.
    ///
    /// The free list is built in descending order so the first pops yield
    /// slot 0, 1, 2, ...
    pub fn new(capacity: u32) -> Self {
        let n = capacity as usize;
        let mut reg = Self {
            capacity,
            pos_x: vec![0.0; n],
            pos_y: vec![0.0; n],
            vel_x: vec![0.0; n],
            vel_y: vec![0.0; n],
            size_w: vec![0.0; n],
            size_h: vec![0.0; n],
            rotation: vec![0.0; n],
            pivot_x: vec![0.0; n],
            pivot_y: vec![0.0; n],
            material_id: vec![0; n],
            drag: vec![0.0; n],
            inv_mass: vec![0.0; n],
            gravity_scale: vec![0.0; n],
            sprite_ids: vec![0; n],
            colors: vec![Color::TRANSPARENT; n],
            render_layer: vec![0; n],
            batch_ids: vec![0; n],
            anim_ids: vec![0; n],
            anim_timers: vec![0.0; n],
            anim_speeds: vec![0.0; n],
            anim_frames: vec![0; n],
            anim_finished: vec![false; n],
            anim_base_durations: vec![0.0; n],
            anim_frame_counts: vec![0; n],
            anim_start_sprites: vec![0; n],
            anim_loops: vec![false; n],
            types: vec![0; n],
            component_masks: vec![0; n],
            state_flags: vec![0; n],
            generations: vec![0; n],
            reserved: vec![false; n],
            free_list: Vec::with_capacity(n),
            active_count: 0,
            max_used_bound: 0,
        };
        reg.rebuild_free_list();
        reg
    }

    fn rebuild_free_list(&mut self) {
        self.free_list.clear();
        self.free_list.extend((0..self.capacity).rev());
    }

    /// Clear all per-entity state. Generations are preserved so handles
    /// issued before the reset stay invalid.
    pub fn reset(&mut self) {
        for i in 0..self.capacity as usize {
            if self.state_flags[i] & state::ACTIVE != 0 || self.reserved[i] {
                self.generations[i] = self.generations[i].wrapping_add(1);
            }
            self.clear_slot(i);
            self.reserved[i] = false;
        }
        self.rebuild_free_list();
        self.active_count = 0;
        self.max_used_bound = 0;
        debug!("Registry reset ({} slots)", self.capacity);
    }

    fn clear_slot(&mut self, i: usize) {
        self.pos_x[i] = 0.0;
        self.pos_y[i] = 0.0;
        self.vel_x[i] = 0.0;
        self.vel_y[i] = 0.0;
        self.size_w[i] = 0.0;
        self.size_h[i] = 0.0;
        self.rotation[i] = 0.0;
        self.pivot_x[i] = 0.0;
        self.pivot_y[i] = 0.0;
        self.material_id[i] = 0;
        self.drag[i] = 0.0;
        self.inv_mass[i] = 0.0;
        self.gravity_scale[i] = 0.0;
        self.sprite_ids[i] = 0;
        self.colors[i] = Color::TRANSPARENT;
        self.render_layer[i] = 0;
        self.batch_ids[i] = 0;
        self.anim_ids[i] = 0;
        self.anim_timers[i] = 0.0;
        self.anim_speeds[i] = 0.0;
        self.anim_frames[i] = 0;
        self.anim_finished[i] = false;
        self.anim_base_durations[i] = 0.0;
        self.anim_frame_counts[i] = 0;
        self.anim_start_sprites[i] = 0;
        self.anim_loops[i] = false;
        self.types[i] = 0;
        self.component_masks[i] = 0;
        self.state_flags[i] = 0;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Total number of slots.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of live entities.
    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    /// Number of slots on the free list.
    pub fn free_count(&self) -> u32 {
        self.free_list.len() as u32
    }

    /// Exclusive upper bound on every slot index that has ever been live.
    pub fn max_used_bound(&self) -> u32 {
        self.max_used_bound
    }

    /// Current generation of a slot.
    pub fn generation(&self, id: u32) -> u32 {
        self.generations.get(id as usize).copied().unwrap_or(0)
    }

    /// Handle for the current incarnation of slot `id`.
    pub fn handle_of(&self, id: u32) -> EntityHandle {
        EntityHandle::new(id, self.generation(id))
    }

    /// Whether a slot is reserved and not yet activated.
    pub fn is_reserved(&self, handle: EntityHandle) -> bool {
        handle.id < self.capacity
            && self.reserved[handle.index()]
            && self.generations[handle.index()] == handle.generation
    }

    /// Bounds check, `ACTIVE` set, and generation match.
    #[inline]
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        handle.id < self.capacity
            && self.state_flags[handle.index()] & state::ACTIVE != 0
            && self.generations[handle.index()] == handle.generation
    }

    /// Whether slot `id` is active, regardless of generation.
    #[inline]
    pub fn is_active(&self, id: usize) -> bool {
        self.state_flags[id] & state::ACTIVE != 0
    }

    /// Whether slot `id` has every bit of `components`.
    #[inline]
    pub fn has_components(&self, id: usize, components: u64) -> bool {
        self.component_masks[id] & components == components
    }

    /// Position of slot `id`.
    pub fn position(&self, id: usize) -> Vec2 {
        Vec2::new(self.pos_x[id], self.pos_y[id])
    }

    /// Velocity of slot `id`.
    pub fn velocity(&self, id: usize) -> Vec2 {
        Vec2::new(self.vel_x[id], self.vel_y[id])
    }

    /// Size of slot `id`.
    pub fn size(&self, id: usize) -> Vec2 {
        Vec2::new(self.size_w[id], self.size_h[id])
    }

    /// Iterate the ids of all live slots below `max_used_bound`.
    pub fn active_ids(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.max_used_bound as usize).filter(|&i| self.is_active(i))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Pop a free slot without activating it.
    ///
    /// Returns [`EntityHandle::INVALID`] when no slot is free.
    pub fn reserve_slot(&mut self) -> EntityHandle {
        let Some(id) = self.free_list.pop() else {
            return EntityHandle::INVALID;
        };
        self.reserved[id as usize] = true;
        EntityHandle::new(id, self.generations[id as usize])
    }

    /// Give a reserved, never-activated slot back to the free list.
    ///
    /// Returns `false` if the handle is stale or the slot is not reserved.
    pub fn return_reserved(&mut self, handle: EntityHandle) -> bool {
        if !self.is_reserved(handle) || self.is_active(handle.index()) {
            return false;
        }
        self.reserved[handle.index()] = false;
        self.free_list.push(handle.id);
        true
    }

    /// Create and activate an entity.
    ///
    /// `flags` gets `ACTIVE` added. Returns [`EntityHandle::INVALID`] when the
    /// registry is full.
    pub fn create(&mut self, entity_type: u16, pos: Vec2, comp_mask: u64, flags: u64) -> EntityHandle {
        let Some(id) = self.free_list.pop() else {
            return EntityHandle::INVALID;
        };
        let i = id as usize;

        self.clear_slot(i);
        self.pos_x[i] = pos.x;
        self.pos_y[i] = pos.y;
        self.size_w[i] = DEFAULT_SIZE;
        self.size_h[i] = DEFAULT_SIZE;
        self.pivot_x[i] = 0.5;
        self.pivot_y[i] = 0.5;
        self.inv_mass[i] = 1.0;
        self.gravity_scale[i] = 1.0;
        self.colors[i] = Color::WHITE;
        self.anim_speeds[i] = 1.0;
        self.anim_finished[i] = true;
        self.types[i] = entity_type;
        self.component_masks[i] = comp_mask;
        self.state_flags[i] = flags | state::ACTIVE;

        self.activate(id);
        EntityHandle::new(id, self.generations[i])
    }

    /// Mark a slot as live and update the counters.
    fn activate(&mut self, id: u32) {
        let i = id as usize;
        self.reserved[i] = false;
        self.state_flags[i] |= state::ACTIVE;
        self.active_count += 1;
        if id >= self.max_used_bound {
            self.max_used_bound = id + 1;
        }
    }

    /// Destroy a live entity. Stale or invalid handles are ignored.
    ///
    /// Returns whether anything was destroyed.
    pub fn destroy(&mut self, handle: EntityHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        let i = handle.index();
        self.component_masks[i] = 0;
        self.state_flags[i] = 0;
        self.generations[i] = self.generations[i].wrapping_add(1);
        self.free_list.push(handle.id);
        self.active_count -= 1;
        true
    }

    /// Copy a prototype into a reserved destination slot and activate it.
    ///
    /// Copies every non-identity field; transient state bits in
    /// [`state::CLONE_SCRUB`] are dropped. The clone is placed at `position`
    /// with zero velocity and a rewound animation cursor.
    ///
    /// On any validation failure the destination reservation is returned
    /// (when it is still reserved) and `false` is returned.
    pub fn clone_into(&mut self, dst: EntityHandle, src: EntityHandle, position: Vec2) -> bool {
        if dst.id >= self.capacity {
            return false;
        }
        let d = dst.index();
        if self.is_active(d) {
            debug!("Clone target {dst} is already active");
            return false;
        }
        if self.generations[d] != dst.generation || !self.reserved[d] {
            return false;
        }
        if dst.id == src.id || !self.is_alive(src) {
            self.return_reserved(dst);
            return false;
        }
        let s = src.index();

        self.pos_x[d] = position.x;
        self.pos_y[d] = position.y;
        self.vel_x[d] = 0.0;
        self.vel_y[d] = 0.0;
        self.size_w[d] = self.size_w[s];
        self.size_h[d] = self.size_h[s];
        self.rotation[d] = self.rotation[s];
        self.pivot_x[d] = self.pivot_x[s];
        self.pivot_y[d] = self.pivot_y[s];

        self.material_id[d] = self.material_id[s];
        self.drag[d] = self.drag[s];
        self.inv_mass[d] = self.inv_mass[s];
        self.gravity_scale[d] = self.gravity_scale[s];

        self.sprite_ids[d] = self.sprite_ids[s];
        self.colors[d] = self.colors[s];
        self.render_layer[d] = self.render_layer[s];
        self.batch_ids[d] = self.batch_ids[s];

        self.anim_ids[d] = self.anim_ids[s];
        self.anim_speeds[d] = self.anim_speeds[s];
        self.anim_base_durations[d] = self.anim_base_durations[s];
        self.anim_frame_counts[d] = self.anim_frame_counts[s];
        self.anim_start_sprites[d] = self.anim_start_sprites[s];
        self.anim_loops[d] = self.anim_loops[s];
        self.anim_timers[d] = 0.0;
        self.anim_frames[d] = 0;
        self.anim_finished[d] = false;

        self.types[d] = self.types[s];
        self.component_masks[d] = self.component_masks[s];
        self.state_flags[d] = self.state_flags[s] & !state::CLONE_SCRUB;

        self.activate(dst.id);
        true
    }
}
