//! Component and state bitsets.
//!
//! `component_masks[id]` says which field groups an entity uses.
//! `state_flags[id]` is partitioned by bit range: bits 0-15 behavioural
//! flags, bits 16-31 the collision layer, bits 32-47 the collision mask
//! ("what I collide with"), bits 48-63 reserved.

/// Component capability bits.
pub mod components {
    pub const POSITION: u64 = 1 << 0;
    pub const VELOCITY: u64 = 1 << 1;
    pub const SIZE: u64 = 1 << 2;
    pub const ROTATION: u64 = 1 << 3;
    pub const SPRITE: u64 = 1 << 4;
    pub const COLOR: u64 = 1 << 5;
    pub const ANIMATION: u64 = 1 << 6;
    pub const PHYSICS: u64 = 1 << 7;
    pub const COLLISION_CIRCLE: u64 = 1 << 8;
    pub const COLLISION_AABB: u64 = 1 << 9;
}

/// Behavioural state bits (0-15) and the layer/mask fields.
pub mod state {
    pub const ACTIVE: u64 = 1 << 0;
    pub const VISIBLE: u64 = 1 << 1;
    pub const SOLID: u64 = 1 << 2;
    pub const ALWAYS_AWAKE: u64 = 1 << 3;
    pub const SLEEPING: u64 = 1 << 4;
    pub const ANIMATED: u64 = 1 << 5;
    pub const CULLED: u64 = 1 << 6;
    pub const PERSISTENT: u64 = 1 << 7;
    pub const STATIC: u64 = 1 << 8;
    pub const ANIM_PAUSED: u64 = 1 << 9;
    /// Overlaps are detected but never pushed apart.
    pub const SENSOR: u64 = 1 << 10;
    pub const BULLET: u64 = 1 << 11;

    /// All behavioural bits.
    pub const BEHAVIOUR_MASK: u64 = 0xFFFF;

    /// Per-instance transient bits a clone must not inherit.
    pub const CLONE_SCRUB: u64 = SLEEPING | CULLED;

    pub const LAYER_SHIFT: u32 = 16;
    pub const MASK_SHIFT: u32 = 32;
    pub const FIELD_MASK: u64 = 0xFFFF;

    /// Place a 16-bit collision layer into its bit range.
    pub const fn layer(layer: u16) -> u64 {
        (layer as u64) << LAYER_SHIFT
    }

    /// Place a 16-bit collision mask into its bit range.
    pub const fn mask(mask: u16) -> u64 {
        (mask as u64) << MASK_SHIFT
    }

    /// Extract the collision layer.
    pub const fn get_layer(flags: u64) -> u16 {
        ((flags >> LAYER_SHIFT) & FIELD_MASK) as u16
    }

    /// Extract the collision mask.
    pub const fn get_mask(flags: u64) -> u16 {
        ((flags >> MASK_SHIFT) & FIELD_MASK) as u16
    }

    /// Replace the layer field, leaving every other bit intact.
    pub const fn with_layer(flags: u64, layer: u16) -> u64 {
        (flags & !(FIELD_MASK << LAYER_SHIFT)) | self::layer(layer)
    }

    /// Replace the mask field, leaving every other bit intact.
    pub const fn with_mask(flags: u64, mask: u16) -> u64 {
        (flags & !(FIELD_MASK << MASK_SHIFT)) | self::mask(mask)
    }
}
