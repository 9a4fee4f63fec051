//! Command records and their domain encoding.
//!
//! A command's numeric type code carries its domain in the high byte
//! (`code & Domain::MASK`). The payload lives in the [`CommandKind`] variant,
//! so the tag and the payload can never disagree.

use ember_ecs::EntityHandle;
use glam::Vec2;

/// Flags carried by [`PhysDef`].
pub mod phys_flags {
    pub const STATIC: u8 = 1 << 0;
    pub const SENSOR: u8 = 1 << 1;
    pub const BULLET: u8 = 1 << 2;
}

/// Flags carried by [`AnimPlay`].
pub mod anim_flags {
    /// Restart even if the same animation is already running.
    pub const FORCE_RESET: u16 = 1 << 0;
    /// Force looping regardless of the animation definition.
    pub const LOOP_OVERRIDE: u16 = 1 << 1;
}

/// Subsystem that owns a command.
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    None = 0x0000,
    Phys = 0x0100,
    Entity = 0x0200,
    Anim = 0x0300,
    Render = 0x0400,
}

impl Domain {
    /// Bits of a type code that select the domain.
    pub const MASK: u16 = 0xFF00;

    /// Domain encoded in a type code, if it names one.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code & Self::MASK {
            0x0000 => Some(Self::None),
            0x0100 => Some(Self::Phys),
            0x0200 => Some(Self::Entity),
            0x0300 => Some(Self::Anim),
            0x0400 => Some(Self::Render),
            _ => None,
        }
    }
}

/// Physics body definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysDef {
    pub material_id: u8,
    /// Bitset of [`phys_flags`].
    pub flags: u8,
    pub drag: f32,
}

/// Animation start request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimPlay {
    pub anim_id: u16,
    /// Bitset of [`anim_flags`].
    pub flags: u16,
}

/// Clone/spawn request: copy `prototype` and place it at `position`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityClone {
    pub prototype: EntityHandle,
    pub position: Vec2,
}

/// Linear depth weights and sort-key shift positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderDepth {
    pub w_x: f32,
    pub w_y: f32,
    pub w_h: f32,
    pub shift_batch: u8,
    pub shift_depth: u8,
}

/// Tagged command payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommandKind {
    None,

    /// Teleport to a position.
    PhysMove(Vec2),
    PhysSetVelocity(Vec2),
    /// Insert every STATIC+PHYSICS entity into the persistent spatial layer.
    PhysLoadStatic,
    PhysDefine(PhysDef),
    /// Clear both spatial layers.
    PhysReset,

    EntitySpawn(EntityClone),
    EntitySpawnUntracked(EntityClone),
    EntityClone(EntityClone),
    EntityDestroy,
    EntityAddComponent(u64),
    EntityRemoveComponent(u64),
    EntitySetPivot(Vec2),
    EntitySetType(u16),
    EntitySetFlags(u64),
    EntityReset,
    EntityClearFlags(u64),

    AnimPlay(AnimPlay),
    AnimStop,
    AnimPause,
    AnimResume,
    AnimSetSpeed(f32),
    AnimSetFrame(u16),
    AnimSetLoop(bool),

    RenderSetDepthMath(RenderDepth),
}

impl CommandKind {
    /// Numeric type code; the high byte is the domain.
    pub const fn code(&self) -> u16 {
        match self {
            Self::None => 0x0000,

            Self::PhysMove(_) => 0x0100,
            Self::PhysSetVelocity(_) => 0x0101,
            Self::PhysLoadStatic => 0x0102,
            Self::PhysDefine(_) => 0x0103,
            Self::PhysReset => 0x0104,

            Self::EntitySpawn(_) => 0x0200,
            Self::EntitySpawnUntracked(_) => 0x0201,
            Self::EntityClone(_) => 0x0202,
            Self::EntityDestroy => 0x0203,
            Self::EntityAddComponent(_) => 0x0204,
            Self::EntityRemoveComponent(_) => 0x0205,
            Self::EntitySetPivot(_) => 0x0206,
            Self::EntitySetType(_) => 0x0207,
            Self::EntitySetFlags(_) => 0x0208,
            Self::EntityReset => 0x0209,
            Self::EntityClearFlags(_) => 0x020A,

            Self::AnimPlay(_) => 0x0300,
            Self::AnimStop => 0x0301,
            Self::AnimPause => 0x0302,
            Self::AnimResume => 0x0303,
            Self::AnimSetSpeed(_) => 0x0304,
            Self::AnimSetFrame(_) => 0x0305,
            Self::AnimSetLoop(_) => 0x0306,

            Self::RenderSetDepthMath(_) => 0x0400,
        }
    }

    /// Domain that consumes this command.
    pub const fn domain(&self) -> Domain {
        match self.code() & Domain::MASK {
            0x0100 => Domain::Phys,
            0x0200 => Domain::Entity,
            0x0300 => Domain::Anim,
            0x0400 => Domain::Render,
            _ => Domain::None,
        }
    }
}

/// One deferred mutation addressed to an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Command {
    pub entity: EntityHandle,
    pub kind: CommandKind,
}

static_assertions::const_assert!(std::mem::size_of::<Command>() <= 64);

impl Command {
    pub const NONE: Self = Self {
        entity: EntityHandle::INVALID,
        kind: CommandKind::None,
    };

    pub const fn new(entity: EntityHandle, kind: CommandKind) -> Self {
        Self { entity, kind }
    }

    /// Command with no target entity.
    pub const fn global(kind: CommandKind) -> Self {
        Self {
            entity: EntityHandle::INVALID,
            kind,
        }
    }

    pub const fn code(&self) -> u16 {
        self.kind.code()
    }

    pub const fn domain(&self) -> Domain {
        self.kind.domain()
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::NONE
    }
}
