//! Deferred command ring buffer.
//!
//! Systems never mutate each other's data directly: they push [`Command`]s
//! onto the [`CommandBus`], and the owning system drains its own domain at the
//! start of its phase. Readers take a snapshot [`CommandIter`]; the frame's
//! cleanup phase flushes the tail up to the latest snapshot end.

pub mod bus;
pub mod command;

pub use bus::{BusPhase, CMD_BUFFER_SIZE, CommandBus, CommandIter, PushError};
pub use command::{
    AnimPlay, Command, CommandKind, Domain, EntityClone, PhysDef, RenderDepth, anim_flags,
    phys_flags,
};
