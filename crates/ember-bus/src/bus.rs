//! Ring buffer with snapshot iterators and phase/domain gating.
//!
//! `head` and `tail` are free-running `u32` counters that wrap naturally; the
//! slot index is `counter & (N - 1)`. `head - tail` (wrapping) is the number
//! of unflushed commands and never exceeds `N`, so a push can never overwrite
//! a command a reader has not flushed yet.

use thiserror::Error;
use tracing::{debug, warn};

use crate::command::{Command, Domain};

/// Default ring size.
pub const CMD_BUFFER_SIZE: u32 = 16_384;

/// Which frame phase is currently pushing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BusPhase {
    #[default]
    Open,
    Simulation,
    /// Only RENDER-domain (and NONE) commands are accepted.
    Render,
}

/// Why a push was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    /// The ring holds `capacity` unflushed commands.
    #[error("command bus is full ({capacity} commands)")]
    Full { capacity: u32 },

    /// The domain is locked out, e.g. while entity hooks are dispatching.
    #[error("{domain:?} commands are forbidden right now")]
    ForbiddenDomain { domain: Domain },

    /// Only render commands may be pushed during the render phase.
    #[error("{domain:?} command pushed during the render phase")]
    RenderPhase { domain: Domain },
}

/// Snapshot of the unread range `[current, end)` at creation time.
///
/// Later pushes do not extend it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandIter {
    current: u32,
    end: u32,
}

impl CommandIter {
    /// Commands left in this snapshot.
    pub fn remaining(&self) -> u32 {
        self.end.wrapping_sub(self.current)
    }

    pub fn is_done(&self) -> bool {
        self.current == self.end
    }

    /// Exclusive end of the snapshot.
    pub fn end(&self) -> u32 {
        self.end
    }
}

/// Fixed-size single-writer command ring.
pub struct CommandBus {
    buffer: Vec<Command>,
    mask: u32,
    head: u32,
    tail: u32,
    consumed_end: u32,
    phase: BusPhase,
    forbidden_domain: Option<Domain>,
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new(CMD_BUFFER_SIZE)
    }
}

impl CommandBus {
    /// Create a bus holding `capacity` commands.
    ///
    /// `capacity` is rounded up to the next power of two.
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            buffer: vec![Command::NONE; capacity as usize],
            mask: capacity - 1,
            head: 0,
            tail: 0,
            consumed_end: 0,
            phase: BusPhase::Open,
            forbidden_domain: None,
        }
    }

    /// Ring size.
    pub fn capacity(&self) -> u32 {
        self.mask + 1
    }

    /// Number of unflushed commands.
    pub fn count(&self) -> u32 {
        self.head.wrapping_sub(self.tail)
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        self.count() >= self.capacity()
    }

    /// End of the most recent snapshot handed out.
    pub fn consumed_end(&self) -> u32 {
        self.consumed_end
    }

    pub fn phase(&self) -> BusPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: BusPhase) {
        self.phase = phase;
    }

    pub fn forbidden_domain(&self) -> Option<Domain> {
        self.forbidden_domain
    }

    /// Lock a domain out of [`push`](Self::push) until cleared with `None`.
    pub fn set_forbidden_domain(&mut self, domain: Option<Domain>) {
        self.forbidden_domain = domain;
    }

    /// Append a command, reporting why it was rejected.
    pub fn try_push(&mut self, cmd: Command) -> Result<(), PushError> {
        if self.is_full() {
            return Err(PushError::Full {
                capacity: self.capacity(),
            });
        }

        let domain = cmd.domain();
        if self.phase == BusPhase::Render && !matches!(domain, Domain::Render | Domain::None) {
            return Err(PushError::RenderPhase { domain });
        }
        if self.forbidden_domain == Some(domain) {
            return Err(PushError::ForbiddenDomain { domain });
        }

        let slot = (self.head & self.mask) as usize;
        self.buffer[slot] = cmd;
        self.head = self.head.wrapping_add(1);
        Ok(())
    }

    /// Append a command. Returns `false` if the bus is full or the command's
    /// domain is not accepted right now.
    pub fn push(&mut self, cmd: Command) -> bool {
        match self.try_push(cmd) {
            Ok(()) => true,
            Err(err @ PushError::ForbiddenDomain { .. }) => {
                debug!("{err}");
                false
            }
            Err(err) => {
                warn!("{err}");
                false
            }
        }
    }

    /// Snapshot the unread range. Stamps `consumed_end`.
    pub fn iterator(&mut self) -> CommandIter {
        self.consumed_end = self.head;
        CommandIter {
            current: self.tail,
            end: self.head,
        }
    }

    /// Next command in the snapshot, borrowed from the ring.
    pub fn next(&self, iter: &mut CommandIter) -> Option<&Command> {
        if iter.is_done() {
            return None;
        }
        let cmd = &self.buffer[(iter.current & self.mask) as usize];
        iter.current = iter.current.wrapping_add(1);
        Some(cmd)
    }

    /// Release everything up to the snapshot's end.
    pub fn flush(&mut self, iter: &CommandIter) {
        self.tail = iter.end;
    }

    /// Drop all commands and reset the counters and gates.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.consumed_end = 0;
        self.phase = BusPhase::Open;
        self.forbidden_domain = None;
    }

    #[cfg(test)]
    fn set_counters(&mut self, value: u32) {
        self.head = value;
        self.tail = value;
        self.consumed_end = value;
    }
}
