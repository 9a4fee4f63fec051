//! Batch id to backend render state.

use ember_platform::TextureHandle;

/// Number of addressable batch ids.
pub const MAX_BATCHES: usize = 256;

/// Batch ids registered by [`BatchTable::new`].
pub mod batch_ids {
    pub const DEFAULT: u8 = 0;
    pub const PLAYER: u8 = 1;
    pub const ENEMY: u8 = 2;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Multiplied,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest-neighbour sampling for pixel art.
    #[default]
    Point,
    Bilinear,
}

/// Backend state selected whenever the batch id changes during dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderState {
    /// `None` draws from the atlas texture.
    pub texture: Option<TextureHandle>,
    /// `None` uses the default shader.
    pub shader: Option<u32>,
    pub blend: BlendMode,
    pub filter: FilterMode,
}

/// Fixed table of [`RenderState`]s indexed by batch id.
#[derive(Clone, Debug)]
pub struct BatchTable {
    states: Box<[RenderState; MAX_BATCHES]>,
}

impl Default for BatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchTable {
    /// Table with the built-in batches using the atlas texture, alpha blending
    /// and point filtering.
    pub fn new() -> Self {
        let mut table = Self {
            states: Box::new([RenderState::default(); MAX_BATCHES]),
        };
        for id in [batch_ids::DEFAULT, batch_ids::PLAYER, batch_ids::ENEMY] {
            table.register(id, RenderState::default());
        }
        table
    }

    pub fn register(&mut self, batch_id: u8, state: RenderState) {
        self.states[batch_id as usize] = state;
    }

    #[inline]
    pub fn get(&self, batch_id: u8) -> RenderState {
        self.states[batch_id as usize]
    }
}
