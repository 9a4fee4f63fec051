//! Sprite atlas: sprite id to source rectangle.
//!
//! Atlases are usually loaded from a RON manifest:
//!
//! ```ron
//! (
//!     texture: (1),
//!     missing: (x: 0.0, y: 0.0, w: 16.0, h: 16.0),
//!     rects: [
//!         (x: 16.0, y: 0.0, w: 32.0, h: 32.0),
//!     ],
//! )
//! ```

use std::cell::Cell;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned while loading an [`Atlas`].
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read atlas: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse atlas: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Axis-aligned rectangle in texture pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Opaque backend texture id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Texture and sprite lookups the render path needs.
pub trait AssetProvider {
    /// Texture every sprite rectangle refers to.
    fn texture(&self) -> TextureHandle;

    /// Source rectangle of `sprite_id`; out-of-range ids yield the missing rect.
    fn sprite_rect(&self, sprite_id: u16) -> Rect;
}

/// Single-texture sprite atlas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Atlas {
    pub texture: TextureHandle,
    /// Rectangle returned for unknown sprite ids.
    pub missing: Rect,
    pub rects: Vec<Rect>,
    #[serde(skip)]
    fallbacks: Cell<u32>,
}

impl Atlas {
    pub fn new(texture: TextureHandle, missing: Rect, rects: Vec<Rect>) -> Self {
        Self {
            texture,
            missing,
            rects,
            fallbacks: Cell::new(0),
        }
    }

    /// Uniform sheet of `columns * rows` cells, row-major; the missing rect is
    /// the first cell.
    pub fn grid(texture: TextureHandle, columns: u32, rows: u32, cell_w: f32, cell_h: f32) -> Self {
        let rects = (0..rows)
            .flat_map(|row| {
                (0..columns).map(move |col| {
                    Rect::new(col as f32 * cell_w, row as f32 * cell_h, cell_w, cell_h)
                })
            })
            .collect();
        Self::new(texture, Rect::new(0.0, 0.0, cell_w, cell_h), rects)
    }

    pub fn from_ron(path: &Path) -> Result<Self, AssetError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(ron_str: &str) -> Result<Self, AssetError> {
        Ok(ron::from_str(ron_str)?)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Lookups that fell back to the missing rect so far.
    pub fn fallback_count(&self) -> u32 {
        self.fallbacks.get()
    }
}

impl AssetProvider for Atlas {
    fn texture(&self) -> TextureHandle {
        self.texture
    }

    fn sprite_rect(&self, sprite_id: u16) -> Rect {
        if let Some(rect) = self.rects.get(sprite_id as usize) {
            return *rect;
        }
        let seen = self.fallbacks.get();
        self.fallbacks.set(seen.saturating_add(1));
        if seen == 0 {
            warn!(
                "Sprite id {sprite_id} is outside the atlas ({} sprites), using the missing rect",
                self.rects.len()
            );
        } else {
            debug!("Sprite id {sprite_id} fell back to the missing rect");
        }
        self.missing
    }
}
