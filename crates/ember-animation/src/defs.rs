//! Animation definitions.
//!
//! An [`AnimTable`] is indexed by animation id. Tables are usually loaded
//! from a RON manifest:
//!
//! ```ron
//! (
//!     anims: [
//!         (frame_duration: 0.1, frame_count: 4, start_sprite: 0, looping: true),
//!         (frame_duration: 0.05, frame_count: 6, start_sprite: 4, looping: false),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while loading an [`AnimTable`].
#[derive(Debug, Error)]
pub enum AnimTableError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ron parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// More definitions than a `u16` animation id can address.
    #[error("too many animations: {0}")]
    TooMany(usize),

    /// The last frame's sprite id does not fit in a `u16`.
    #[error("animation {anim_id}: {frame_count} frames from sprite {start_sprite} overflow the sprite range")]
    SpriteRange {
        anim_id: usize,
        start_sprite: u16,
        frame_count: u16,
    },
}

/// One sprite-sheet animation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimDef {
    /// Seconds each frame is shown at speed 1.0.
    pub frame_duration: f32,
    pub frame_count: u16,
    /// Sprite id of frame 0; frames are consecutive sprite ids.
    pub start_sprite: u16,
    pub looping: bool,
}

impl AnimDef {
    pub const fn new(frame_duration: f32, frame_count: u16, start_sprite: u16, looping: bool) -> Self {
        Self {
            frame_duration,
            frame_count,
            start_sprite,
            looping,
        }
    }

    /// Sprite id of the final frame, `None` if it overflows `u16`.
    pub fn last_sprite(&self) -> Option<u16> {
        self.start_sprite.checked_add(self.frame_count.saturating_sub(1))
    }
}

/// Animation definitions indexed by animation id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimTable {
    anims: Vec<AnimDef>,
}

impl AnimTable {
    pub fn new(anims: Vec<AnimDef>) -> Self {
        Self { anims }
    }

    /// Load a table from a RON manifest on disk.
    pub fn from_ron(path: &Path) -> Result<Self, AnimTableError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(ron_str: &str) -> Result<Self, AnimTableError> {
        let table: AnimTable = ron::from_str(ron_str)?;
        if table.anims.len() > u16::MAX as usize {
            return Err(AnimTableError::TooMany(table.anims.len()));
        }
        if let Some((anim_id, def)) = table
            .anims
            .iter()
            .enumerate()
            .find(|(_, def)| def.last_sprite().is_none())
        {
            return Err(AnimTableError::SpriteRange {
                anim_id,
                start_sprite: def.start_sprite,
                frame_count: def.frame_count,
            });
        }
        Ok(table)
    }

    /// Append a definition, returning its id.
    pub fn push(&mut self, def: AnimDef) -> u16 {
        self.anims.push(def);
        (self.anims.len() - 1) as u16
    }

    pub fn get(&self, anim_id: u16) -> Option<&AnimDef> {
        self.anims.get(anim_id as usize)
    }

    pub fn len(&self) -> usize {
        self.anims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"(
        anims: [
            (frame_duration: 0.1, frame_count: 4, start_sprite: 0, looping: true),
            (frame_duration: 0.05, frame_count: 6, start_sprite: 4, looping: false),
        ],
    )"#;

    #[test]
    fn test_parse_manifest() {
        let table = AnimTable::from_ron_str(MANIFEST).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1), Some(&AnimDef::new(0.05, 6, 4, false)));
        assert_eq!(table.get(2), None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anims.ron");
        std::fs::write(&path, MANIFEST).unwrap();
        let table = AnimTable::from_ron(&path).unwrap();
        assert_eq!(table.get(0).map(|d| d.frame_count), Some(4));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AnimTable::from_ron(&dir.path().join("nope.ron"));
        assert!(matches!(result, Err(AnimTableError::Io(_))));
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        let result = AnimTable::from_ron_str("(anims: [ (frame_count: ) ])");
        assert!(matches!(result, Err(AnimTableError::Ron(_))));
    }

    #[test]
    fn test_sprite_range_overflow_is_rejected() {
        let manifest = r#"(
            anims: [
                (frame_duration: 0.1, frame_count: 2, start_sprite: 0, looping: true),
                (frame_duration: 0.1, frame_count: 4, start_sprite: 65534, looping: true),
            ],
        )"#;
        let result = AnimTable::from_ron_str(manifest);
        assert!(matches!(
            result,
            Err(AnimTableError::SpriteRange {
                anim_id: 1,
                start_sprite: 65534,
                frame_count: 4,
            })
        ));
    }

    #[test]
    fn test_last_sprite() {
        assert_eq!(AnimDef::new(0.1, 4, 10, true).last_sprite(), Some(13));
        assert_eq!(AnimDef::new(0.1, 2, u16::MAX - 1, true).last_sprite(), Some(u16::MAX));
        assert_eq!(AnimDef::new(0.1, 3, u16::MAX - 1, true).last_sprite(), None);
        assert_eq!(AnimDef::new(0.1, 0, u16::MAX, true).last_sprite(), Some(u16::MAX));
    }

    #[test]
    fn test_push_returns_ids() {
        let mut table = AnimTable::default();
        assert!(table.is_empty());
        assert_eq!(table.push(AnimDef::new(0.1, 3, 10, true)), 0);
        assert_eq!(table.push(AnimDef::new(0.1, 3, 13, true)), 1);
    }
}
