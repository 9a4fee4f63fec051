//! Platform collaborators consumed by the Ember core.
//!
//! The core never talks to a window, a keyboard or an image loader directly.
//! It reads a [`ViewportProvider`], an [`InputProvider`] and an
//! [`AssetProvider`]; the headless implementations here drive tests and the
//! demo binary.

pub mod assets;
pub mod input;
pub mod paths;
pub mod viewport;

pub use assets::{AssetError, AssetProvider, Atlas, Rect, TextureHandle};
pub use input::{Action, ActionMap, ActionState, InputProvider, Key, KeySource, ScriptedInput};
pub use paths::{PlatformDirs, PlatformError};
pub use viewport::{HeadlessViewport, ViewportProvider, ViewportSize};
