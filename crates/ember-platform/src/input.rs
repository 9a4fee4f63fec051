//! Action mapping: abstract game actions bound to physical keys.
//!
//! [`ActionMap`] says which [`Key`]s trigger which [`Action`]. [`ActionState`]
//! is recomputed once per frame from a [`KeySource`] and answers the
//! [`InputProvider`] queries the core makes.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Semantic actions the core and scenes query.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Back,
    Pause,
    /// Primary action (zoom in on the demo camera).
    Primary,
    /// Secondary action (zoom out on the demo camera).
    Secondary,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Confirm,
        Action::Back,
        Action::Pause,
        Action::Primary,
        Action::Secondary,
    ];

    #[inline]
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Physical keys and buttons an action can be bound to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    P,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Enter,
    Escape,
    Backspace,
    MouseLeft,
    MouseRight,
}

/// Per-frame key state.
pub trait KeySource {
    fn is_key_down(&self, key: Key) -> bool;
}

impl KeySource for FxHashSet<Key> {
    fn is_key_down(&self, key: Key) -> bool {
        self.contains(&key)
    }
}

/// Action queries consumed by game logic.
pub trait InputProvider {
    /// Held this frame.
    fn is_down(&self, action: Action) -> bool;

    /// Went down this frame.
    fn is_pressed(&self, action: Action) -> bool;

    /// Sample the underlying device; called once per frame during platform sync.
    fn update(&mut self) {}
}

/// Maps [`Action`]s to lists of [`Key`]s (OR logic).
///
/// Serializable to RON for user-editable bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMap {
    pub bindings: FxHashMap<Action, Vec<Key>>,
}

impl Default for ActionMap {
    fn default() -> Self {
        let mut bindings: FxHashMap<Action, Vec<Key>> = FxHashMap::default();
        bindings.insert(Action::Up, vec![Key::W, Key::ArrowUp]);
        bindings.insert(Action::Down, vec![Key::S, Key::ArrowDown]);
        bindings.insert(Action::Left, vec![Key::A, Key::ArrowLeft]);
        bindings.insert(Action::Right, vec![Key::D, Key::ArrowRight]);
        bindings.insert(Action::Confirm, vec![Key::Enter, Key::Space]);
        bindings.insert(Action::Back, vec![Key::Backspace]);
        bindings.insert(Action::Pause, vec![Key::Escape, Key::P]);
        bindings.insert(Action::Primary, vec![Key::E, Key::MouseLeft]);
        bindings.insert(Action::Secondary, vec![Key::Q, Key::MouseRight]);
        Self { bindings }
    }
}

impl ActionMap {
    /// Map with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: FxHashMap::default(),
        }
    }

    /// Replace every binding of `action` with `key`.
    pub fn remap(&mut self, action: Action, key: Key) {
        self.bindings.insert(action, vec![key]);
    }

    /// Add `key` to the bindings of `action`.
    pub fn bind(&mut self, action: Action, key: Key) {
        let keys = self.bindings.entry(action).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    pub fn keys(&self, action: Action) -> &[Key] {
        self.bindings.get(&action).map_or(&[], |v| v.as_slice())
    }

    /// Any bound key is down.
    pub fn is_triggered(&self, action: Action, source: &impl KeySource) -> bool {
        self.keys(action).iter().any(|&key| source.is_key_down(key))
    }

    /// Serialize to a RON string.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from a RON string.
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

/// Resolved action bits for the current and previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionState {
    down: u16,
    previous: u16,
}

impl ActionState {
    /// Recompute from `source` through `map`.
    pub fn poll(&mut self, map: &ActionMap, source: &impl KeySource) {
        self.previous = self.down;
        self.down = Action::ALL
            .iter()
            .filter(|&&action| map.is_triggered(action, source))
            .fold(0, |bits, action| bits | action.bit());
    }

    pub fn is_down(&self, action: Action) -> bool {
        self.down & action.bit() != 0
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.down & !self.previous & action.bit() != 0
    }
}

/// Headless input: keys are held and released by code.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    map: ActionMap,
    held: FxHashSet<Key>,
    state: ActionState,
}

impl ScriptedInput {
    pub fn new(map: ActionMap) -> Self {
        Self {
            map,
            held: FxHashSet::default(),
            state: ActionState::default(),
        }
    }

    pub fn map(&self) -> &ActionMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut ActionMap {
        &mut self.map
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }
}

impl KeySource for ScriptedInput {
    fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}

impl InputProvider for ScriptedInput {
    fn is_down(&self, action: Action) -> bool {
        self.state.is_down(action)
    }

    fn is_pressed(&self, action: Action) -> bool {
        self.state.is_pressed(action)
    }

    fn update(&mut self) {
        self.state.poll(&self.map, &self.held);
    }
}
