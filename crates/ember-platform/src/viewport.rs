//! Virtual canvas size with debounced resize reporting.

use tracing::info;

/// Default height of the virtual canvas.
pub const VIRTUAL_HEIGHT: u32 = 1080;

/// Frames a resize request must stay unchanged before it is applied.
pub const RESIZE_DEBOUNCE_FRAMES: u32 = 12;

/// Size of the virtual canvas the world is drawn into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
    /// `width / height`.
    pub aspect: f32,
}

impl ViewportSize {
    /// Canvas of `virtual_height` whose width follows the window aspect ratio.
    pub fn from_window(window_width: u32, window_height: u32, virtual_height: u32) -> Self {
        let aspect = window_width.max(1) as f32 / window_height.max(1) as f32;
        let height = virtual_height.max(1) as f32;
        Self {
            width: height * aspect,
            height,
            aspect,
        }
    }
}

/// Source of the canvas size, read during platform sync.
pub trait ViewportProvider {
    fn get(&self) -> ViewportSize;

    /// Advance one frame of resize bookkeeping.
    fn update(&mut self);

    /// True on the single frame a settled resize was applied.
    fn was_resized(&self) -> bool;
}

/// Window-less viewport driven by explicit resize requests.
#[derive(Clone, Debug)]
pub struct HeadlessViewport {
    window: (u32, u32),
    pending: Option<(u32, u32)>,
    stable_frames: u32,
    debounce_frames: u32,
    virtual_height: u32,
    size: ViewportSize,
    resized: bool,
}

impl HeadlessViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_settings(width, height, VIRTUAL_HEIGHT, RESIZE_DEBOUNCE_FRAMES)
    }

    pub fn with_settings(width: u32, height: u32, virtual_height: u32, debounce_frames: u32) -> Self {
        Self {
            window: (width, height),
            pending: None,
            stable_frames: 0,
            debounce_frames,
            virtual_height,
            size: ViewportSize::from_window(width, height, virtual_height),
            resized: false,
        }
    }

    /// Physical window size currently applied.
    pub fn window_size(&self) -> (u32, u32) {
        self.window
    }

    /// Queue a window resize. A new request restarts the debounce window.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if self.pending == Some((width, height)) {
            return;
        }
        if self.pending.is_none() && self.window == (width, height) {
            return;
        }
        self.pending = Some((width, height));
        self.stable_frames = 0;
    }
}

impl ViewportProvider for HeadlessViewport {
    fn get(&self) -> ViewportSize {
        self.size
    }

    fn update(&mut self) {
        self.resized = false;
        let Some((width, height)) = self.pending else {
            return;
        };
        self.stable_frames += 1;
        if self.stable_frames < self.debounce_frames {
            return;
        }

        self.pending = None;
        self.stable_frames = 0;
        if self.window == (width, height) {
            return;
        }
        self.window = (width, height);
        self.size = ViewportSize::from_window(width, height, self.virtual_height);
        self.resized = true;
        info!(
            "Viewport resized to {width}x{height} (virtual {:.0}x{:.0})",
            self.size.width, self.size.height
        );
    }

    fn was_resized(&self) -> bool {
        self.resized
    }
}
