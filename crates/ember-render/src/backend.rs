//! Pluggable draw backend and a recording implementation.
//!
//! The render system only ever talks to a [`DrawBackend`]. A windowed
//! backend would translate the calls into GPU work; [`RecordingBackend`]
//! resolves them exactly as a real backend would (atlas lookups, flips,
//! pivots) and keeps the result as a list of [`DrawCall`]s.

use ember_ecs::Color;
use ember_platform::{AssetProvider, Rect, TextureHandle, ViewportSize};
use glam::Vec2;
use tracing::debug;

use crate::batch::{BlendMode, FilterMode, RenderState};

/// World-mode camera handed to the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera2D {
    /// Screen-space point the target is drawn at (the canvas centre).
    pub offset: Vec2,
    /// World-space point the camera looks at, shake included.
    pub target: Vec2,
    pub zoom: f32,
    /// Degrees.
    pub rotation: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            target: Vec2::ZERO,
            zoom: 1.0,
            rotation: 0.0,
        }
    }
}

/// One sprite as the render system submits it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteDraw {
    pub sprite_id: u16,
    pub position: Vec2,
    pub size: Vec2,
    /// Normalized pivot, `(0.5, 0.5)` is the centre.
    pub pivot: Vec2,
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub tint: Color,
}

/// Drawing surface the render path drives.
pub trait DrawBackend {
    fn begin_frame(&mut self);
    fn end_frame(&mut self);
    fn begin_world(&mut self, camera: &Camera2D);
    fn end_world(&mut self);
    /// Switch texture, shader, blend and filter for the following sprites.
    fn set_state(&mut self, state: &RenderState);
    fn draw_sprite(&mut self, sprite: &SpriteDraw);
    /// Close the current batch and return to default state.
    fn end_batch(&mut self);
    /// Rebuild the virtual canvas after a viewport resize.
    fn recreate_canvas(&mut self, viewport: ViewportSize);
}

/// A resolved backend call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCall {
    BeginFrame,
    EndFrame,
    BeginWorld(Camera2D),
    EndWorld,
    SetState {
        texture: TextureHandle,
        shader: Option<u32>,
        blend: BlendMode,
        filter: FilterMode,
    },
    Sprite {
        sprite_id: u16,
        /// Atlas rectangle; negative extents mean flipped.
        source: Rect,
        dest: Rect,
        /// Pivot in pixels relative to `dest`.
        origin: Vec2,
        rotation: f32,
        tint: Color,
        texture: TextureHandle,
    },
    EndBatch,
    RecreateCanvas {
        width: u32,
        height: u32,
    },
}

/// Headless backend that records every resolved call of the current frame.
///
/// [`begin_frame`](DrawBackend::begin_frame) drops the previous frame's calls.
pub struct RecordingBackend {
    assets: Box<dyn AssetProvider>,
    calls: Vec<DrawCall>,
    atlas: TextureHandle,
    current_texture: TextureHandle,
    canvas: (u32, u32),
}

impl RecordingBackend {
    pub fn new(assets: Box<dyn AssetProvider>, viewport: ViewportSize) -> Self {
        let atlas = assets.texture();
        Self {
            assets,
            calls: Vec::new(),
            atlas,
            current_texture: atlas,
            canvas: canvas_size(viewport),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drop everything recorded so far.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn assets(&self) -> &dyn AssetProvider {
        self.assets.as_ref()
    }

    /// Virtual canvas size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    /// Sprite ids in draw order.
    pub fn drawn_sprites(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Sprite { sprite_id, .. } => Some(*sprite_id),
                _ => None,
            })
            .collect()
    }

    pub fn sprite_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Sprite { .. }))
            .count()
    }

    pub fn state_changes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::SetState { .. }))
            .count()
    }
}

fn canvas_size(viewport: ViewportSize) -> (u32, u32) {
    (viewport.width.round() as u32, viewport.height.round() as u32)
}

impl DrawBackend for RecordingBackend {
    fn begin_frame(&mut self) {
        self.atlas = self.assets.texture();
        self.current_texture = self.atlas;
        self.calls.clear();
        self.calls.push(DrawCall::BeginFrame);
    }

    fn end_frame(&mut self) {
        self.calls.push(DrawCall::EndFrame);
    }

    fn begin_world(&mut self, camera: &Camera2D) {
        self.calls.push(DrawCall::BeginWorld(*camera));
    }

    fn end_world(&mut self) {
        self.calls.push(DrawCall::EndWorld);
    }

    fn set_state(&mut self, state: &RenderState) {
        self.current_texture = state.texture.unwrap_or(self.atlas);
        self.calls.push(DrawCall::SetState {
            texture: self.current_texture,
            shader: state.shader,
            blend: state.blend,
            filter: state.filter,
        });
    }

    fn draw_sprite(&mut self, sprite: &SpriteDraw) {
        let mut source = self.assets.sprite_rect(sprite.sprite_id);
        if sprite.flip_x {
            source.w = -source.w;
        }
        if sprite.flip_y {
            source.h = -source.h;
        }
        self.calls.push(DrawCall::Sprite {
            sprite_id: sprite.sprite_id,
            source,
            dest: Rect::new(sprite.position.x, sprite.position.y, sprite.size.x, sprite.size.y),
            origin: sprite.size * sprite.pivot,
            rotation: sprite.rotation,
            tint: sprite.tint,
            texture: self.current_texture,
        });
    }

    fn end_batch(&mut self) {
        self.calls.push(DrawCall::EndBatch);
    }

    fn recreate_canvas(&mut self, viewport: ViewportSize) {
        self.canvas = canvas_size(viewport);
        debug!("Canvas recreated at {}x{}", self.canvas.0, self.canvas.1);
        self.calls.push(DrawCall::RecreateCanvas {
            width: self.canvas.0,
            height: self.canvas.1,
        });
    }
}
