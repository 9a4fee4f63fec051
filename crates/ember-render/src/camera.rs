//! 2D camera: follow smoothing, shake, zoom limits and view/cull bounds.

use ember_ecs::{EntityHandle, Registry};
use ember_platform::ViewportSize;
use ember_spatial::Aabb;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::backend::Camera2D;

/// Upper clamp on the camera update delta.
pub const CAMERA_MAX_DT: f32 = 0.05;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraMode {
    /// Position is only changed by explicit calls.
    #[default]
    Manual,
    /// Smoothly track the target entity.
    Follow,
    /// Scripted movement driven by the scene.
    Cinematic,
    /// Position is frozen.
    Locked,
}

/// Camera limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// World units added on every side of the view for culling.
    pub cull_margin: f32,
    /// Follow smoothing rate; 0 snaps to the target.
    pub smooth_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            min_zoom: 0.2,
            max_zoom: 5.0,
            cull_margin: 256.0,
            smooth_speed: 10.0,
        }
    }
}

/// Per-engine camera state.
#[derive(Clone, Debug)]
pub struct CameraSystem {
    settings: CameraSettings,
    position: Vec2,
    zoom: f32,
    /// Degrees.
    rotation: f32,
    target: EntityHandle,
    mode: CameraMode,
    smooth_speed: f32,
    shake_timer: f32,
    shake_intensity: f32,
    shake_offset: Vec2,
    viewport: ViewportSize,
    base_diagonal: f32,
    rng: Xoshiro256StarStar,
}

impl CameraSystem {
    pub fn new(settings: CameraSettings, viewport: ViewportSize) -> Self {
        Self::with_seed(settings, viewport, 0x00C0_FFEE)
    }

    /// Camera whose shake sequence is reproducible from `seed`.
    pub fn with_seed(settings: CameraSettings, viewport: ViewportSize, seed: u64) -> Self {
        let mut camera = Self {
            settings,
            position: Vec2::ZERO,
            zoom: 1.0,
            rotation: 0.0,
            target: EntityHandle::INVALID,
            mode: CameraMode::Manual,
            smooth_speed: settings.smooth_speed.max(0.0),
            shake_timer: 0.0,
            shake_intensity: 0.0,
            shake_offset: Vec2::ZERO,
            viewport,
            base_diagonal: 0.0,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        };
        camera.set_zoom(1.0);
        camera.update_viewport_cache(viewport);
        camera
    }

    /// Advance follow smoothing and shake.
    pub fn update(&mut self, reg: &Registry, dt: f32) {
        let dt = dt.clamp(0.0, CAMERA_MAX_DT);

        if self.mode == CameraMode::Follow && reg.is_alive(self.target) {
            let target = reg.position(self.target.index());
            self.position = if self.smooth_speed > 0.0 {
                let alpha = 1.0 - (-self.smooth_speed * dt).exp();
                self.position.lerp(target, alpha)
            } else {
                target
            };
        }

        if self.shake_timer > 0.0 && self.shake_intensity > 0.0 {
            let i = self.shake_intensity;
            self.shake_offset = Vec2::new(self.rng.gen_range(-i..=i), self.rng.gen_range(-i..=i));
            self.shake_timer -= dt;
            if self.shake_timer <= 0.0 {
                self.shake_timer = 0.0;
                self.shake_intensity = 0.0;
                self.shake_offset = Vec2::ZERO;
            }
        } else {
            self.shake_offset = Vec2::ZERO;
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Jump straight to `position`.
    pub fn center_on(&mut self, position: Vec2) {
        self.set_position(position);
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = if zoom.is_nan() { 1.0 } else { zoom };
        self.zoom = zoom.clamp(self.settings.min_zoom, self.settings.max_zoom);
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
    }

    pub fn target(&self) -> EntityHandle {
        self.target
    }

    pub fn set_target(&mut self, target: EntityHandle) {
        self.target = target;
    }

    pub fn smooth_speed(&self) -> f32 {
        self.smooth_speed
    }

    pub fn set_smooth_speed(&mut self, speed: f32) {
        self.smooth_speed = speed.max(0.0);
    }

    /// Shake for `duration` seconds with offsets up to `intensity` units.
    pub fn start_shake(&mut self, intensity: f32, duration: f32) {
        if intensity <= 0.0 || duration <= 0.0 {
            return;
        }
        self.shake_intensity = intensity;
        self.shake_timer = duration;
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_timer > 0.0
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shake_offset
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Store the viewport and its diagonal.
    pub fn update_viewport_cache(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
        self.base_diagonal = Vec2::new(viewport.width, viewport.height).length();
    }

    // -----------------------------------------------------------------------
    // Projection
    // -----------------------------------------------------------------------

    /// Backend camera for world mode.
    pub fn internal(&self) -> Camera2D {
        Camera2D {
            offset: Vec2::new(self.viewport.width, self.viewport.height) * 0.5,
            target: self.position + self.shake_offset,
            zoom: self.zoom,
            rotation: self.rotation,
        }
    }

    /// Visible world rectangle; a conservative square when rotated.
    pub fn view_bounds(&self) -> Aabb {
        if self.rotation != 0.0 {
            let diagonal = self.base_diagonal / self.zoom;
            return Aabb::new(
                self.position.x - diagonal * 0.5,
                self.position.y - diagonal * 0.5,
                diagonal,
                diagonal,
            );
        }
        let w = self.viewport.width / self.zoom;
        let h = self.viewport.height / self.zoom;
        Aabb::new(self.position.x - w * 0.5, self.position.y - h * 0.5, w, h)
    }

    /// View bounds inflated by the cull margin.
    pub fn cull_bounds(&self) -> Aabb {
        let view = self.view_bounds();
        let m = self.settings.cull_margin;
        Aabb::new(view.x - m, view.y - m, view.w + 2.0 * m, view.h + 2.0 * m)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let cam = self.internal();
        Vec2::from_angle(cam.rotation.to_radians()).rotate((world - cam.target) * cam.zoom) + cam.offset
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let cam = self.internal();
        Vec2::from_angle(-cam.rotation.to_radians()).rotate(screen - cam.offset) / cam.zoom + cam.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ecs::{components, state};

    fn viewport() -> ViewportSize {
        ViewportSize::from_window(1280, 720, 1080)
    }

    fn camera() -> CameraSystem {
        CameraSystem::new(CameraSettings::default(), viewport())
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut cam = camera();
        cam.set_zoom(100.0);
        assert_eq!(cam.zoom(), 5.0);
        cam.set_zoom(0.0);
        assert_eq!(cam.zoom(), 0.2);
        cam.set_zoom(f32::NAN);
        assert_eq!(cam.zoom(), 1.0);
    }

    #[test]
    fn test_view_and_cull_bounds() {
        let mut cam = camera();
        cam.set_position(Vec2::new(100.0, 50.0));
        cam.set_zoom(2.0);
        let view = cam.view_bounds();
        assert!((view.w - 960.0).abs() < 1e-3);
        assert!((view.h - 540.0).abs() < 1e-3);
        assert!((view.x - (100.0 - 480.0)).abs() < 1e-3);

        let cull = cam.cull_bounds();
        assert!((cull.w - (960.0 + 512.0)).abs() < 1e-3);
        assert!((cull.x - (view.x - 256.0)).abs() < 1e-3);
    }

    #[test]
    fn test_rotated_bounds_cover_diagonal() {
        let mut cam = camera();
        cam.set_rotation(30.0);
        let view = cam.view_bounds();
        let diagonal = (1920.0f32 * 1920.0 + 1080.0 * 1080.0).sqrt();
        assert!((view.w - diagonal).abs() < 1e-2);
        assert_eq!(view.w, view.h);
    }

    #[test]
    fn test_follow_smooths_toward_target() {
        let mut reg = Registry::new(8);
        let target = reg.create(1, Vec2::new(100.0, 0.0), components::POSITION, state::VISIBLE);
        let mut cam = camera();
        cam.set_mode(CameraMode::Follow);
        cam.set_target(target);

        cam.update(&reg, 0.016);
        let alpha = 1.0 - (-10.0f32 * 0.016).exp();
        assert!((cam.position().x - 100.0 * alpha).abs() < 1e-3);

        for _ in 0..500 {
            cam.update(&reg, 0.016);
        }
        assert!((cam.position().x - 100.0).abs() < 1e-2);
    }

    #[test]
    fn test_follow_with_zero_speed_snaps() {
        let mut reg = Registry::new(8);
        let target = reg.create(1, Vec2::new(-40.0, 25.0), components::POSITION, 0);
        let mut cam = camera();
        cam.set_mode(CameraMode::Follow);
        cam.set_target(target);
        cam.set_smooth_speed(-3.0);
        assert_eq!(cam.smooth_speed(), 0.0);
        cam.update(&reg, 0.016);
        assert_eq!(cam.position(), Vec2::new(-40.0, 25.0));
    }

    #[test]
    fn test_dead_target_is_ignored() {
        let mut reg = Registry::new(8);
        let target = reg.create(1, Vec2::new(100.0, 0.0), 0, 0);
        reg.destroy(target);
        let mut cam = camera();
        cam.set_mode(CameraMode::Follow);
        cam.set_target(target);
        cam.update(&reg, 0.016);
        assert_eq!(cam.position(), Vec2::ZERO);
    }

    #[test]
    fn test_manual_mode_does_not_follow() {
        let mut reg = Registry::new(8);
        let target = reg.create(1, Vec2::new(100.0, 0.0), 0, 0);
        let mut cam = camera();
        cam.set_target(target);
        cam.update(&reg, 0.016);
        assert_eq!(cam.position(), Vec2::ZERO);
    }

    #[test]
    fn test_shake_bounded_and_expires() {
        let reg = Registry::new(1);
        let mut cam = camera();
        cam.start_shake(4.0, 0.1);
        cam.update(&reg, 0.05);
        let offset = cam.shake_offset();
        assert!(offset.x.abs() <= 4.0 && offset.y.abs() <= 4.0);
        assert!(cam.is_shaking());
        assert_eq!(cam.internal().target, cam.position() + offset);

        cam.update(&reg, 0.05);
        assert!(!cam.is_shaking());
        assert_eq!(cam.shake_offset(), Vec2::ZERO);
    }

    #[test]
    fn test_invalid_shake_ignored() {
        let mut cam = camera();
        cam.start_shake(0.0, 1.0);
        cam.start_shake(3.0, -1.0);
        assert!(!cam.is_shaking());
    }

    #[test]
    fn test_same_seed_same_shake() {
        let reg = Registry::new(1);
        let mut a = CameraSystem::with_seed(CameraSettings::default(), viewport(), 7);
        let mut b = CameraSystem::with_seed(CameraSettings::default(), viewport(), 7);
        a.start_shake(5.0, 1.0);
        b.start_shake(5.0, 1.0);
        a.update(&reg, 0.01);
        b.update(&reg, 0.01);
        assert_eq!(a.shake_offset(), b.shake_offset());
    }

    #[test]
    fn test_screen_world_round_trip() {
        let mut cam = camera();
        cam.set_position(Vec2::new(300.0, -120.0));
        cam.set_zoom(1.5);
        cam.set_rotation(20.0);
        let world = Vec2::new(320.0, -80.0);
        let back = cam.screen_to_world(cam.world_to_screen(world));
        assert!((back - world).length() < 1e-2);

        cam.set_rotation(0.0);
        let centre = cam.world_to_screen(cam.position());
        assert!((centre - Vec2::new(960.0, 540.0)).length() < 1e-2);
    }
}
