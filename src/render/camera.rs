//! Camera interface and a fly camera.

use crate::util::{Mat4, Vec3};

use super::settings::Settings;

/// View rays through the four image corners, relative to the eye.
///
/// `r00` is bottom-left, `r10` bottom-right, `r01` top-left, `r11` top-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerRays {
    pub r00: Vec3,
    pub r10: Vec3,
    pub r01: Vec3,
    pub r11: Vec3,
}

/// What the renderer needs from a camera.
pub trait Camera {
    fn position(&self) -> Vec3;
    fn view(&self) -> Mat4;
    fn perspective(&self) -> Mat4;

    /// Rebuild the projection for a new aspect ratio.
    fn update_perspective(&mut self, aspect: f32);

    /// Rebuild the view matrix from the current pose.
    fn update_view(&mut self);

    /// Unproject the NDC corners on the z = 0 plane and subtract the eye.
    fn corner_rays(&self) -> CornerRays {
        let inv = (self.perspective() * self.view()).inverse();
        let eye = self.position();
        let corner = |x: f32, y: f32| inv.project_point3(Vec3::new(x, y, 0.0)) - eye;
        CornerRays {
            r00: corner(-1.0, -1.0),
            r10: corner(1.0, -1.0),
            r01: corner(-1.0, 1.0),
            r11: corner(1.0, 1.0),
        }
    }
}

const MAX_PITCH_DEGREES: f32 = 89.0;

/// Free-flying camera steered by yaw and pitch.
///
/// Yaw 0 / pitch 0 looks down -Z with +Y up. Uses an infinite right-handed
/// perspective, so the z = 0 plane in NDC is the near plane.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Degrees, positive turns right.
    pub yaw: f32,
    /// Degrees, clamped to +-89.
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    view: Mat4,
    perspective: Mat4,
}

impl FlyCamera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            yaw,
            pitch: pitch.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES),
            fov: 45.0,
            near: 0.1,
            view: Mat4::IDENTITY,
            perspective: Mat4::IDENTITY,
        };
        camera.update_view();
        camera.update_perspective(1.0);
        camera
    }

    /// Camera using the lens from `settings`.
    pub fn from_settings(position: Vec3, yaw: f32, pitch: f32, settings: &Settings) -> Self {
        let mut camera = Self::new(position, yaw, pitch);
        camera.fov = settings.fov_degrees;
        camera.near = settings.near_plane;
        camera.update_perspective(1.0);
        camera
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.sin() * pitch.cos(), pitch.sin(), -yaw.cos() * pitch.cos())
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Turn by degree deltas.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
    }

    /// Move relative to the current heading.
    pub fn fly(&mut self, forward: f32, right: f32, up: f32) {
        self.position += self.forward() * forward + self.right() * right + Vec3::Y * up;
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 0.0)
    }
}

impl Camera for FlyCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn view(&self) -> Mat4 {
        self.view
    }

    fn perspective(&self) -> Mat4 {
        self.perspective
    }

    fn update_perspective(&mut self, aspect: f32) {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        self.perspective = Mat4::perspective_infinite_rh(self.fov.to_radians(), aspect, self.near);
    }

    fn update_view(&mut self) {
        self.view = Mat4::look_to_rh(self.position, self.forward(), Vec3::Y);
    }
}
