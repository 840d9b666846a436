use glam::{Mat4, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};

/// A camera circling around a fixed target, framed to fit a bounding sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    radius: f32,
    home_distance: f32,
}

impl OrbitCamera {
    pub const FOV_Y: f32 = FRAC_PI_3;
    const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
    const DEFAULT_PITCH: f32 = 0.35;

    /// Places the camera so that the whole box fits in view.
    pub fn framing(min: Vec3, max: Vec3) -> Self {
        let radius = ((max - min).length() * 0.5).max(1e-3);
        let distance = radius / (Self::FOV_Y * 0.5).sin() * 1.1;
        Self {
            target: (min + max) * 0.5,
            distance,
            yaw: 0.0,
            pitch: Self::DEFAULT_PITCH,
            radius,
            home_distance: distance,
        }
    }

    /// Goes back to the initial framing.
    pub fn reset(&mut self) {
        self.distance = self.home_distance;
        self.yaw = 0.0;
        self.pitch = Self::DEFAULT_PITCH;
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    /// Rotates around the target, in radians. Pitch stops short of the poles.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw -= delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * 0.9f32.powf(steps))
            .clamp(self.radius * 0.05, self.radius * 50.0);
    }

    /// Direction from the target towards the eye, used as a headlight.
    pub fn light_dir(&self) -> Vec3 {
        (self.eye() - self.target).normalize_or_zero()
    }

    /// Projection (0..1 depth) times view.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let near = (self.distance * 0.01).max(1e-4);
        let far = self.distance + self.radius * 4.0;
        let proj = Mat4::perspective_rh(Self::FOV_Y, aspect, near, far);
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        proj * view
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::framing(Vec3::splat(-1.0), Vec3::splat(1.0))
    }
}
