//! Camera rig: free-fly keys layered on orbit controls.
//!
//! The eye always looks at `target`. Keys translate the eye in the camera's
//! own frame at a fixed speed; mouse drags orbit the eye around the target
//! or pan both together; scrolling dollies toward the target. After every
//! change the eye-to-target distance is clamped to the configured range.

use std::f32::consts::PI;

use glam::Vec3;

/// Eye position the rig starts at and returns to on reset.
pub const HOME_EYE: Vec3 = Vec3::new(0.0, 20.0, 50.0);

/// Polar angle margin that keeps the eye off the poles.
const POLE_MARGIN: f32 = 0.01;

/// Signed movement axes for one frame, each in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    /// `+1` toward the view direction, `-1` away from it.
    pub forward: f32,
    /// `+1` toward the camera's left, `-1` toward its right.
    pub leftward: f32,
    /// `+1` along world up, `-1` down.
    pub up: f32,
    /// Snap back to the home pose.
    pub reset: bool,
}

/// Everything a renderer or a picker needs to know about the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraView {
    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or(Vec3::NEG_Z)
    }

    /// Unit vector to the camera's right.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or(Vec3::X)
    }

    /// Unit vector to the camera's up, orthogonal to forward.
    pub fn true_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    eye: Vec3,
    target: Vec3,
    /// Free-fly speed in units per second.
    pub speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians of orbit per pixel of drag, before the sensitivity multiplier.
    pub rotate_per_pixel: f32,
    pub sensitivity: f32,
    pub invert_y: bool,
    /// Distance factor per scroll line; below 1 zooms in on positive scroll.
    pub zoom_step: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            eye: HOME_EYE,
            target: Vec3::ZERO,
            speed: 20.0,
            min_distance: 5.0,
            max_distance: 200.0,
            rotate_per_pixel: 2.0 * PI / 720.0,
            sensitivity: 1.0,
            invert_y: false,
            zoom_step: 0.95,
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            eye: self.eye,
            target: self.target,
            up: Vec3::Y,
            fov_y: self.fov_y,
            near: self.near,
            far: self.far,
        }
    }

    /// Back to the home eye, looking at the origin.
    pub fn reset(&mut self) {
        self.eye = HOME_EYE;
        self.target = Vec3::ZERO;
    }

    /// Scale drag rotation so a full-height drag is one full turn.
    pub fn set_viewport_height(&mut self, height_px: u32) {
        self.rotate_per_pixel = 2.0 * PI / height_px.max(1) as f32;
    }

    /// Translate the eye by `input` for `dt` seconds.
    ///
    /// Left is `up × forward`, so `leftward > 0` moves toward screen left.
    /// Reset wins over any movement in the same frame.
    pub fn apply_moves(&mut self, input: MoveInput, dt: f32) {
        if input.reset {
            self.reset();
            return;
        }
        let forward = (self.target - self.eye).normalize_or_zero();
        let left = Vec3::Y.cross(forward).normalize_or_zero();
        let step = self.speed * dt;
        let delta =
            forward * input.forward * step + left * input.leftward * step + Vec3::Y * input.up * step;
        if delta != Vec3::ZERO {
            self.eye += delta;
            self.clamp_distance();
        }
    }

    /// Revolve the eye around the target by a drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let offset = self.eye - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let dy = if self.invert_y { -dy } else { dy };
        let per_px = self.rotate_per_pixel * self.sensitivity;

        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        azimuth -= dx * per_px;
        polar = (polar - dy * per_px).clamp(POLE_MARGIN, PI - POLE_MARGIN);

        self.eye = self.target
            + Vec3::new(
                polar.sin() * azimuth.sin(),
                polar.cos(),
                polar.sin() * azimuth.cos(),
            ) * radius;
    }

    /// Slide eye and target together by a drag of `(dx, dy)` pixels.
    /// The pan speed grows with distance so the point under the cursor
    /// roughly follows it.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height_px: u32) {
        let view = self.view();
        let world_per_px = 2.0 * self.distance() * (self.fov_y * 0.5).tan()
            / viewport_height_px.max(1) as f32;
        let shift = (-view.right() * dx + view.true_up() * dy) * world_per_px;
        self.eye += shift;
        self.target += shift;
    }

    /// Dolly toward the target by `lines` scroll lines (positive = closer).
    pub fn zoom(&mut self, lines: f32) {
        if lines == 0.0 {
            return;
        }
        let dir = (self.eye - self.target).normalize_or(Vec3::Z);
        let distance = (self.distance() * self.zoom_step.powf(lines))
            .clamp(self.min_distance, self.max_distance);
        self.eye = self.target + dir * distance;
        self.clamp_distance();
    }

    /// Keep the eye within `[min_distance, max_distance]` of the target.
    /// An eye pushed to infinity lands on the home direction at
    /// `max_distance`.
    fn clamp_distance(&mut self) {
        let offset = self.eye - self.target;
        let d = offset.length();
        if !d.is_finite() {
            self.eye = self.target + HOME_EYE.normalize() * self.max_distance;
            return;
        }
        let dir = if d > f32::EPSILON {
            offset / d
        } else {
            HOME_EYE.normalize()
        };
        let clamped = d.clamp(self.min_distance, self.max_distance);
        if (clamped - d).abs() > f32::EPSILON {
            self.eye = self.target + dir * clamped;
        }
    }
}
