//! Pointer picking: a ray from the cursor tested against planet spheres.

use glam::{Vec2, Vec3};

use crate::camera_rig::CameraView;
use crate::orbit::OrbitState;
use crate::planets::{self, PlanetId};

/// Scale applied to a hovered or selected planet.
pub const HIGHLIGHT_SCALE: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Ray through the pixel at `cursor` (origin top-left) of a
    /// `width x height` viewport.
    pub fn from_screen(cursor: Vec2, width: u32, height: u32, view: &CameraView) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let ndc_x = 2.0 * cursor.x / w - 1.0;
        let ndc_y = 1.0 - 2.0 * cursor.y / h;
        let half_h = (view.fov_y * 0.5).tan();
        let half_w = half_h * (w / h);
        let direction = (view.forward()
            + view.right() * ndc_x * half_w
            + view.true_up() * ndc_y * half_h)
            .normalize();
        Self {
            origin: view.eye,
            direction,
        }
    }

    /// Distance along the ray to the first hit on a sphere, if any.
    /// A ray starting inside the sphere hits at its exit point.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt = disc.sqrt();
        let near = -b - sqrt;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + sqrt;
        (far >= 0.0).then_some(far)
    }
}

/// A pickable sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickTarget {
    pub id: PlanetId,
    pub center: Vec3,
    pub radius: f32,
}

/// Pick spheres for every planet at its current position, enlarged for
/// the hovered and selected ones the same way they are drawn.
pub fn planet_targets(
    orbit: &OrbitState,
    hovered: Option<PlanetId>,
    selected: Option<PlanetId>,
) -> Vec<PickTarget> {
    planets::ids()
        .map(|id| {
            let scale = if Some(id) == hovered || Some(id) == selected {
                HIGHLIGHT_SCALE
            } else {
                1.0
            };
            PickTarget {
                id,
                center: orbit.planet_position(id),
                radius: id.record().radius * scale,
            }
        })
        .collect()
}

/// The nearest target the ray hits.
pub fn pick(ray: &Ray, targets: &[PickTarget]) -> Option<PlanetId> {
    targets
        .iter()
        .filter_map(|t| ray.intersect_sphere(t.center, t.radius).map(|d| (d, t.id)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}
