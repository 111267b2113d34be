//! Scene composition: everything drawn in one frame as a flat list of
//! shapes with transforms and materials.
//!
//! The list is GPU-free. A renderer only has to map [`Shape`] to a mesh and
//! [`Blend`] to a pipeline variant.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::orbit::{AsteroidBelt, OrbitState, SUN_RADIUS};
use crate::picking::HIGHLIGHT_SCALE;
use crate::planets::{self, PlanetId, Rgb};
use crate::store::UiState;

/// Half width of an orbit path ring.
pub const ORBIT_PATH_HALF_WIDTH: f32 = 0.1;
pub const ORBIT_PATH_COLOR: Rgb = Rgb::hex(0x444444);
pub const ORBIT_PATH_OPACITY: f32 = 0.2;

/// Selection ring band, as offsets from the planet radius.
pub const SELECTION_RING_INNER: f32 = 0.3;
pub const SELECTION_RING_OUTER: f32 = 0.5;

/// Height of a label marker above the planet surface.
pub const LABEL_HEIGHT: f32 = 1.0;
const LABEL_MARKER_RADIUS: f32 = 0.15;

/// Emissive strength of a selected planet, in its own color.
pub const SELECTED_EMISSIVE: f32 = 0.2;

const ASTEROID_COLOR: Rgb = Rgb::hex(0x666666);

/// Unit geometry a draw item is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Unit sphere, scaled by the transform.
    Sphere,
    /// Flat annulus in the XZ plane with absolute radii.
    Ring { inner: f32, outer: f32 },
}

/// How a draw item is composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Blend {
    /// Depth-written, no blending.
    Opaque,
    /// Alpha blended over what is behind it.
    Alpha,
    /// Added to what is behind it.
    Additive,
}

/// One shape with its world transform and material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub shape: Shape,
    pub transform: Mat4,
    pub color: Rgb,
    pub emissive: Rgb,
    pub emissive_intensity: f32,
    pub opacity: f32,
    pub blend: Blend,
    /// Receives scene lighting. Unlit items show their flat color.
    pub lit: bool,
}

impl DrawItem {
    fn unlit(shape: Shape, transform: Mat4, color: Rgb, opacity: f32, blend: Blend) -> Self {
        Self {
            shape,
            transform,
            color,
            emissive: Rgb::hex(0x000000),
            emissive_intensity: 0.0,
            opacity,
            blend,
            lit: false,
        }
    }

    fn lit(shape: Shape, transform: Mat4, color: Rgb) -> Self {
        Self {
            shape,
            transform,
            color,
            emissive: Rgb::hex(0x000000),
            emissive_intensity: 0.0,
            opacity: 1.0,
            blend: Blend::Opaque,
            lit: true,
        }
    }

    fn with_emissive(mut self, emissive: Rgb, intensity: f32) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    fn translucent(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.blend = Blend::Alpha;
        self
    }

    /// World position of the item's origin.
    pub fn origin(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

/// Scene lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub point_position: Vec3,
    pub point_color: Rgb,
    pub point_intensity: f32,
    /// Position the directional light shines from, toward the origin.
    pub directional_from: Vec3,
    pub directional_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.4,
            point_position: Vec3::ZERO,
            point_color: Rgb::hex(0xFFF8DC),
            point_intensity: 4.0,
            directional_from: Vec3::new(10.0, 10.0, 10.0),
            directional_intensity: 0.5,
        }
    }
}

/// One background star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec3,
    /// Gray level in `[0, 1]`.
    pub brightness: f32,
    /// Point size in pixels.
    pub size: f32,
}

/// Star shell between `radius` and `radius + depth` around the origin,
/// uniformly distributed by direction. Deterministic for a given seed.
pub fn generate_stars(seed: u64, count: usize, radius: f32, depth: f32) -> Vec<Star> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let r = radius + depth * rng.random::<f32>();
            let theta = rng.random::<f32>() * TAU;
            let phi = (1.0 - 2.0 * rng.random::<f32>()).acos();
            let position = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            ) * r;
            Star {
                position,
                brightness: 0.6 + 0.3 * rng.random::<f32>(),
                size: 2.0 * (0.5 + 0.5 * rng.random::<f32>()),
            }
        })
        .collect()
}

/// Draw list for one frame, grouped opaque first, then alpha, then additive.
pub fn compose(
    orbit: &OrbitState,
    ui: &UiState,
    hovered: Option<PlanetId>,
    belt: &AsteroidBelt,
) -> Vec<DrawItem> {
    let system = Quat::from_rotation_y(orbit.system_rotation);
    let mut items = Vec::with_capacity(belt.asteroids.len() + 64);

    sun_layers(orbit, system, &mut items);
    for id in planets::ids() {
        planet_items(orbit, ui, hovered, id, &mut items);
    }

    let belt_rotation = orbit.belt_world_rotation();
    items.extend(belt.asteroids.iter().map(|rock| {
        let transform = Mat4::from_rotation_translation(belt_rotation, belt_rotation * rock.position)
            * Mat4::from_scale(Vec3::splat(rock.size));
        DrawItem::lit(Shape::Sphere, transform, ASTEROID_COLOR)
    }));

    if ui.show_orbits {
        let transform = Mat4::from_quat(system);
        items.extend(planets::all().iter().map(|p| {
            DrawItem::unlit(
                Shape::Ring {
                    inner: p.distance - ORBIT_PATH_HALF_WIDTH,
                    outer: p.distance + ORBIT_PATH_HALF_WIDTH,
                },
                transform,
                ORBIT_PATH_COLOR,
                ORBIT_PATH_OPACITY,
                Blend::Alpha,
            )
        }));
    }

    items.sort_by_key(|item| item.blend);
    items
}

fn sphere(rotation: Quat, scale: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, Vec3::ZERO)
}

fn sun_layers(orbit: &OrbitState, system: Quat, items: &mut Vec<DrawItem>) {
    let sun = &orbit.sun;
    let spin = system * Quat::from_rotation_y(sun.spin);

    items.push(
        DrawItem::lit(Shape::Sphere, sphere(spin, SUN_RADIUS), Rgb::hex(0xFFA500))
            .with_emissive(Rgb::hex(0xFFD700), sun.pulse()),
    );
    items.push(
        DrawItem::lit(Shape::Sphere, sphere(system, SUN_RADIUS * 1.02), Rgb::hex(0xFF6B35))
            .with_emissive(Rgb::hex(0xFF4500), 0.8)
            .translucent(0.7),
    );
    items.push(
        DrawItem::lit(Shape::Sphere, sphere(system, SUN_RADIUS * 1.05), Rgb::hex(0xFFFF00))
            .with_emissive(Rgb::hex(0xFFFF00), 0.5)
            .translucent(0.4),
    );

    let inner = system
        * Quat::from_rotation_y(sun.corona_inner_spin)
        * Quat::from_rotation_z(sun.corona_inner_tilt());
    items.push(DrawItem::unlit(
        Shape::Sphere,
        sphere(inner, SUN_RADIUS * 2.2),
        Rgb::hex(0xFFD700),
        0.15,
        Blend::Additive,
    ));
    let outer = system
        * Quat::from_rotation_y(sun.corona_outer_spin)
        * Quat::from_rotation_x(sun.corona_outer_tilt());
    items.push(DrawItem::unlit(
        Shape::Sphere,
        sphere(outer, SUN_RADIUS * 2.6),
        Rgb::hex(0xFFA500),
        0.1,
        Blend::Additive,
    ));
    let flare = system * Quat::from_rotation_y(sun.flare_spin);
    items.push(DrawItem::unlit(
        Shape::Sphere,
        sphere(flare, SUN_RADIUS * sun.flare_scale()),
        Rgb::hex(0xFFFF80),
        0.05,
        Blend::Additive,
    ));
    items.push(DrawItem::unlit(
        Shape::Sphere,
        sphere(system, SUN_RADIUS * 0.8),
        Rgb::WHITE,
        0.3,
        Blend::Additive,
    ));
}

fn planet_items(
    orbit: &OrbitState,
    ui: &UiState,
    hovered: Option<PlanetId>,
    id: PlanetId,
    items: &mut Vec<DrawItem>,
) {
    let record = id.record();
    let frame = orbit.orbit_rotation(id);
    let center = orbit.planet_position(id);
    let frame_at = Mat4::from_rotation_translation(frame, center);
    let is_selected = ui.selected == Some(id);
    let is_hovered = hovered == Some(id);

    let scale = if is_selected || is_hovered {
        HIGHLIGHT_SCALE
    } else {
        1.0
    };
    let body = Mat4::from_scale_rotation_translation(
        Vec3::splat(record.radius * scale),
        frame * Quat::from_rotation_y(orbit.spin_angles[id.index()]),
        center,
    );
    let mut planet = DrawItem::lit(Shape::Sphere, body, record.color);
    if is_selected {
        planet = planet.with_emissive(record.color, SELECTED_EMISSIVE);
    }
    items.push(planet);

    if is_selected {
        items.push(DrawItem::unlit(
            Shape::Ring {
                inner: record.radius + SELECTION_RING_INNER,
                outer: record.radius + SELECTION_RING_OUTER,
            },
            frame_at,
            Rgb::WHITE,
            0.8,
            Blend::Alpha,
        ));
    }

    for band in record.rings {
        items.push(
            DrawItem::lit(
                Shape::Ring {
                    inner: record.radius + band.inner_offset,
                    outer: record.radius + band.outer_offset,
                },
                frame_at,
                band.color,
            )
            .translucent(band.opacity),
        );
    }

    if ui.show_labels || is_hovered || is_selected {
        let marker = Mat4::from_scale_rotation_translation(
            Vec3::splat(LABEL_MARKER_RADIUS),
            Quat::IDENTITY,
            center + Vec3::Y * (record.radius + LABEL_HEIGHT),
        );
        items.push(DrawItem::unlit(
            Shape::Sphere,
            marker,
            Rgb::WHITE,
            1.0,
            Blend::Opaque,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rings(items: &[DrawItem]) -> Vec<(f32, f32)> {
        items
            .iter()
            .filter_map(|i| match i.shape {
                Shape::Ring { inner, outer } => Some((inner, outer)),
                Shape::Sphere => None,
            })
            .collect()
    }

    fn has_ring(items: &[DrawItem], inner: f32, outer: f32) -> bool {
        rings(items)
            .iter()
            .any(|(i, o)| (i - inner).abs() < 1e-4 && (o - outer).abs() < 1e-4)
    }

    #[test]
    fn test_default_frame_contents() {
        let belt = AsteroidBelt::generate(1, 200);
        let items = compose(&OrbitState::new(), &UiState::default(), None, &belt);
        // 7 sun layers, 8 planets, 200 rocks, 8 orbit paths, 2 Saturn bands.
        assert_eq!(items.len(), 7 + 8 + 200 + 8 + 2);
        assert_eq!(rings(&items).len(), 10);
    }

    #[test]
    fn test_items_grouped_by_blend() {
        let belt = AsteroidBelt::generate(1, 10);
        let items = compose(&OrbitState::new(), &UiState::default(), None, &belt);
        assert!(items.windows(2).all(|w| w[0].blend <= w[1].blend));
        assert_eq!(items.last().map(|i| i.blend), Some(Blend::Additive));
    }

    #[test]
    fn test_hidden_orbits_drop_path_rings() {
        let ui = UiState {
            show_orbits: false,
            ..UiState::default()
        };
        let items = compose(&OrbitState::new(), &ui, None, &AsteroidBelt::generate(1, 0));
        assert_eq!(rings(&items).len(), 2);
        assert!(has_ring(&items, 2.5, 3.2));
        assert!(has_ring(&items, 3.3, 3.8));
    }

    #[test]
    fn test_orbit_path_widths() {
        let items = compose(
            &OrbitState::new(),
            &UiState::default(),
            None,
            &AsteroidBelt::generate(1, 0),
        );
        assert!(has_ring(&items, 15.9, 16.1));
        assert!(has_ring(&items, 74.9, 75.1));
    }

    #[test]
    fn test_selected_planet_gets_ring_marker_and_glow() {
        let earth = planets::find("Earth").unwrap();
        let ui = UiState {
            selected: Some(earth),
            show_orbits: false,
            ..UiState::default()
        };
        let orbit = OrbitState::new();
        let items = compose(&orbit, &ui, None, &AsteroidBelt::generate(1, 0));

        assert!(has_ring(&items, 1.1, 1.3));
        let body = items
            .iter()
            .find(|i| i.lit && i.origin().distance(Vec3::new(16.0, 0.0, 0.0)) < 1e-4)
            .unwrap();
        assert_eq!(body.emissive, earth.record().color);
        assert!((body.emissive_intensity - SELECTED_EMISSIVE).abs() < 1e-6);
        let scale = body.transform.x_axis.length();
        assert!((scale - 0.8 * HIGHLIGHT_SCALE).abs() < 1e-4);

        let marker = items
            .iter()
            .find(|i| !i.lit && i.blend == Blend::Opaque)
            .unwrap();
        assert!((marker.origin() - Vec3::new(16.0, 1.8, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_labels_follow_toggle_and_hover() {
        let belt = AsteroidBelt::generate(1, 0);
        let markers = |ui: &UiState, hovered| {
            compose(&OrbitState::new(), ui, hovered, &belt)
                .iter()
                .filter(|i| !i.lit && i.blend == Blend::Opaque)
                .count()
        };
        assert_eq!(markers(&UiState::default(), None), 0);
        assert_eq!(markers(&UiState::default(), planets::find("Mars")), 1);
        let labelled = UiState {
            show_labels: true,
            ..UiState::default()
        };
        assert_eq!(markers(&labelled, None), 8);
    }

    #[test]
    fn test_stars_lie_in_shell() {
        let stars = generate_stars(42, 500, 300.0, 60.0);
        assert_eq!(stars.len(), 500);
        for star in &stars {
            let r = star.position.length();
            assert!((300.0 - 1e-2..=360.0 + 1e-2).contains(&r));
            assert!((0.0..=1.0).contains(&star.brightness));
        }
        assert_eq!(stars, generate_stars(42, 500, 300.0, 60.0));
    }
}
