//! Per-frame animation state.
//!
//! Every body moves by `angle += rate * dt`: the whole system turns slowly
//! about Y, each planet revolves at its table speed, and each planet spins
//! on its own axis. Nothing here is orbital mechanics.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::planets::{self, PLANET_COUNT, PLANETS, PlanetId};
use crate::store::UiState;

/// Rate of the whole-system turn, radians per second at time scale 1.
pub const SYSTEM_ROTATION_RATE: f32 = 0.01;
/// Planet self-rotation, radians per second at time scale 1.
pub const PLANET_SPIN_RATE: f32 = 0.5;
/// Asteroid belt drift, radians per second, independent of time scale.
pub const BELT_ROTATION_RATE: f32 = 0.002;

/// Sun layer rates in radians per second (per-frame steps of 0.005, 0.002,
/// -0.003 and 0.01 at 60 frames per second).
pub const SUN_SPIN_RATE: f32 = 0.3;
pub const CORONA_INNER_SPIN_RATE: f32 = 0.12;
pub const CORONA_OUTER_SPIN_RATE: f32 = -0.18;
pub const FLARE_SPIN_RATE: f32 = 0.6;

/// Sun radius in scene units.
pub const SUN_RADIUS: f32 = 2.0;

/// Sun layer angles and wall-clock phase. Runs even while paused.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SunPhase {
    pub elapsed: f32,
    pub spin: f32,
    pub corona_inner_spin: f32,
    pub corona_outer_spin: f32,
    pub flare_spin: f32,
}

impl SunPhase {
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
        self.spin = (self.spin + SUN_SPIN_RATE * dt) % TAU;
        self.corona_inner_spin = (self.corona_inner_spin + CORONA_INNER_SPIN_RATE * dt) % TAU;
        self.corona_outer_spin = (self.corona_outer_spin + CORONA_OUTER_SPIN_RATE * dt) % TAU;
        self.flare_spin = (self.flare_spin + FLARE_SPIN_RATE * dt) % TAU;
    }

    /// Emissive intensity of the sun surface, in `[1.1, 1.5]`.
    pub fn pulse(&self) -> f32 {
        (self.elapsed * 2.0).sin() * 0.2 + 1.3
    }

    /// Z tilt of the inner corona.
    pub fn corona_inner_tilt(&self) -> f32 {
        (self.elapsed * 0.5).sin() * 0.1
    }

    /// X tilt of the outer corona.
    pub fn corona_outer_tilt(&self) -> f32 {
        (self.elapsed * 0.7).cos() * 0.1
    }

    /// Uniform scale of the flare shell, in `[3.1, 3.3]`.
    pub fn flare_scale(&self) -> f32 {
        let intensity = (self.elapsed * 3.0).sin() * 0.2 + 0.8;
        2.8 + intensity * 0.5
    }
}

/// Angles for everything that moves.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitState {
    pub system_rotation: f32,
    pub orbit_angles: [f32; PLANET_COUNT],
    pub spin_angles: [f32; PLANET_COUNT],
    pub belt_rotation: f32,
    pub sun: SunPhase,
}

impl Default for OrbitState {
    fn default() -> Self {
        Self {
            system_rotation: 0.0,
            orbit_angles: [0.0; PLANET_COUNT],
            spin_angles: [0.0; PLANET_COUNT],
            belt_rotation: 0.0,
            sun: SunPhase::default(),
        }
    }
}

impl OrbitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step every angle by `dt` seconds.
    ///
    /// Pausing freezes the system turn and the orbits. Planet spin follows
    /// the time scale but not the pause flag; the belt and the sun ignore
    /// both.
    pub fn advance(&mut self, dt: f32, ui: &UiState) {
        let scaled = dt * ui.time_scale;
        if !ui.paused {
            self.system_rotation = (self.system_rotation + scaled * SYSTEM_ROTATION_RATE) % TAU;
            for (angle, planet) in self.orbit_angles.iter_mut().zip(PLANETS.iter()) {
                *angle = (*angle + scaled * planet.speed) % TAU;
            }
        }
        for spin in &mut self.spin_angles {
            *spin = (*spin + scaled * PLANET_SPIN_RATE) % TAU;
        }
        self.belt_rotation = (self.belt_rotation + dt * BELT_ROTATION_RATE) % TAU;
        self.sun.advance(dt);
    }

    /// Rotation that carries the planet's orbit frame into world space.
    pub fn orbit_rotation(&self, id: PlanetId) -> Quat {
        Quat::from_rotation_y(self.system_rotation + self.orbit_angles[id.index()])
    }

    /// World position of a planet's center.
    pub fn planet_position(&self, id: PlanetId) -> Vec3 {
        self.orbit_rotation(id) * Vec3::new(id.record().distance, 0.0, 0.0)
    }

    /// `(name, position)` for every planet.
    pub fn planet_positions(&self) -> impl Iterator<Item = (&'static str, Vec3)> + '_ {
        planets::ids().map(|id| (id.record().name, self.planet_position(id)))
    }

    /// World rotation of the asteroid belt.
    pub fn belt_world_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.system_rotation + self.belt_rotation)
    }
}

/// One rock in the belt, in belt-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Asteroid {
    pub position: Vec3,
    pub size: f32,
}

/// Ring of small rocks between Mars and Jupiter.
#[derive(Debug, Clone, PartialEq)]
pub struct AsteroidBelt {
    pub asteroids: Vec<Asteroid>,
}

impl AsteroidBelt {
    pub const INNER_RADIUS: f32 = 26.0;
    pub const OUTER_RADIUS: f32 = 30.0;
    pub const MIN_SIZE: f32 = 0.05;
    pub const SIZE_SPREAD: f32 = 0.1;

    /// Evenly spaced angles with random distance, height and size.
    /// Deterministic for a given seed.
    pub fn generate(seed: u64, count: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let asteroids = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * TAU;
                let distance = Self::INNER_RADIUS
                    + rng.random::<f32>() * (Self::OUTER_RADIUS - Self::INNER_RADIUS);
                let y = (rng.random::<f32>() - 0.5) * 2.0;
                let size = Self::MIN_SIZE + rng.random::<f32>() * Self::SIZE_SPREAD;
                Asteroid {
                    position: Vec3::new(angle.cos() * distance, y, angle.sin() * distance),
                    size,
                }
            })
            .collect();
        Self { asteroids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn earth() -> PlanetId {
        planets::find("Earth").unwrap()
    }

    #[test]
    fn test_orbit_advances_by_speed_times_scale() {
        let mut state = OrbitState::new();
        let ui = UiState {
            time_scale: 2.0,
            ..UiState::default()
        };
        state.advance(1.0, &ui);
        let e = earth();
        assert!((state.orbit_angles[e.index()] - 0.02).abs() < 1e-6);
        assert!((state.system_rotation - 0.02).abs() < 1e-6);
        assert!((state.spin_angles[e.index()] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pause_freezes_orbits_but_not_spin() {
        let mut state = OrbitState::new();
        let ui = UiState {
            paused: true,
            ..UiState::default()
        };
        for _ in 0..60 {
            state.advance(DT, &ui);
        }
        assert_eq!(state.system_rotation, 0.0);
        assert!(state.orbit_angles.iter().all(|&a| a == 0.0));
        assert!(state.spin_angles.iter().all(|&a| a > 0.0));
        assert!(state.belt_rotation > 0.0);
        assert!(state.sun.elapsed > 0.99);
    }

    #[test]
    fn test_zero_time_scale_stops_planets() {
        let mut state = OrbitState::new();
        let ui = UiState {
            time_scale: 0.0,
            ..UiState::default()
        };
        state.advance(1.0, &ui);
        assert!(state.orbit_angles.iter().all(|&a| a == 0.0));
        assert!(state.spin_angles.iter().all(|&a| a == 0.0));
    }

    #[test]
    fn test_initial_positions_on_positive_x() {
        let state = OrbitState::new();
        for id in planets::ids() {
            let p = state.planet_position(id);
            assert!((p - Vec3::new(id.record().distance, 0.0, 0.0)).length() < 1e-5);
        }
    }

    #[test]
    fn test_positions_stay_on_orbit_circle() {
        let mut state = OrbitState::new();
        let ui = UiState {
            time_scale: 5.0,
            ..UiState::default()
        };
        for _ in 0..1000 {
            state.advance(DT, &ui);
        }
        for (name, pos) in state.planet_positions() {
            let id = planets::find(name).unwrap();
            assert!((pos.length() - id.record().distance).abs() < 1e-3, "{name}");
            assert!(pos.y.abs() < 1e-5);
        }
    }

    #[test]
    fn test_quarter_turn_direction() {
        // A positive Y rotation carries +X toward -Z.
        let mut state = OrbitState::new();
        state.orbit_angles[earth().index()] = std::f32::consts::FRAC_PI_2;
        let p = state.planet_position(earth());
        assert!(p.x.abs() < 1e-4);
        assert!((p.z + 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_sun_pulse_range() {
        let mut sun = SunPhase::default();
        for _ in 0..600 {
            sun.advance(DT);
            let pulse = sun.pulse();
            assert!((1.1 - 1e-5..=1.5 + 1e-5).contains(&pulse));
            let flare = sun.flare_scale();
            assert!((3.1 - 1e-5..=3.3 + 1e-5).contains(&flare));
            assert!(sun.corona_inner_tilt().abs() <= 0.1 + 1e-6);
        }
    }

    #[test]
    fn test_sun_spin_matches_per_frame_step() {
        let mut sun = SunPhase::default();
        sun.advance(DT);
        assert!((sun.spin - 0.005).abs() < 1e-6);
        assert!((sun.corona_outer_spin + 0.003).abs() < 1e-6);
    }

    #[test]
    fn test_belt_is_deterministic_and_bounded() {
        let a = AsteroidBelt::generate(7, 200);
        let b = AsteroidBelt::generate(7, 200);
        assert_eq!(a, b);
        assert_eq!(a.asteroids.len(), 200);
        for rock in &a.asteroids {
            let r = Vec3::new(rock.position.x, 0.0, rock.position.z).length();
            assert!((26.0 - 1e-3..=30.0 + 1e-3).contains(&r));
            assert!((-1.0..=1.0).contains(&rock.position.y));
            assert!((0.05..=0.15).contains(&rock.size));
        }
        assert_ne!(a, AsteroidBelt::generate(8, 200));
    }
}
