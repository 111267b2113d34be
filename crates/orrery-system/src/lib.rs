//! The solar system itself, independent of any window or GPU.
//!
//! - [`planets`]: the static planet fact sheet.
//! - [`store`]: UI state (selection, time scale, visibility toggles) with
//!   selector-based change subscriptions.
//! - [`orbit`]: per-frame animation of orbits, spins, the sun and the
//!   asteroid belt.
//! - [`camera_rig`]: free-fly keys plus orbit/zoom/pan mouse controls.
//! - [`picking`]: pointer ray against planet spheres.
//! - [`panel`]: text for the info panel, controls panel and HUD line.
//! - [`scene`]: the per-frame draw list, lights and star backdrop.

pub mod camera_rig;
pub mod orbit;
pub mod panel;
pub mod picking;
pub mod planets;
pub mod scene;
pub mod store;

pub use camera_rig::{CameraRig, CameraView, MoveInput};
pub use orbit::{Asteroid, AsteroidBelt, OrbitState, SunPhase};
pub use panel::{FpsCounter, TIME_SCALE_PRESETS};
pub use picking::{PickTarget, Ray};
pub use planets::{PlanetId, PlanetKind, PlanetRecord, Rgb, RingBand, TableError};
pub use scene::{Blend, DrawItem, Lighting, Shape, Star};
pub use store::{SolarSystemStore, StoreError, SubscriptionId, UiState};
