//! UI state store.
//!
//! A single [`UiState`] value mutated only through the store's actions. Every
//! action notifies subscribers whose selected slice of the state changed, so
//! a listener interested in the selection is not woken by orbit updates.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use tracing::debug;

use crate::panel::TIME_SCALE_PRESETS;
use crate::planets::{self, PlanetId};

/// Everything the viewer's panels and toggles control.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    /// Planet shown in the info panel.
    pub selected: Option<PlanetId>,
    /// Point the orbit controls revolve around.
    pub camera_target: Vec3,
    /// Multiplier applied to every animation speed.
    pub time_scale: f32,
    pub paused: bool,
    pub show_orbits: bool,
    pub show_labels: bool,
    pub show_hud: bool,
    /// Flag for positions sourced from an ephemeris feed. Stored and shown,
    /// the animation itself does not read it.
    pub real_time_mode: bool,
    /// Latest world position of each planet, keyed by name.
    pub planet_positions: HashMap<&'static str, Vec3>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            selected: None,
            camera_target: Vec3::ZERO,
            time_scale: 1.0,
            paused: false,
            show_orbits: true,
            show_labels: false,
            show_hud: true,
            real_time_mode: false,
            planet_positions: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("time scale must be finite and non-negative, got {0}")]
    InvalidTimeScale(f32),
    #[error("no planet named `{0}`")]
    UnknownPlanet(String),
}

/// Handle returned by [`SolarSystemStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&UiState, &UiState) + Send>;

/// Owner of the [`UiState`].
#[derive(Default)]
pub struct SolarSystemStore {
    state: UiState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for SolarSystemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolarSystemStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SolarSystemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Call `on_change(new, old)` whenever `selector`'s output changes.
    pub fn subscribe<T, S, F>(&mut self, selector: S, mut on_change: F) -> SubscriptionId
    where
        T: PartialEq + 'static,
        S: Fn(&UiState) -> T + Send + 'static,
        F: FnMut(&T, &T) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let listener: Listener = Box::new(move |old, new| {
            let (before, after) = (selector(old), selector(new));
            if before != after {
                on_change(&after, &before);
            }
        });
        self.listeners.push((id, listener));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn update(&mut self, f: impl FnOnce(&mut UiState)) {
        if self.listeners.is_empty() {
            f(&mut self.state);
            return;
        }
        let old = self.state.clone();
        f(&mut self.state);
        if old != self.state {
            for (_, listener) in &mut self.listeners {
                listener(&old, &self.state);
            }
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Select a planet, or clear the selection with `None`.
    pub fn select_planet(&mut self, planet: Option<PlanetId>) {
        debug!(planet = ?planet.map(|p| p.record().name), "select");
        self.update(|s| s.selected = planet);
    }

    pub fn select_by_name(&mut self, name: &str) -> Result<PlanetId, StoreError> {
        let id = planets::find(name).ok_or_else(|| StoreError::UnknownPlanet(name.to_string()))?;
        self.select_planet(Some(id));
        Ok(id)
    }

    /// Click semantics: clicking the selected planet deselects it,
    /// clicking any other planet selects that one.
    pub fn toggle_selection(&mut self, planet: PlanetId) {
        let next = if self.state.selected == Some(planet) {
            None
        } else {
            Some(planet)
        };
        self.select_planet(next);
    }

    pub fn set_camera_target(&mut self, target: Vec3) {
        self.update(|s| s.camera_target = target);
    }

    pub fn set_time_scale(&mut self, scale: f32) -> Result<(), StoreError> {
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(StoreError::InvalidTimeScale(scale));
        }
        self.update(|s| s.time_scale = scale);
        Ok(())
    }

    /// Advance to the next larger preset, wrapping to the smallest.
    pub fn cycle_time_scale(&mut self) -> f32 {
        let current = self.state.time_scale;
        let next = TIME_SCALE_PRESETS
            .iter()
            .copied()
            .find(|&p| p > current + f32::EPSILON)
            .unwrap_or(TIME_SCALE_PRESETS[0]);
        self.update(|s| s.time_scale = next);
        next
    }

    pub fn toggle_pause(&mut self) {
        self.update(|s| s.paused = !s.paused);
    }

    pub fn toggle_orbits(&mut self) {
        self.update(|s| s.show_orbits = !s.show_orbits);
    }

    pub fn toggle_labels(&mut self) {
        self.update(|s| s.show_labels = !s.show_labels);
    }

    pub fn toggle_hud(&mut self) {
        self.update(|s| s.show_hud = !s.show_hud);
    }

    pub fn toggle_real_time(&mut self) {
        self.update(|s| s.real_time_mode = !s.real_time_mode);
    }

    pub fn set_planet_position(&mut self, name: &'static str, position: Vec3) {
        self.update(|s| {
            s.planet_positions.insert(name, position);
        });
    }

    /// Replace many positions with one notification.
    pub fn set_planet_positions(
        &mut self,
        positions: impl IntoIterator<Item = (&'static str, Vec3)>,
    ) {
        self.update(|s| s.planet_positions.extend(positions));
    }

    /// Every field back to its default. Subscriptions survive.
    pub fn reset(&mut self) {
        self.update(|s| *s = UiState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn id(name: &str) -> PlanetId {
        planets::find(name).unwrap()
    }

    #[test]
    fn test_defaults() {
        let s = UiState::default();
        assert_eq!(s.selected, None);
        assert_eq!(s.time_scale, 1.0);
        assert!(!s.paused);
        assert!(s.show_orbits);
        assert!(!s.show_labels);
        assert!(s.show_hud);
        assert!(!s.real_time_mode);
    }

    #[test]
    fn test_toggle_twice_restores_every_flag() {
        let mut store = SolarSystemStore::new();
        let original = store.state().clone();
        let toggles: [fn(&mut SolarSystemStore); 5] = [
            SolarSystemStore::toggle_pause,
            SolarSystemStore::toggle_orbits,
            SolarSystemStore::toggle_labels,
            SolarSystemStore::toggle_hud,
            SolarSystemStore::toggle_real_time,
        ];
        for toggle in toggles {
            toggle(&mut store);
            assert_ne!(store.state(), &original);
            toggle(&mut store);
            assert_eq!(store.state(), &original);
        }
    }

    #[test]
    fn test_select_then_none_clears() {
        let mut store = SolarSystemStore::new();
        store.select_planet(Some(id("Earth")));
        assert_eq!(store.state().selected, Some(id("Earth")));
        store.select_planet(None);
        assert_eq!(store.state().selected, None);
    }

    #[test]
    fn test_toggle_selection_deselects_same_planet() {
        let mut store = SolarSystemStore::new();
        store.toggle_selection(id("Mars"));
        store.toggle_selection(id("Venus"));
        assert_eq!(store.state().selected, Some(id("Venus")));
        store.toggle_selection(id("Venus"));
        assert_eq!(store.state().selected, None);
    }

    #[test]
    fn test_select_by_unknown_name() {
        let mut store = SolarSystemStore::new();
        let err = store.select_by_name("Vulcan").unwrap_err();
        assert_eq!(err, StoreError::UnknownPlanet("Vulcan".to_string()));
        assert_eq!(store.state().selected, None);
    }

    #[test]
    fn test_time_scale_validation() {
        let mut store = SolarSystemStore::new();
        assert!(store.set_time_scale(f32::NAN).is_err());
        assert!(store.set_time_scale(-1.0).is_err());
        assert!(store.set_time_scale(f32::INFINITY).is_err());
        store.set_time_scale(2.0).unwrap();
        assert_eq!(store.state().time_scale, 2.0);
    }

    #[test]
    fn test_cycle_time_scale_wraps() {
        let mut store = SolarSystemStore::new();
        assert_eq!(store.cycle_time_scale(), 2.0);
        assert_eq!(store.cycle_time_scale(), 5.0);
        assert_eq!(store.cycle_time_scale(), 0.5);
        assert_eq!(store.cycle_time_scale(), 1.0);
        store.set_time_scale(3.0).unwrap();
        assert_eq!(store.cycle_time_scale(), 5.0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut store = SolarSystemStore::new();
        store.select_planet(Some(id("Jupiter")));
        store.toggle_pause();
        store.set_time_scale(5.0).unwrap();
        store.set_planet_position("Jupiter", Vec3::X);
        store.reset();
        assert_eq!(store.state(), &UiState::default());
    }

    #[test]
    fn test_subscriber_fires_only_on_slice_change() {
        let mut store = SolarSystemStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(
            |s| s.selected,
            move |new, old| sink.lock().unwrap().push((*new, *old)),
        );

        store.toggle_orbits();
        store.set_planet_position("Earth", Vec3::ONE);
        store.select_planet(Some(id("Earth")));
        store.select_planet(Some(id("Earth")));
        store.select_planet(None);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(Some(id("Earth")), None), (None, Some(id("Earth")))]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = SolarSystemStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let sub = store.subscribe(
            |s| s.paused,
            move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
            },
        );
        store.toggle_pause();
        assert!(store.unsubscribe(sub));
        store.toggle_pause();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!store.unsubscribe(sub));
    }

    #[test]
    fn test_batch_positions_notify_once() {
        let mut store = SolarSystemStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        store.subscribe(
            |s| s.planet_positions.len(),
            move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
            },
        );
        store.set_planet_positions(planets::all().iter().map(|p| (p.name, Vec3::ZERO)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.state().planet_positions.len(), 8);
    }
}
