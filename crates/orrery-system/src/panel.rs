//! Text for the info panel, the controls panel and the one-line HUD.
//!
//! The viewer has no font renderer, so panels are plain text: the HUD goes
//! into the window title and the panels are logged when they change.

use std::fmt::Write;
use std::time::Instant;

use crate::planets::PlanetRecord;
use crate::store::UiState;

/// Time scale buttons offered by the controls panel.
pub const TIME_SCALE_PRESETS: [f32; 4] = [0.5, 1.0, 2.0, 5.0];

/// Key and mouse help shown at startup.
pub const CONTROLS_HELP: [&str; 6] = [
    "WASD / Arrow Keys: Move camera",
    "Q/E: Move up/down",
    "R: Reset camera",
    "Mouse drag: Look around (right drag pans)",
    "Scroll: Zoom",
    "Click planets for info",
];

/// Extra bindings for the panel toggles and publishing.
pub const TOGGLE_HELP: [&str; 4] = [
    "Space: Play/Pause | Tab: Time scale",
    "O: Orbits | L: Labels | H: HUD | T: Real-time mode",
    "Esc: Close planet panel",
    "F5: Publish to GitHub | F6: Create pull request | F7: Upload files",
];

/// All help lines, camera controls first.
pub fn controls_help() -> Vec<&'static str> {
    CONTROLS_HELP.iter().chain(TOGGLE_HELP.iter()).copied().collect()
}

/// `"1 moon"`, `"0 moons"`, `"82 moons"`.
pub fn moon_badge(moons: u32) -> String {
    if moons == 1 {
        "1 moon".to_string()
    } else {
        format!("{moons} moons")
    }
}

/// `"2x"`, `"0.5x"`.
pub fn format_scale(scale: f32) -> String {
    format!("{scale}x")
}

/// The planet panel: name, badges, description and facts.
pub fn planet_panel(record: &PlanetRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.name);
    let _ = writeln!(out, "[{}] [{}]", record.kind, moon_badge(record.moons));
    let _ = writeln!(out, "{}", record.description);
    let _ = writeln!(out, "Interesting Facts:");
    for fact in record.facts {
        let _ = writeln!(out, "  • {fact}");
    }
    out.push_str("Press Esc or click the planet again to close this panel");
    out
}

/// The controls panel shown while nothing is selected.
pub fn controls_panel(state: &UiState) -> String {
    let scales: Vec<String> = TIME_SCALE_PRESETS
        .iter()
        .map(|&s| {
            if (s - state.time_scale).abs() < f32::EPSILON {
                format!("[{}]", format_scale(s))
            } else {
                format_scale(s)
            }
        })
        .collect();
    let mut out = String::from("Solar System Controls\n");
    let _ = writeln!(
        out,
        "Animation: {}",
        if state.paused { "Play" } else { "Pause" }
    );
    let _ = writeln!(out, "Time Scale: {}", scales.join(" "));
    let _ = writeln!(
        out,
        "Show Orbits: {}",
        if state.show_orbits { "Hide" } else { "Show" }
    );
    let _ = writeln!(
        out,
        "Show Labels: {}",
        if state.show_labels { "Hide" } else { "Show" }
    );
    out.push_str("Click on any planet to view detailed information");
    out
}

/// Whichever panel applies to the current state.
pub fn active_panel(state: &UiState) -> String {
    match state.selected {
        Some(id) => planet_panel(id.record()),
        None => controls_panel(state),
    }
}

/// One-line status for the window title.
///
/// Example: `Earth (Terrestrial, 1 moon) | 2x | orbits labels | FPS: 144`
pub fn hud_line(state: &UiState, hovered: Option<&str>, fps: Option<f64>) -> String {
    let mut parts = Vec::with_capacity(5);
    match state.selected {
        Some(id) => {
            let p = id.record();
            parts.push(format!("{} ({}, {})", p.name, p.kind, moon_badge(p.moons)));
        }
        None => parts.push("No selection".to_string()),
    }
    if let Some(name) = hovered {
        parts.push(format!("hover: {name}"));
    }
    let mut time = format_scale(state.time_scale);
    if state.paused {
        time.push_str(" paused");
    }
    if state.real_time_mode {
        time.push_str(" real-time");
    }
    parts.push(time);

    let mut shown = Vec::new();
    if state.show_orbits {
        shown.push("orbits");
    }
    if state.show_labels {
        shown.push("labels");
    }
    if !shown.is_empty() {
        parts.push(shown.join(" "));
    }
    if let Some(fps) = fps {
        parts.push(format!("FPS: {fps:.0}"));
    }
    parts.join(" | ")
}

/// Frame rate smoothed with an exponential moving average.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last_frame: Instant,
    frame_time_ema: f64,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            last_frame: Instant::now(),
            frame_time_ema: 1.0 / 60.0,
        }
    }
}

impl FpsCounter {
    /// Record a frame at `now`, returning the smoothed rate.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let dt = now.saturating_duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;
        if dt > 0.0 {
            self.frame_time_ema = self.frame_time_ema * 0.9 + dt * 0.1;
        }
        self.fps()
    }

    pub fn fps(&self) -> f64 {
        1.0 / self.frame_time_ema
    }
}
