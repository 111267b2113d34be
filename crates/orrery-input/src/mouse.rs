//! Frame-coherent mouse state tracker.
//!
//! [`MouseState`] accumulates winit mouse events during a frame and exposes
//! position, delta, button edges, scroll and click-versus-drag detection.
//! Orbit controls read the drag delta; planet picking reads clicks.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// A press/release pair farther apart than this is a drag, not a click.
pub const CLICK_SLOP_PX: f32 = 4.0;

#[derive(Debug, Clone, Copy, Default)]
struct ButtonFrame {
    pressed: bool,
    just_released: bool,
    travel: f32,
}

fn button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        _ => None,
    }
}

/// Frame-coherent mouse state.
///
/// 1. Forward winit events via the `on_*` methods.
/// 2. Query state with the accessors.
/// 3. Call [`clear_transients`](Self::clear_transients) at end of frame.
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    position: Vec2,
    delta: Vec2,
    buttons: [ButtonFrame; 3],
    scroll: f32,
    cursor_in_window: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Event handlers ──────────────────────────────────────────────

    /// Process a `CursorMoved` event (physical pixels).
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        let step = new_pos - self.position;
        if self.cursor_in_window {
            self.delta += step;
        }
        for b in self.buttons.iter_mut().filter(|b| b.pressed) {
            b.travel += step.length();
        }
        self.position = new_pos;
        self.cursor_in_window = true;
    }

    /// Process a `MouseInput` event. Back/forward buttons are ignored.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let Some(idx) = button_index(button) else {
            return;
        };
        let b = &mut self.buttons[idx];
        match state {
            ElementState::Pressed => {
                b.pressed = true;
                b.travel = 0.0;
            }
            ElementState::Released => {
                b.pressed = false;
                b.just_released = true;
            }
        }
    }

    /// Process a `MouseWheel` event.
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => {
                self.scroll += y;
            }
            MouseScrollDelta::PixelDelta(pos) => {
                // ~40 pixels per line
                self.scroll += (pos.y / 40.0) as f32;
            }
        }
    }

    pub fn on_cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    pub fn on_cursor_left(&mut self) {
        self.cursor_in_window = false;
        for b in &mut self.buttons {
            if b.pressed {
                b.pressed = false;
                b.just_released = true;
                b.travel = f32::INFINITY;
            }
        }
    }

    /// Clears delta, scroll and button edges.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
        for b in &mut self.buttons {
            b.just_released = false;
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement since the last frame clear.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| self.buttons[i].pressed)
    }

    /// True on the frame `button` was released without the cursor having
    /// travelled more than [`CLICK_SLOP_PX`] while it was held.
    #[must_use]
    pub fn clicked(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| {
            let b = &self.buttons[i];
            b.just_released && b.travel <= CLICK_SLOP_PX
        })
    }

    /// Whether `button` is held and has moved past the click slop.
    #[must_use]
    pub fn is_dragging(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|i| {
            let b = &self.buttons[i];
            b.pressed && b.travel > CLICK_SLOP_PX
        })
    }

    /// Scroll delta this frame (positive = scroll up / zoom in).
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    #[must_use]
    pub fn is_cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }
}
