//! Action mapping: viewer actions bound to physical inputs.
//!
//! [`InputMap`] says which keys and mouse buttons trigger which [`Action`].
//! [`ActionResolver`] recomputes an [`ActionState`] every frame from the
//! current keyboard and mouse state.

use crate::keyboard::KeyboardState;
use crate::mouse::MouseState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Serde helper for [`KeyCode`], which has no serde impls of its own.
mod keycode_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use winit::keyboard::KeyCode;

    /// Serialize as the variant name (e.g., `"KeyW"`).
    pub fn serialize<S: Serializer>(code: &KeyCode, s: S) -> Result<S::Ok, S::Error> {
        format!("{code:?}").serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<KeyCode, D::Error> {
        let name = String::deserialize(d)?;
        string_to_keycode(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown key: {name}")))
    }

    pub(super) fn string_to_keycode(s: &str) -> Option<KeyCode> {
        Some(match s {
            "KeyA" => KeyCode::KeyA,
            "KeyB" => KeyCode::KeyB,
            "KeyC" => KeyCode::KeyC,
            "KeyD" => KeyCode::KeyD,
            "KeyE" => KeyCode::KeyE,
            "KeyF" => KeyCode::KeyF,
            "KeyG" => KeyCode::KeyG,
            "KeyH" => KeyCode::KeyH,
            "KeyI" => KeyCode::KeyI,
            "KeyJ" => KeyCode::KeyJ,
            "KeyK" => KeyCode::KeyK,
            "KeyL" => KeyCode::KeyL,
            "KeyM" => KeyCode::KeyM,
            "KeyN" => KeyCode::KeyN,
            "KeyO" => KeyCode::KeyO,
            "KeyP" => KeyCode::KeyP,
            "KeyQ" => KeyCode::KeyQ,
            "KeyR" => KeyCode::KeyR,
            "KeyS" => KeyCode::KeyS,
            "KeyT" => KeyCode::KeyT,
            "KeyU" => KeyCode::KeyU,
            "KeyV" => KeyCode::KeyV,
            "KeyW" => KeyCode::KeyW,
            "KeyX" => KeyCode::KeyX,
            "KeyY" => KeyCode::KeyY,
            "KeyZ" => KeyCode::KeyZ,
            "Digit0" => KeyCode::Digit0,
            "Digit1" => KeyCode::Digit1,
            "Digit2" => KeyCode::Digit2,
            "Digit3" => KeyCode::Digit3,
            "Digit4" => KeyCode::Digit4,
            "Digit5" => KeyCode::Digit5,
            "Digit6" => KeyCode::Digit6,
            "Digit7" => KeyCode::Digit7,
            "Digit8" => KeyCode::Digit8,
            "Digit9" => KeyCode::Digit9,
            "F1" => KeyCode::F1,
            "F2" => KeyCode::F2,
            "F3" => KeyCode::F3,
            "F4" => KeyCode::F4,
            "F5" => KeyCode::F5,
            "F6" => KeyCode::F6,
            "F7" => KeyCode::F7,
            "F8" => KeyCode::F8,
            "F9" => KeyCode::F9,
            "F10" => KeyCode::F10,
            "F11" => KeyCode::F11,
            "F12" => KeyCode::F12,
            "Space" => KeyCode::Space,
            "Enter" => KeyCode::Enter,
            "Escape" => KeyCode::Escape,
            "Tab" => KeyCode::Tab,
            "Backspace" => KeyCode::Backspace,
            "ShiftLeft" => KeyCode::ShiftLeft,
            "ShiftRight" => KeyCode::ShiftRight,
            "ControlLeft" => KeyCode::ControlLeft,
            "ControlRight" => KeyCode::ControlRight,
            "AltLeft" => KeyCode::AltLeft,
            "AltRight" => KeyCode::AltRight,
            "ArrowUp" => KeyCode::ArrowUp,
            "ArrowDown" => KeyCode::ArrowDown,
            "ArrowLeft" => KeyCode::ArrowLeft,
            "ArrowRight" => KeyCode::ArrowRight,
            "PageUp" => KeyCode::PageUp,
            "PageDown" => KeyCode::PageDown,
            _ => return None,
        })
    }
}

/// Viewer actions that can be bound to physical inputs.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    MoveForward,
    MoveBackward,
    /// Strafe toward the camera's left.
    MoveLeft,
    MoveRight,
    /// Rise along the camera's up vector.
    MoveUp,
    MoveDown,
    /// Return the camera to its start pose.
    ResetCamera,
    TogglePause,
    ToggleOrbits,
    ToggleLabels,
    ToggleHud,
    ToggleRealTime,
    /// Step through the time scale presets.
    CycleTimeScale,
    ClearSelection,
    /// Create the GitHub repository.
    Publish,
    /// Open the feature pull request.
    CreatePullRequest,
    /// Upload the project tree to the repository.
    UploadFiles,
    /// Orbit drag.
    Orbit,
    /// Pan drag.
    Pan,
}

impl Action {
    /// Every action, in display order.
    pub const ALL: [Action; 19] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::ResetCamera,
        Action::TogglePause,
        Action::ToggleOrbits,
        Action::ToggleLabels,
        Action::ToggleHud,
        Action::ToggleRealTime,
        Action::CycleTimeScale,
        Action::ClearSelection,
        Action::Publish,
        Action::CreatePullRequest,
        Action::UploadFiles,
        Action::Orbit,
        Action::Pan,
    ];
}

/// A physical input source that can be bound to an action.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum InputBinding {
    /// A keyboard key (physical scan code).
    Key(#[serde(with = "keycode_serde")] KeyCode),
    MouseButton(MouseButtonBinding),
}

impl InputBinding {
    /// Parse a key name such as `"KeyW"` or `"ArrowUp"` into a key binding.
    #[must_use]
    pub fn key_from_name(name: &str) -> Option<Self> {
        keycode_serde::string_to_keycode(name).map(Self::Key)
    }
}

/// Serde-friendly subset of [`winit::event::MouseButton`].
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum MouseButtonBinding {
    Left,
    Right,
    Middle,
}

impl MouseButtonBinding {
    #[must_use]
    pub fn to_winit(self) -> MouseButton {
        match self {
            Self::Left => MouseButton::Left,
            Self::Right => MouseButton::Right,
            Self::Middle => MouseButton::Middle,
        }
    }
}

/// Maps [`Action`]s to lists of [`InputBinding`]s (OR logic).
///
/// Serializable to RON so users can edit bindings by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputMap {
    pub bindings: HashMap<Action, Vec<InputBinding>>,
}

impl Default for InputMap {
    fn default() -> Self {
        Self::default_viewer()
    }
}

impl InputMap {
    /// Create an empty input map with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The standard viewer layout: WASD or arrows to fly, Q/E to rise and
    /// sink, R to reset, left drag to orbit, right drag to pan.
    #[must_use]
    pub fn default_viewer() -> Self {
        use InputBinding::{Key, MouseButton as Mouse};

        let table: [(Action, Vec<InputBinding>); 19] = [
            (
                Action::MoveForward,
                vec![Key(KeyCode::KeyW), Key(KeyCode::ArrowUp)],
            ),
            (
                Action::MoveBackward,
                vec![Key(KeyCode::KeyS), Key(KeyCode::ArrowDown)],
            ),
            (
                Action::MoveLeft,
                vec![Key(KeyCode::KeyA), Key(KeyCode::ArrowLeft)],
            ),
            (
                Action::MoveRight,
                vec![Key(KeyCode::KeyD), Key(KeyCode::ArrowRight)],
            ),
            (Action::MoveUp, vec![Key(KeyCode::KeyQ)]),
            (Action::MoveDown, vec![Key(KeyCode::KeyE)]),
            (Action::ResetCamera, vec![Key(KeyCode::KeyR)]),
            (Action::TogglePause, vec![Key(KeyCode::Space)]),
            (Action::ToggleOrbits, vec![Key(KeyCode::KeyO)]),
            (Action::ToggleLabels, vec![Key(KeyCode::KeyL)]),
            (Action::ToggleHud, vec![Key(KeyCode::KeyH)]),
            (Action::ToggleRealTime, vec![Key(KeyCode::KeyT)]),
            (Action::CycleTimeScale, vec![Key(KeyCode::Tab)]),
            (Action::ClearSelection, vec![Key(KeyCode::Escape)]),
            (Action::Publish, vec![Key(KeyCode::F5)]),
            (Action::CreatePullRequest, vec![Key(KeyCode::F6)]),
            (Action::UploadFiles, vec![Key(KeyCode::F7)]),
            (Action::Orbit, vec![Mouse(MouseButtonBinding::Left)]),
            (Action::Pan, vec![Mouse(MouseButtonBinding::Right)]),
        ];

        Self {
            bindings: table.into_iter().collect(),
        }
    }

    /// Set the bindings for an action, replacing any existing ones.
    pub fn set_bindings(&mut self, action: Action, bindings: Vec<InputBinding>) {
        self.bindings.insert(action, bindings);
    }

    #[must_use]
    pub fn get_bindings(&self, action: &Action) -> &[InputBinding] {
        self.bindings.get(action).map_or(&[], |v| v.as_slice())
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// # Errors
    /// Returns an error if the RON string is malformed.
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

/// Per-frame action state computed by [`ActionResolver`].
#[derive(Debug, Clone, Default)]
pub struct ActionState {
    active: HashMap<Action, bool>,
    prev_active: HashMap<Action, bool>,
}

impl ActionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_action_active(&self, action: Action) -> bool {
        self.active.get(&action).copied().unwrap_or(false)
    }

    /// True only on the frame the action went from inactive to active.
    #[must_use]
    pub fn action_just_activated(&self, action: Action) -> bool {
        self.is_action_active(action) && !self.prev_active.get(&action).copied().unwrap_or(false)
    }

    /// True only on the frame the action went from active to inactive.
    #[must_use]
    pub fn action_just_deactivated(&self, action: Action) -> bool {
        !self.is_action_active(action) && self.prev_active.get(&action).copied().unwrap_or(false)
    }

    /// Signed axis from a pair of opposing actions: `+1` for `positive`
    /// only, `-1` for `negative` only, `0` for both or neither.
    #[must_use]
    pub fn axis(&self, positive: Action, negative: Action) -> f32 {
        let p = if self.is_action_active(positive) { 1.0 } else { 0.0 };
        let n = if self.is_action_active(negative) { 1.0 } else { 0.0 };
        p - n
    }
}

/// Reads input state and populates [`ActionState`] each frame.
pub struct ActionResolver;

impl ActionResolver {
    /// Resolve all actions. Call once per frame after input events have been
    /// applied and before transients are cleared.
    pub fn resolve(
        input_map: &InputMap,
        keyboard: &KeyboardState,
        mouse: &MouseState,
        state: &mut ActionState,
    ) {
        state.prev_active.clone_from(&state.active);
        state.active.clear();

        for (action, bindings) in &input_map.bindings {
            let active = bindings
                .iter()
                .any(|b| Self::read_binding(b, keyboard, mouse));
            state.active.insert(*action, active);
        }
    }

    fn read_binding(binding: &InputBinding, keyboard: &KeyboardState, mouse: &MouseState) -> bool {
        match binding {
            InputBinding::Key(code) => keyboard.is_pressed(PhysicalKey::Code(*code)),
            InputBinding::MouseButton(btn) => mouse.is_button_pressed(btn.to_winit()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::RawKeyEvent;
    use winit::event::ElementState;

    fn resolve(map: &InputMap, kb: &KeyboardState, state: &mut ActionState) {
        ActionResolver::resolve(map, kb, &MouseState::new(), state);
    }

    #[test]
    fn test_default_map_binds_every_action() {
        let map = InputMap::default();
        for action in Action::ALL {
            assert!(
                !map.get_bindings(&action).is_empty(),
                "{action:?} has no binding"
            );
        }
    }

    #[test]
    fn test_arrow_keys_alias_wasd() {
        let map = InputMap::default();
        let mut kb = KeyboardState::new();
        kb.process_raw(RawKeyEvent::press(KeyCode::ArrowLeft));
        let mut state = ActionState::new();
        resolve(&map, &kb, &mut state);
        assert!(state.is_action_active(Action::MoveLeft));
        assert!(!state.is_action_active(Action::MoveRight));
    }

    #[test]
    fn test_just_activated_edges() {
        let map = InputMap::default();
        let mut kb = KeyboardState::new();
        let mut state = ActionState::new();

        kb.process_raw(RawKeyEvent::press(KeyCode::KeyR));
        resolve(&map, &kb, &mut state);
        assert!(state.action_just_activated(Action::ResetCamera));

        resolve(&map, &kb, &mut state);
        assert!(!state.action_just_activated(Action::ResetCamera));
        assert!(state.is_action_active(Action::ResetCamera));

        kb.process_raw(RawKeyEvent::release(KeyCode::KeyR));
        resolve(&map, &kb, &mut state);
        assert!(state.action_just_deactivated(Action::ResetCamera));
    }

    #[test]
    fn test_axis_cancels_opposing_keys() {
        let map = InputMap::default();
        let mut kb = KeyboardState::new();
        kb.process_raw(RawKeyEvent::press(KeyCode::KeyW));
        let mut state = ActionState::new();
        resolve(&map, &kb, &mut state);
        assert_eq!(state.axis(Action::MoveForward, Action::MoveBackward), 1.0);

        kb.process_raw(RawKeyEvent::press(KeyCode::KeyS));
        resolve(&map, &kb, &mut state);
        assert_eq!(state.axis(Action::MoveForward, Action::MoveBackward), 0.0);
    }

    #[test]
    fn test_mouse_button_binding() {
        let map = InputMap::default();
        let mut mouse = MouseState::new();
        mouse.on_button(MouseButton::Right, ElementState::Pressed);
        let mut state = ActionState::new();
        ActionResolver::resolve(&map, &KeyboardState::new(), &mouse, &mut state);
        assert!(state.is_action_active(Action::Pan));
        assert!(!state.is_action_active(Action::Orbit));
    }

    #[test]
    fn test_unbound_action_inactive() {
        let map = InputMap::new();
        let mut state = ActionState::new();
        resolve(&map, &KeyboardState::new(), &mut state);
        assert!(!state.is_action_active(Action::Publish));
    }

    #[test]
    fn test_key_from_name() {
        assert_eq!(
            InputBinding::key_from_name("F5"),
            Some(InputBinding::Key(KeyCode::F5))
        );
        assert_eq!(InputBinding::key_from_name("Hyper"), None);
    }
}
