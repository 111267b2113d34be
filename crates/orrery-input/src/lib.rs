//! Input abstraction for the viewer: keyboard and mouse state mapped through
//! configurable action bindings.

pub mod action_map;
pub mod keybindings;
pub mod keyboard;
pub mod mouse;

pub use action_map::{
    Action, ActionResolver, ActionState, InputBinding, InputMap, MouseButtonBinding,
};
pub use keybindings::{BindingsError, Conflict};
pub use keyboard::{KeyboardState, RawKeyEvent};
pub use mouse::MouseState;
