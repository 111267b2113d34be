//! The Orrery viewer: window, loop, input handling and the publish panel.

pub mod game_loop;
pub mod publish_client;
pub mod viewer;
pub mod window;
