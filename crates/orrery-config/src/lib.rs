//! Configuration system for Orrery.
//!
//! Settings for the viewer window, the scene, input, GitHub publishing and the
//! publish server persist to disk as a RON file. Supports CLI overrides via
//! clap, hot-reload detection, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, GitHubConfig, InputConfig, SceneConfig, ServerConfig, WindowConfig,
    default_config_dir,
};
pub use error::ConfigError;
