//! Command-line argument parsing for Orrery.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::{Config, ConfigError, default_config_dir};

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "orrery", about = "Interactive 3D solar system")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Publish server address.
    #[arg(long)]
    pub server: Option<String>,

    /// Publish server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Repository name to publish into.
    #[arg(long)]
    pub repository: Option<String>,

    /// Project root uploaded by the file upload flow.
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(ref addr) = args.server {
            self.server.address = addr.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref repo) = args.repository {
            self.github.repository = repo.clone();
        }
        if let Some(ref root) = args.project_root {
            self.github.project_root = root.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }

    /// [`Config::reload`] for a config that started from `args`: the file is
    /// read, `args` are applied on top, and only then is it compared.
    pub fn reload_with_overrides(
        &self,
        config_dir: &Path,
        args: &CliArgs,
    ) -> Result<Option<Self>, ConfigError> {
        let mut new_config = Config::read(config_dir)?;
        new_config.apply_cli_overrides(args);
        Ok(self.changed_to(new_config))
    }
}

impl CliArgs {
    /// Config directory from `--config`, else the platform default.
    pub fn config_dir(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_dir)
    }

    /// Load or create `config.ron`, falling back to defaults when it cannot
    /// be read, then apply these overrides. Returns the config and the
    /// directory it came from.
    pub fn load_config(&self) -> (Config, PathBuf) {
        let config_dir = self.config_dir();
        let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            Config::default()
        });
        config.apply_cli_overrides(self);
        (config, config_dir)
    }
}
