//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level Orrery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Scene composition and camera settings.
    pub scene: SceneConfig,
    /// Input settings.
    pub input: InputConfig,
    /// GitHub publishing settings.
    pub github: GitHubConfig,
    /// Publish server settings.
    pub server: ServerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title prefix; the HUD line is appended to it.
    pub title: String,
}

/// Scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Free camera translation speed in units per second.
    pub camera_speed: f32,
    /// Closest the orbit controls may bring the eye to the target.
    pub min_distance: f32,
    /// Farthest the orbit controls may take the eye from the target.
    pub max_distance: f32,
    /// Number of background stars.
    pub star_count: u32,
    /// Radius of the star shell.
    pub star_radius: f32,
    /// Thickness of the star shell.
    pub star_depth: f32,
    /// Number of asteroids in the belt.
    pub asteroid_count: u32,
    /// Seed for the star field and asteroid belt.
    pub seed: u64,
    /// Icosphere subdivision level for planets and the sun.
    pub sphere_subdivisions: u32,
    /// Segment count for orbit and planet rings.
    pub ring_segments: u32,
}

/// Input configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Mouse sensitivity multiplier for orbit dragging.
    pub mouse_sensitivity: f32,
    /// Invert Y axis for orbit dragging.
    pub invert_y: bool,
    /// Zoom factor applied per scroll line.
    pub zoom_step: f32,
}

/// GitHub publishing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL.
    pub api_base: String,
    /// Environment variable holding a personal access token.
    pub token_env: String,
    /// Connection-settings endpoint for an externally managed token.
    /// When set, it takes precedence over `token_env`.
    pub connector_url: Option<String>,
    /// Environment variable holding the identity sent to the connector.
    pub connector_identity_env: String,
    /// Header carrying the connector identity.
    pub connector_identity_header: String,
    /// Name of the repository to create and upload into.
    pub repository: String,
    /// Description of the created repository.
    pub description: String,
    /// Create the repository as private.
    pub private: bool,
    /// Branch pull requests target and feature branches start from.
    pub base_branch: String,
    /// Feature branch the pull request is opened from.
    pub feature_branch: String,
    /// Pull request title.
    pub pull_request_title: String,
    /// Pull request body (markdown).
    pub pull_request_body: String,
    /// Root of the project tree to upload.
    pub project_root: PathBuf,
    /// Directories under `project_root` walked recursively.
    pub source_dirs: Vec<String>,
    /// Individual files under `project_root` uploaded when present.
    pub root_files: Vec<String>,
    /// Any relative path containing one of these substrings is skipped.
    pub exclude: Vec<String>,
    /// Files uploaded per batch.
    pub batch_size: usize,
    /// Pause between batches in milliseconds.
    pub batch_delay_ms: u64,
    /// User-Agent header sent to the API.
    pub user_agent: String,
}

/// Publish server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the publish server binds to and the viewer posts to.
    pub address: String,
    /// Publish server port.
    pub port: u16,
    /// Timeout for viewer requests to the server, in seconds.
    pub request_timeout_seconds: u64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Show the FPS counter in the HUD.
    pub show_fps: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 2000.0,
            camera_speed: 20.0,
            min_distance: 5.0,
            max_distance: 200.0,
            star_count: 5000,
            star_radius: 300.0,
            star_depth: 60.0,
            asteroid_count: 200,
            seed: 42,
            sphere_subdivisions: 3,
            ring_segments: 64,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.0,
            invert_y: false,
            zoom_step: 0.95,
        }
    }
}

const DEFAULT_DESCRIPTION: &str = "🌌 Beautiful 3D Solar System Visualization - An interactive \
exploration of our solar system with orbital animation, detailed planet information, and \
stunning visual effects.";

const DEFAULT_PR_BODY: &str = "## 🌌 Enhanced Solar System Features

This pull request adds several improvements to the solar system visualization:

### ✨ New Features
- **Enhanced Camera Controls**: Improved navigation with smoother movement
- **Time Control Panel**: Better time scale controls for orbital speeds
- **Visual Enhancements**: Improved lighting and planet details
- **Interactive Elements**: Better hover effects and selection feedback

### 🔧 Technical Improvements
- Optimized rendering performance
- Better code organization
- Enhanced user interface components
- Improved accessibility features

### 🎯 Benefits
- More intuitive user experience
- Better educational value
- Smoother performance
- Enhanced visual appeal

Ready for review and merge! 🌟";

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            connector_url: None,
            connector_identity_env: "CONNECTOR_IDENTITY".to_string(),
            connector_identity_header: "X-Connector-Token".to_string(),
            repository: "solar-system-visualization".to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            private: false,
            base_branch: "main".to_string(),
            feature_branch: "feature/enhanced-controls".to_string(),
            pull_request_title: "🚀 Enhanced Solar System Controls".to_string(),
            pull_request_body: DEFAULT_PR_BODY.to_string(),
            project_root: PathBuf::from("."),
            source_dirs: vec!["crates".to_string()],
            root_files: [
                "Cargo.toml",
                "Cargo.lock",
                "README.md",
                "DESIGN.md",
                "SPEC_FULL.md",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude: [
                "node_modules",
                ".git",
                "dist",
                ".vite",
                ".replit",
                "migrations",
                ".env",
                "package-lock.json",
                ".DS_Store",
                "tmp",
                "target",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            batch_size: 10,
            batch_delay_ms: 1000,
            user_agent: "orrery".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_seconds: 300,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for Orrery (`~/.config/orrery` on Linux).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orrery")
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Read and validate `config.ron` without creating it.
    pub fn read(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        Ok(self.changed_to(Self::read(config_dir)?))
    }

    pub(crate) fn changed_to(&self, new_config: Config) -> Option<Self> {
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Some(new_config)
        } else {
            None
        }
    }

    /// Reject values the viewer or the uploader cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scene = &self.scene;
        if !(scene.near > 0.0 && scene.far > scene.near) {
            return Err(ConfigError::Invalid {
                field: "scene.near",
                reason: format!("need 0 < near < far, got {} and {}", scene.near, scene.far),
            });
        }
        if !(scene.min_distance > 0.0 && scene.max_distance >= scene.min_distance) {
            return Err(ConfigError::Invalid {
                field: "scene.min_distance",
                reason: format!(
                    "need 0 < min_distance <= max_distance, got {} and {}",
                    scene.min_distance, scene.max_distance
                ),
            });
        }
        if self.github.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "github.batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.github.repository.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "github.repository",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Base URL of the publish server.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server.address, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("batch_size: 10"));
        assert!(ron_str.contains("\"solar-system-visualization\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), scene: (), input: (), server: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.github, GitHubConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_exclusions_cover_build_output() {
        let github = GitHubConfig::default();
        for pattern in ["node_modules", ".git", "target", ".env"] {
            assert!(github.exclude.iter().any(|e| e == pattern), "{pattern}");
        }
        assert_eq!(github.batch_delay_ms, 1000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.github.repository = "my-orrery".to_string();
        config.server.port = 8080;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.scene.star_count = 100;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().scene.star_count, 100);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::default();
        config.github.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("github.batch_size"));
    }

    #[test]
    fn test_validate_rejects_inverted_clip_planes() {
        let mut config = Config::default();
        config.scene.near = 10.0;
        config.scene.far = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_url() {
        let config = Config::default();
        assert_eq!(config.server_url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// viewer settings\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
