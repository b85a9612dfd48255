use crate::field_of_view::{LayerFilters, ViewSettings};
use crate::layer::LayerMask;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub layers: LayersConfig,
    #[serde(default)]
    pub boids: BoidsConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

/// Layer indices (0..32) for obstacles and boids
#[derive(Debug, Deserialize)]
pub struct LayersConfig {
    #[serde(default = "default_obstacle_layer")]
    pub obstacle: u32,
    #[serde(default = "default_target_layer")]
    pub target: u32,
}

#[derive(Debug, Deserialize)]
pub struct BoidsConfig {
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_pixels_per_unit")]
    pub pixels_per_unit: f32,
    #[serde(default = "default_background")]
    pub background: [u8; 3],
    #[serde(default = "default_mesh_color")]
    pub mesh_color: [u8; 4],
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; RUST_LOG wins when set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_scene_path")]
    pub path: String,
}

// Default values
fn default_obstacle_layer() -> u32 { 0 }
fn default_target_layer() -> u32 { 1 }
fn default_move_speed() -> f32 { 2.0 }
fn default_window_title() -> String { "boidsight - field of view demo".to_string() }
fn default_pixels_per_unit() -> f32 { 20.0 }
fn default_background() -> [u8; 3] { [30, 30, 30] }
fn default_mesh_color() -> [u8; 4] { [255, 230, 120, 70] }
fn default_log_filter() -> String { "info".to_string() }
fn default_scene_path() -> String { "scenes/arena.json".to_string() }

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            obstacle: default_obstacle_layer(),
            target: default_target_layer(),
        }
    }
}

impl Default for BoidsConfig {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            pixels_per_unit: default_pixels_per_unit(),
            background: default_background(),
            mesh_color: default_mesh_color(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: default_scene_path(),
        }
    }
}

impl LayersConfig {
    /// Masks for the configured layers. Indices past 31 give an empty mask.
    pub fn filters(&self) -> LayerFilters {
        LayerFilters {
            obstacles: LayerMask::layer(self.obstacle),
            targets: LayerMask::layer(self.target),
        }
    }
}

impl Config {
    pub fn parse(contents: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Load configuration from file, or use defaults if it is missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file found, using default configuration");
            return Config::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                config
            }
            Err(e) => {
                warn!(error = %e, "using default configuration");
                Config::default()
            }
        }
    }
}
