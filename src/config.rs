//! Viewer settings
//!
//! Read from `<config dir>/mesh-viewer/viewer.toml`. Every field is optional;
//! anything missing takes the default below.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub mesh_path: PathBuf,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub material: MaterialConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            mesh_path: PathBuf::from("assets/model.obj"),
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            material: MaterialConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Mesh Viewer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Radians; 0 looks down -Z.
    pub yaw: f32,
    pub pitch: f32,
    /// Units per second.
    pub move_speed: f32,
    /// Speed multiplier while Shift is held.
    pub fast_multiplier: f32,
    /// Radians per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            yaw: 0.0,
            pitch: 0.0,
            move_speed: 2.5,
            fast_multiplier: 4.0,
            mouse_sensitivity: 0.0025,
            fov_degrees: 60.0,
            near: 0.05,
            far: 500.0,
        }
    }
}

/// Texture coordinate animation applied to textured materials.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub uv_scale: [f32; 2],
    /// UV units per second.
    pub uv_scroll_speed: [f32; 2],
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            uv_scale: [2.0, 2.0],
            uv_scroll_speed: [0.08, 0.0],
        }
    }
}

impl ViewerConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mesh-viewer").join("viewer.toml"))
    }

    /// Loads the user config, or defaults if it is missing or invalid.
    #[must_use]
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            }
        }
    }

    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    /// Returns an error if `content` is not valid TOML for this schema.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies command-line overrides: the first argument is the mesh path.
    #[must_use]
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        if let Some(path) = args.into_iter().next() {
            self.mesh_path = path.into();
        }
        self
    }
}
