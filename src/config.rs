//! Configuration loading and validation.
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration. CLI flags are applied on top in `main.rs`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gesture::GestureConfig;
use crate::orbital::OrbitalConfig;
use crate::panel::VisualConfig;
use crate::point_cloud::PointCloudConfig;
use crate::tracking::TrackerConfig;
use crate::view::CameraConfig;

/// File names searched by [`Config::load`], in order.
pub const SEARCH_PATHS: [&str; 2] = ["pinchfield.toml", "config/pinchfield.toml"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub scene: SceneConfig,
    pub image: PointCloudConfig,
    pub orbital: OrbitalConfig,
    pub gesture: GestureConfig,
    pub tracker: TrackerConfig,
    pub visual: VisualConfig,
    pub camera: CameraConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from the first existing search path, or defaults.
    pub fn load() -> Result<Self, ConfigError> {
        for path in SEARCH_PATHS.iter().map(PathBuf::from) {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(&path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::invalid(
                "window.width",
                "window dimensions must be greater than 0",
            ));
        }
        self.image.validate()?;
        self.orbital.validate()?;
        self.gesture.validate()?;
        self.tracker.validate()?;
        self.visual.validate()?;
        self.camera.validate()?;
        Ok(())
    }
}

/// Window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "pinchfield".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Which scene to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Image point cloud that forms as the pinch opens.
    #[default]
    Image,
    /// Procedural body and ring field.
    Orbital,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub kind: SceneKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::PinchSemantic;
    use crate::point_cloud::ColorPredicate;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_empty_string_is_default() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.scene.kind, SceneKind::Image);
        assert_eq!(config.image.working_width, 200);
        assert_eq!(config.orbital.count, 60_000);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_str(
            r#"
            [scene]
            kind = "orbital"

            [image.visibility]
            alpha_threshold = 50
            color = { kind = "dark", max_sum = 380 }

            [gesture]
            semantic = "closes"
            smoothing = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.scene.kind, SceneKind::Orbital);
        assert_eq!(config.image.visibility.alpha_threshold, 50);
        assert_eq!(
            config.image.visibility.color,
            ColorPredicate::Dark { max_sum: 380 }
        );
        assert_eq!(config.gesture.semantic, PinchSemantic::Closes);
        assert_eq!(config.gesture.smoothing, 0.1);
        assert_eq!(config.gesture.input_min, 0.03);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ntitle = \"test\"\nwidth = 640").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.window.title, "test");
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        match Config::from_file(&path) {
            Err(ConfigError::Read { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Config::from_str("[window]\nwidth = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_ring() {
        let mut config = Config::default();
        config.orbital.ring_inner = 70.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
