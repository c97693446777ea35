//! Pet settings with persistence
//!
//! Settings are saved as JSON to `~/.config/aina/config.json` unless a path
//! is given on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use aina_core::VisibilityMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Model loaded when the settings name none
pub const DEFAULT_MODEL_PATH: &str = "assets/models/pet.glb";

/// Window placement, model choice, and part visibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window width in logical pixels
    pub width: u32,
    /// Window height in logical pixels
    pub height: u32,
    /// Window position in logical pixels; unset places the pet near the
    /// bottom-right of the primary monitor
    pub pos_x: Option<i32>,
    pub pos_y: Option<i32>,
    /// Let the window be dragged partly off screen
    pub allow_overflow: bool,
    pub model_path: PathBuf,
    /// Visibility of the parts of `model_path`
    pub part_visibility: VisibilityMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            pos_x: None,
            pos_y: None,
            allow_overflow: false,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            part_visibility: VisibilityMap::new(),
        }
    }
}

impl Settings {
    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aina").join("config.json"))
    }

    /// Load settings from disk, or return defaults if missing or unreadable
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Saved visibility, if it belongs to `model`
    pub fn visibility_for(&self, model: &Path) -> Option<VisibilityMap> {
        (self.model_path == model).then(|| self.part_visibility.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aina_assets::fixtures::temp_dir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = temp_dir("settings-missing");
        let settings = Settings::load(&dir.join("config.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_round_trip_creates_directory() {
        let dir = temp_dir("settings-round-trip");
        let path = dir.join("nested").join("config.json");

        let mut settings = Settings {
            width: 320,
            pos_x: Some(-12),
            pos_y: Some(40),
            allow_overflow: true,
            model_path: PathBuf::from("models/cat.gltf"),
            ..Default::default()
        };
        settings.part_visibility.set(3, false);
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn test_visibility_uses_string_keys() {
        let mut settings = Settings::default();
        settings.part_visibility.set(0, true);
        settings.part_visibility.set(12, false);

        let json: serde_json::Value = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["part_visibility"]["12"], serde_json::Value::Bool(false));
        assert_eq!(json["model_path"], DEFAULT_MODEL_PATH);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = temp_dir("settings-partial");
        let path = dir.join("config.json");
        fs::write(&path, r#"{"width": 250, "part_visibility": {"1": false}}"#).unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.width, 250);
        assert_eq!(settings.height, 400);
        assert!(!settings.part_visibility.is_visible(1));
        assert!(settings.part_visibility.is_visible(0));
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = temp_dir("settings-corrupt");
        let path = dir.join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_visibility_only_for_matching_model() {
        let mut settings = Settings::default();
        settings.part_visibility.set(0, false);

        assert!(settings.visibility_for(Path::new(DEFAULT_MODEL_PATH)).is_some());
        assert!(settings.visibility_for(Path::new("other.glb")).is_none());
    }
}
