//! Game settings loaded from and saved to disk

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::MINIMUM_VIEWPORT_SIZE;
use crate::spatial::QuadTreeConfig;

/// Errors raised while loading or saving settings files
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Underlying file read or write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File contents did not parse as the expected format
    #[error("Parse error: {0}")]
    Parse(String),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Path extension is not a supported settings format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// File-backed settings, chosen by path extension (`.toml` or `.ron`)
pub trait Settings: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load settings from a file
    fn load_from_file(path: &str) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))
        } else {
            Err(SettingsError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save settings to a file
    fn save_to_file(&self, path: &str) -> Result<(), SettingsError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| SettingsError::Serialize(e.to_string()))?
        } else {
            return Err(SettingsError::UnsupportedFormat(path.to_string()));
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Startup settings for a [`crate::game::Game`] host.
///
/// Raw fields are whatever the file contained; the accessors clamp to
/// usable values, so hosts should read through them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    viewport_width: f32,
    viewport_height: f32,
    quad_tree: QuadTreeConfig,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            quad_tree: QuadTreeConfig::default(),
        }
    }
}

impl Settings for GameSettings {}

impl GameSettings {
    /// Create settings with an explicit viewport size
    pub fn with_viewport(width: f32, height: f32) -> Self {
        Self {
            viewport_width: width,
            viewport_height: height,
            ..Self::default()
        }
    }

    /// Viewport width in pixels, clamped to the host minimum
    pub fn viewport_width(&self) -> f32 {
        self.viewport_width.max(MINIMUM_VIEWPORT_SIZE)
    }

    /// Viewport height in pixels, clamped to the host minimum
    pub fn viewport_height(&self) -> f32 {
        self.viewport_height.max(MINIMUM_VIEWPORT_SIZE)
    }

    /// Spatial index tuning passed through to scenes
    pub fn quad_tree(&self) -> QuadTreeConfig {
        self.quad_tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_describe_a_usable_host() {
        let settings = GameSettings::default();
        assert_relative_eq!(settings.viewport_width(), 1280.0);
        assert_relative_eq!(settings.viewport_height(), 720.0);
        assert!(settings.quad_tree().max_depth > 0);
    }

    #[test]
    fn accessors_clamp_degenerate_viewports() {
        let settings = GameSettings::with_viewport(-10.0, 0.0);
        assert_relative_eq!(settings.viewport_width(), MINIMUM_VIEWPORT_SIZE);
        assert_relative_eq!(settings.viewport_height(), MINIMUM_VIEWPORT_SIZE);
    }

    #[test]
    fn toml_round_trip_preserves_fields() {
        let settings = GameSettings::with_viewport(800.0, 600.0);
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: GameSettings = toml::from_str(&text).unwrap();
        assert_relative_eq!(back.viewport_width(), 800.0);
        assert_relative_eq!(back.viewport_height(), 600.0);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let back: GameSettings = toml::from_str("viewport_width = 1024.0").unwrap();
        assert_relative_eq!(back.viewport_width(), 1024.0);
        assert_relative_eq!(back.viewport_height(), 720.0);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let settings = GameSettings::default();
        assert!(matches!(
            settings.save_to_file("/tmp/settings.yaml"),
            Err(SettingsError::UnsupportedFormat(_))
        ));
    }
}
