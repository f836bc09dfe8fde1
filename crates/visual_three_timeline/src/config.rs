// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! All tunable constants of the timeline live here:
//! - Timeline length and clip duration defaults
//! - Transport skip step and end-of-timeline behaviour
//! - Zoom range and track layout metrics
//! - Default on-canvas transform for newly active media

use crate::active::{ActiveTransform, Extent, HiddenLayerPolicy};
use crate::clock::EndBehavior;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Configuration file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "visual_three.ron";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing the configuration failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// The file parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Timeline engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Format version
    pub version: u32,
    /// Timeline length for a new session, in seconds
    pub default_total_duration: f64,
    /// Shortest clip a trim may produce, in seconds
    pub min_clip_duration: f64,
    /// Initial length of a dropped image, in seconds
    pub image_clip_duration: f64,
    /// Initial length of dropped audio or video, in seconds
    pub av_clip_duration: f64,
    /// Seconds moved by skip back / skip forward
    pub skip_step: f64,
    /// Lowest zoom factor (1.0 fits the timeline to the track width)
    pub min_zoom: f64,
    /// Highest zoom factor
    pub max_zoom: f64,
    /// What the clock does when it reaches the end of the timeline
    pub end_behavior: EndBehavior,
    /// Whether hidden layers contribute to the active media set
    pub hidden_layers: HiddenLayerPolicy,
    /// Transform given to media when it becomes active
    pub default_transform: ActiveTransform,
    /// Height of a collapsed layer row, in points
    pub layer_height: f32,
    /// Height of an expanded layer row, in points
    pub expanded_layer_height: f32,
    /// Width of the layer name column, in points
    pub layer_name_width: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            default_total_duration: 300.0,
            min_clip_duration: 0.5,
            image_clip_duration: 5.0,
            av_clip_duration: 30.0,
            skip_step: 5.0,
            min_zoom: 0.1,
            max_zoom: 2.0,
            end_behavior: EndBehavior::default(),
            hidden_layers: HiddenLayerPolicy::default(),
            default_transform: ActiveTransform::default(),
            layer_height: 48.0,
            expanded_layer_height: 96.0,
            layer_name_width: 180.0,
        }
    }
}

impl TimelineConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON text
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded timeline config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults if it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::Invalid(format!(
                "Config version {} is newer than supported version {}",
                self.version, CONFIG_FORMAT_VERSION
            )));
        }

        let non_negative = [
            ("default_total_duration", self.default_total_duration),
            ("image_clip_duration", self.image_clip_duration),
            ("av_clip_duration", self.av_clip_duration),
            ("skip_step", self.skip_step),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a non-negative number")));
            }
        }

        if !self.min_clip_duration.is_finite() || self.min_clip_duration <= 0.0 {
            return Err(ConfigError::Invalid("min_clip_duration must be positive".into()));
        }
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite())
            || self.min_zoom <= 0.0
            || self.min_zoom > self.max_zoom
        {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..={} is not a positive range",
                self.min_zoom, self.max_zoom
            )));
        }
        let layout = [
            ("layer_height", self.layer_height),
            ("expanded_layer_height", self.expanded_layer_height),
            ("layer_name_width", self.layer_name_width),
        ];
        for (name, value) in layout {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a positive number")));
            }
        }
        if self.expanded_layer_height < self.layer_height {
            return Err(ConfigError::Invalid("expanded_layer_height must be >= layer_height".into()));
        }

        let transform = &self.default_transform;
        if !(transform.x.is_finite() && transform.y.is_finite()) {
            return Err(ConfigError::Invalid("default_transform position must be finite".into()));
        }
        for (name, extent) in [("width", transform.width), ("height", transform.height)] {
            let (Extent::Pixels(value) | Extent::Percent(value)) = extent;
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "default_transform {name} must be a positive number"
                )));
            }
        }
        Ok(())
    }

    /// Row height for a layer
    pub fn row_height(&self, expanded: bool) -> f32 {
        if expanded {
            self.expanded_layer_height
        } else {
            self.layer_height
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::Extent;

    #[test]
    fn test_default_config() {
        let config = TimelineConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert_eq!(config.default_total_duration, 300.0);
        assert_eq!(config.min_clip_duration, 0.5);
        assert_eq!(config.end_behavior, EndBehavior::Hold);
        assert_eq!(config.hidden_layers, HiddenLayerPolicy::Include);
        assert_eq!(config.default_transform.width, Extent::Percent(30.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let mut config = TimelineConfig::default();
        config.end_behavior = EndBehavior::Pause;
        config.skip_step = 2.5;

        let ron_str = config.to_ron_string().unwrap();
        let loaded = TimelineConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded = TimelineConfig::from_ron_str("(skip_step: 10.0)").unwrap();
        assert_eq!(loaded.skip_step, 10.0);
        assert_eq!(loaded.default_total_duration, 300.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            TimelineConfig::from_ron_str("(min_clip_duration: 0.0)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TimelineConfig::from_ron_str("(min_zoom: 3.0, max_zoom: 2.0)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TimelineConfig::from_ron_str("(version: 99)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TimelineConfig::from_ron_str("(skip_step: \"five\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let invalid = [
            TimelineConfig {
                layer_height: f32::NAN,
                ..TimelineConfig::default()
            },
            TimelineConfig {
                expanded_layer_height: f32::INFINITY,
                ..TimelineConfig::default()
            },
            TimelineConfig {
                layer_name_width: -10.0,
                ..TimelineConfig::default()
            },
            TimelineConfig {
                default_transform: ActiveTransform {
                    width: Extent::Percent(f32::NAN),
                    ..ActiveTransform::default()
                },
                ..TimelineConfig::default()
            },
            TimelineConfig {
                default_transform: ActiveTransform {
                    height: Extent::Pixels(-1.0),
                    ..ActiveTransform::default()
                },
                ..TimelineConfig::default()
            },
            TimelineConfig {
                default_transform: ActiveTransform {
                    x: f32::NAN,
                    ..ActiveTransform::default()
                },
                ..TimelineConfig::default()
            },
        ];
        for config in invalid {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))), "{config:?}");
        }
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let path = std::env::temp_dir().join("visual_three_missing_config_test.ron");
        let _ = std::fs::remove_file(&path);
        let config = TimelineConfig::load_or_default(&path).unwrap();
        assert_eq!(config, TimelineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "visual_three_config_test_{}.ron",
            std::process::id()
        ));
        let mut config = TimelineConfig::default();
        config.av_clip_duration = 12.0;
        config.save(&path).unwrap();

        let loaded = TimelineConfig::load(&path).unwrap();
        assert_eq!(loaded.av_clip_duration, 12.0);
        let _ = std::fs::remove_file(&path);
    }
}
