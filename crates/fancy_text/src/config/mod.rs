//! Configuration system
//!
//! Serializable settings for the parser, renderer and glyph atlas. Any type
//! implementing [`Config`] can be loaded from or saved to TOML or RON files.

pub use serde::{Serialize, Deserialize};

use crate::foundation::math::Vec4;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Fancy Text Configuration
///
/// Parser limits and renderer decoration metrics. Every field has a default,
/// so partial files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FancyTextConfig {
    /// Nesting depth at which language expansion and hover parsing give up
    pub max_recursion_depth: usize,
    /// Number of parsed documents kept before the cache is flushed
    pub cache_capacity: usize,
    /// Highlight color used to echo malformed markup
    pub error_color: Vec4,
    /// Shadow offset in pixels (applied on both axes)
    pub shadow_offset: f32,
    /// Underline/strike/overline thickness as a fraction of run height
    pub decoration_thickness: f32,
    /// Maximum jello displacement in pixels
    pub jello_amplitude: f32,
}

impl Default for FancyTextConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 100,
            cache_capacity: 4096,
            error_color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            shadow_offset: 1.0,
            decoration_thickness: 1.0 / 16.0,
            jello_amplitude: 1.5,
        }
    }
}

impl FancyTextConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_recursion_depth == 0 {
            return Err(ConfigError::Invalid("max_recursion_depth must be at least 1".to_string()));
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".to_string()));
        }

        if !(0.0..=1.0).contains(&self.decoration_thickness) {
            return Err(ConfigError::Invalid(format!(
                "decoration_thickness must be within 0..=1, got {}",
                self.decoration_thickness
            )));
        }

        Ok(())
    }
}

impl Config for FancyTextConfig {}

/// # Glyph Atlas Configuration
///
/// Backing surface dimensions and rasterization size for [`crate::render::FontdueAtlas`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Full-size font pixel height
    pub pixel_size: f32,
    /// Atlas width in pixels (fixed for the lifetime of the atlas)
    pub width: u32,
    /// Initial atlas height in pixels (doubles when full)
    pub initial_height: u32,
    /// Height past which the atlas refuses to grow
    pub max_height: u32,
    /// Empty pixels kept around each glyph
    pub padding: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            pixel_size: 24.0,
            width: 512,
            initial_height: 256,
            max_height: 8192,
            padding: 1,
        }
    }
}

/// Largest coverage texture an atlas may grow to, in pixels
pub const MAX_ATLAS_PIXELS: u64 = 1 << 28;

impl AtlasConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pixel_size <= 0.0 {
            return Err(ConfigError::Invalid("pixel_size must be positive".to_string()));
        }
        if self.width == 0 || self.initial_height == 0 {
            return Err(ConfigError::Invalid("atlas dimensions must be non-zero".to_string()));
        }
        if self.max_height < self.initial_height {
            return Err(ConfigError::Invalid(format!(
                "max_height ({}) is smaller than initial_height ({})",
                self.max_height, self.initial_height
            )));
        }
        if u64::from(self.width) * u64::from(self.max_height) > MAX_ATLAS_PIXELS {
            return Err(ConfigError::Invalid(format!(
                "atlas of {}x{} exceeds {} pixels",
                self.width, self.max_height, MAX_ATLAS_PIXELS
            )));
        }
        Ok(())
    }
}

impl Config for AtlasConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FancyTextConfig::default().validate().is_ok());
        assert!(AtlasConfig::default().validate().is_ok());
        assert_eq!(FancyTextConfig::default().max_recursion_depth, 100);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: FancyTextConfig = toml::from_str("cache_capacity = 8\n").unwrap();

        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.max_recursion_depth, 100);
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join("fancy_text_config_test.ron");
        let path = path.to_str().unwrap();

        let mut config = FancyTextConfig::default();
        config.shadow_offset = 2.0;
        config.save_to_file(path).unwrap();

        let loaded = FancyTextConfig::load_from_file(path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = FancyTextConfig::default().save_to_file("config.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = FancyTextConfig {
            max_recursion_depth: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let atlas = AtlasConfig {
            max_height: 16,
            ..Default::default()
        };
        assert!(atlas.validate().is_err());
    }

    #[test]
    fn test_oversized_atlas_rejected() {
        let atlas = AtlasConfig {
            width: 65536,
            max_height: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(atlas.validate(), Err(ConfigError::Invalid(_))));

        let largest = AtlasConfig {
            width: 16384,
            max_height: 16384,
            ..Default::default()
        };
        assert!(largest.validate().is_ok());
    }
}
