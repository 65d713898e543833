//! Configuration schema types for `pet.toml`
//!
//! Every section and field is optional; omitted values fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};

use crate::anim::Mode;
use crate::rng::DEFAULT_SEED;
use crate::synth::{DEFAULT_PALETTE_SIZE, DEFAULT_SIZE};

/// Sprite synthesis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Edge length of the generated sprite
    #[serde(default = "default_size")]
    pub size: u32,
    /// Maximum number of palette colors
    #[serde(default = "default_palette_size")]
    pub palette_size: usize,
    /// Fixed k-means seed; unset means a fresh palette each run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_size() -> u32 {
    DEFAULT_SIZE
}

fn default_palette_size() -> usize {
    DEFAULT_PALETTE_SIZE
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { size: default_size(), palette_size: default_palette_size(), seed: None }
    }
}

/// Animation export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Frames per second of the render loop and exported GIF
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Number of frames to export
    #[serde(default = "default_frames")]
    pub frames: usize,
    /// Seed for wink timing, sleep cycles and outline jitter
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Expression to render
    #[serde(default)]
    pub mode: Mode,
}

fn default_fps() -> u32 {
    30
}

fn default_frames() -> usize {
    60
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { fps: default_fps(), frames: default_frames(), seed: default_seed(), mode: Mode::default() }
    }
}

/// Output file settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Integer upscale factor applied to written images
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Spritesheet columns; unset lays every frame out in one row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
}

fn default_scale() -> u32 {
    1
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { scale: default_scale(), columns: None }
    }
}

/// Complete pet.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetConfig {
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "animation.fps")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pet.toml: '{}' {}", self.field, self.message)
    }
}

fn check_range<T>(errors: &mut Vec<ConfigValidationError>, field: &str, value: T, min: T, max: T)
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        errors.push(ConfigValidationError {
            field: field.to_string(),
            message: format!("must be between {} and {} (got {})", min, max, value),
        });
    }
}

impl PetConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        check_range(&mut errors, "synthesis.size", self.synthesis.size, 2, 256);
        check_range(&mut errors, "synthesis.palette_size", self.synthesis.palette_size, 1, 256);
        check_range(&mut errors, "animation.fps", self.animation.fps, 1, 120);
        check_range(&mut errors, "output.scale", self.output.scale, 1, 64);

        if self.animation.frames == 0 {
            errors.push(ConfigValidationError {
                field: "animation.frames".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.output.columns == Some(0) {
            errors.push(ConfigValidationError {
                field: "output.columns".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parse() {
        let config: PetConfig = toml::from_str("").unwrap();
        assert_eq!(config, PetConfig::default());
        assert_eq!(config.synthesis.size, 16);
        assert_eq!(config.synthesis.palette_size, 16);
        assert_eq!(config.synthesis.seed, None);
        assert_eq!(config.animation.fps, 30);
        assert_eq!(config.animation.frames, 60);
        assert_eq!(config.animation.seed, 42);
        assert_eq!(config.animation.mode, Mode::Calm);
        assert_eq!(config.output.scale, 1);
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[synthesis]
size = 32
palette_size = 8
seed = 7

[animation]
fps = 24
frames = 48
seed = 99
mode = "sleepy"

[output]
scale = 4
columns = 6
"#;
        let config: PetConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.synthesis.size, 32);
        assert_eq!(config.synthesis.palette_size, 8);
        assert_eq!(config.synthesis.seed, Some(7));
        assert_eq!(config.animation.fps, 24);
        assert_eq!(config.animation.frames, 48);
        assert_eq!(config.animation.seed, 99);
        assert_eq!(config.animation.mode, Mode::Sleepy);
        assert_eq!(config.output.scale, 4);
        assert_eq!(config.output.columns, Some(6));
        assert!(config.is_valid());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: PetConfig = toml::from_str("[animation]\nmode = \"wink\"\n").unwrap();
        assert_eq!(config.animation.mode, Mode::Wink);
        assert_eq!(config.animation.fps, 30);
        assert_eq!(config.synthesis, SynthesisConfig::default());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<PetConfig, _> = toml::from_str("[animation]\nmode = \"grumpy\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_collects_every_field() {
        let mut config = PetConfig::default();
        config.synthesis.size = 1;
        config.synthesis.palette_size = 0;
        config.animation.fps = 500;
        config.animation.frames = 0;
        config.output.scale = 0;
        config.output.columns = Some(0);

        let errors = config.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "synthesis.size",
                "synthesis.palette_size",
                "animation.fps",
                "output.scale",
                "animation.frames",
                "output.columns",
            ]
        );
        assert!(!config.is_valid());
    }

    #[test]
    fn test_validation_error_display() {
        let mut config = PetConfig::default();
        config.animation.fps = 0;
        let errors = config.validate();
        assert_eq!(errors[0].to_string(), "pet.toml: 'animation.fps' must be between 1 and 120 (got 0)");
    }

    #[test]
    fn test_config_serializes_back() {
        let config = PetConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("mode = \"calm\""));
        let parsed: PetConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
