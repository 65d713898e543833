//! Configuration loading and discovery for `pet.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::PetConfig;
use crate::anim::Mode;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for during discovery.
pub const CONFIG_FILE: &str = "pet.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pet.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override sprite size
    pub size: Option<u32>,
    /// Override palette size
    pub palette_size: Option<usize>,
    /// Override the k-means seed
    pub synthesis_seed: Option<u64>,
    /// Override expression
    pub mode: Option<Mode>,
    /// Override frame rate
    pub fps: Option<u32>,
    /// Override frame count
    pub frames: Option<usize>,
    /// Override the animation seed
    pub animation_seed: Option<u64>,
    /// Override scale factor
    pub scale: Option<u32>,
    /// Override spritesheet columns
    pub columns: Option<u32>,
}

/// Find pet.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pet.toml
/// 2. Check XDG_CONFIG_HOME/pixelpet/pet.toml (or ~/.config/pixelpet/pet.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find pet.toml in XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pixelpet").join(CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find pet.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a pet.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("pets/pet.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<PetConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            tracing::debug!(path = %p.display(), "loading config");
            load_config_file(&p)
        }
        None => Ok(PetConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<PetConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: PetConfig = toml::from_str(&contents)?;
    check(&config)?;
    Ok(config)
}

fn check(config: &PetConfig) -> Result<(), ConfigError> {
    let errors = config.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()))
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut PetConfig, overrides: &CliOverrides) {
    if let Some(size) = overrides.size {
        config.synthesis.size = size;
    }
    if let Some(palette_size) = overrides.palette_size {
        config.synthesis.palette_size = palette_size;
    }
    if let Some(seed) = overrides.synthesis_seed {
        config.synthesis.seed = Some(seed);
    }

    if let Some(mode) = overrides.mode {
        config.animation.mode = mode;
    }
    if let Some(fps) = overrides.fps {
        config.animation.fps = fps;
    }
    if let Some(frames) = overrides.frames {
        config.animation.frames = frames;
    }
    if let Some(seed) = overrides.animation_seed {
        config.animation.seed = seed;
    }

    if let Some(scale) = overrides.scale {
        config.output.scale = scale;
    }
    if let Some(columns) = overrides.columns {
        config.output.columns = Some(columns);
    }
}

/// Load, merge overrides and validate the result.
pub fn resolve_config(path: Option<&Path>, overrides: &CliOverrides) -> Result<PetConfig, ConfigError> {
    let mut config = load_config(path)?;
    merge_cli_overrides(&mut config, overrides);
    check(&config)?;
    Ok(config)
}
