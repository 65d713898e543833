//! Animate command implementation

use std::path::Path;
use std::process::ExitCode;

use super::pixelate::pixelate_file;
use super::{finish, CliError};
use crate::anim::{AnimationDriver, FrameCollector};
use crate::config::{resolve_config, CliOverrides, PetConfig};
use crate::gif::render_gif;
use crate::output::{generate_output_path, save_png, scale_image};
use crate::spritesheet::render_spritesheet;

/// Execute the animate command
pub fn run_animate(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    spritesheet: bool,
    from_sprite: bool,
) -> ExitCode {
    finish(animate(input, output, config_path, overrides, spritesheet, from_sprite))
}

/// Build a running driver with the input installed as its sprite.
fn prepare_driver(input: &Path, config: &PetConfig, from_sprite: bool) -> Result<AnimationDriver, CliError> {
    let size = config.synthesis.size;
    let mut driver = AnimationDriver::new(size, size, config.animation.seed);
    driver.select_mode(config.animation.mode);

    if from_sprite {
        let sprite = image::open(input)
            .map_err(|source| CliError::Sprite { path: input.to_path_buf(), source })?
            .to_rgba8();
        driver.install(sprite, None);
    } else {
        driver.install_art(&pixelate_file(input, config)?);
    }
    Ok(driver)
}

fn animate(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    spritesheet: bool,
    from_sprite: bool,
) -> Result<(), CliError> {
    let config = resolve_config(config_path, overrides)?;
    let mut driver = prepare_driver(input, &config, from_sprite)?;

    let mut collector = FrameCollector::new();
    driver.run_for(config.animation.frames, config.animation.fps, &mut collector);
    let scale = config.output.scale;
    let frames: Vec<_> = collector.into_frames().into_iter().map(|f| scale_image(f, scale)).collect();

    let mode = config.animation.mode;
    let path = if spritesheet {
        let path = generate_output_path(input, &format!("{}_sheet", mode), "png", output);
        save_png(&render_spritesheet(&frames, config.output.columns), &path)?;
        path
    } else {
        let path = generate_output_path(input, mode.name(), "gif", output);
        render_gif(&frames, config.animation.fps, &path)?;
        path
    };

    println!("Saved: {} ({} frames, {})", path.display(), frames.len(), mode);
    Ok(())
}
