//! Pixelate command implementation

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use super::{finish, CliError};
use crate::config::{resolve_config, CliOverrides, PetConfig};
use crate::cutout::Passthrough;
use crate::output::{generate_output_path, save_json, save_png, scale_image};
use crate::synth::{synthesize_with_cutout, PixelArt, SynthesisError, SynthesisOptions};

/// Synthesis options from a resolved configuration.
pub(crate) fn synthesis_options(config: &PetConfig) -> SynthesisOptions {
    SynthesisOptions {
        size: config.synthesis.size,
        palette_size: config.synthesis.palette_size,
        seed: config.synthesis.seed,
    }
}

/// Read an image file and synthesize a sprite from it.
pub(crate) fn pixelate_file(input: &Path, config: &PetConfig) -> Result<PixelArt, CliError> {
    let bytes = fs::read(input).map_err(SynthesisError::from)?;
    Ok(synthesize_with_cutout(&bytes, &Passthrough, &synthesis_options(config))?)
}

/// Execute the pixelate command
pub fn run_pixelate(
    input: &Path,
    output: Option<&Path>,
    meta: Option<&Path>,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> ExitCode {
    finish(pixelate(input, output, meta, config_path, overrides))
}

fn pixelate(
    input: &Path,
    output: Option<&Path>,
    meta: Option<&Path>,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<(), CliError> {
    let config = resolve_config(config_path, overrides)?;
    let art = pixelate_file(input, &config)?;

    let path = generate_output_path(input, "pixel", "png", output);
    save_png(&scale_image(art.image.clone(), config.output.scale), &path)?;
    println!("Saved: {}", path.display());

    if let Some(meta_path) = meta {
        save_json(&art.metadata(), meta_path)?;
        println!("Saved: {}", meta_path.display());
    }
    Ok(())
}
