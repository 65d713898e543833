//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod animate;
mod pixelate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use crate::anim::Mode;
use crate::config::{CliOverrides, ConfigError};
use crate::output::OutputError;
use crate::synth::SynthesisError;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Anything a command can fail with
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Synthesis(#[from] SynthesisError),
    #[error("{0}")]
    Output(#[from] OutputError),
    #[error("failed to load sprite {path}: {source}")]
    Sprite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(ConfigError::Validation(_)) => EXIT_INVALID_ARGS,
            _ => EXIT_ERROR,
        }
    }
}

/// Report a command result as an exit code, printing any error.
pub(crate) fn finish(result: Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Pixelpet - turn any picture into a pixel pet and animate its moods
#[derive(Parser)]
#[command(name = "pxpet")]
#[command(about = "Pixelpet - turn any picture into a pixel pet and animate its moods")]
#[command(version)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn an image into a pixel-art sprite PNG
    Pixelate {
        /// Source image (PNG, JPEG, GIF, BMP, WebP...)
        input: PathBuf,

        /// Output file or directory.
        /// If omitted: {input}_pixel.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sprite edge length in pixels (2-256, default: 16)
        #[arg(long, value_parser = clap::value_parser!(u32).range(2..=256))]
        size: Option<u32>,

        /// Maximum palette colors (1-256, default: 16)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=256))]
        palette_size: Option<u32>,

        /// Scale output by integer factor (1-64, default: 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=64))]
        scale: Option<u32>,

        /// Also write palette and eye positions as JSON
        #[arg(long)]
        meta: Option<PathBuf>,

        /// Seed for palette clustering (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Config file (default: discover pet.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Animate a pet in one of its moods and export GIF or spritesheet
    Animate {
        /// Source image, or a finished sprite with --from-sprite
        input: PathBuf,

        /// Output file or directory.
        /// If omitted: {input}_{mode}.gif, or {input}_{mode}_sheet.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Mood: calm, excited, happy, sad, wink, sleepy
        #[arg(short, long)]
        mode: Option<Mode>,

        /// Number of frames to render
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        frames: Option<u32>,

        /// Frames per second (1-120, default: 30)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=120))]
        fps: Option<u32>,

        /// Scale output by integer factor (1-64, default: 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=64))]
        scale: Option<u32>,

        /// Export a spritesheet PNG instead of a GIF
        #[arg(long)]
        spritesheet: bool,

        /// Spritesheet columns (default: one row)
        #[arg(long, requires = "spritesheet", value_parser = clap::value_parser!(u32).range(1..))]
        columns: Option<u32>,

        /// Input is already a pixel sprite; skip synthesis
        #[arg(long)]
        from_sprite: bool,

        /// Sprite edge length when synthesizing (2-256, default: 16)
        #[arg(long, value_parser = clap::value_parser!(u32).range(2..=256))]
        size: Option<u32>,

        /// Maximum palette colors when synthesizing (1-256, default: 16)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=256))]
        palette_size: Option<u32>,

        /// Seed for wink timing, sleep cycles and outline jitter
        #[arg(long)]
        seed: Option<u64>,

        /// Config file (default: discover pet.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Install the stderr log subscriber for the chosen verbosity.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parse arguments and run the requested command
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Pixelate { input, output, size, palette_size, scale, meta, seed, config } => {
            let overrides = CliOverrides {
                size,
                palette_size: palette_size.map(|k| k as usize),
                synthesis_seed: seed,
                scale,
                ..Default::default()
            };
            pixelate::run_pixelate(
                &input,
                output.as_deref(),
                meta.as_deref(),
                config.as_deref(),
                &overrides,
            )
        }
        Commands::Animate {
            input,
            output,
            mode,
            frames,
            fps,
            scale,
            spritesheet,
            columns,
            from_sprite,
            size,
            palette_size,
            seed,
            config,
        } => {
            let overrides = CliOverrides {
                size,
                palette_size: palette_size.map(|k| k as usize),
                mode,
                fps,
                frames: frames.map(|n| n as usize),
                animation_seed: seed,
                scale,
                columns,
                ..Default::default()
            };
            animate::run_animate(
                &input,
                output.as_deref(),
                config.as_deref(),
                &overrides,
                spritesheet,
                from_sprite,
            )
        }
    }
}
