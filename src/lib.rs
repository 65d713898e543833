//! Pixelpet - turn any picture into a small pixel pet and animate its moods
//!
//! This library provides functionality to:
//! - Synthesize a pixel-art sprite from an image (downscale, denoise, eye
//!   placement, k-means palette reduction)
//! - Animate the sprite procedurally in six expression modes
//! - Export frames as PNG, animated GIF or spritesheet

pub mod anim;
pub mod cli;
pub mod config;
pub mod cutout;
pub mod gif;
pub mod output;
pub mod rng;
pub mod spritesheet;
pub mod synth;
