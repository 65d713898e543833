//! Animated GIF export

use crate::output::OutputError;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Per-frame delay in milliseconds for a frame rate, rounded to the
/// centisecond GIF stores and never below 10 ms.
pub fn frame_delay_ms(fps: u32) -> u32 {
    let ms = 1000.0 / fps.max(1) as f64;
    ((ms / 10.0).round() as u32).max(1) * 10
}

/// Encode frames as an endlessly looping GIF into any writer.
pub fn encode_gif<W: Write>(frames: &[RgbaImage], fps: u32, writer: W) -> Result<(), OutputError> {
    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(Repeat::Infinite)?;

    let delay = Delay::from_numer_denom_ms(frame_delay_ms(fps), 1);
    for rgba_image in frames {
        encoder.encode_frame(Frame::from_parts(rgba_image.clone(), 0, 0, delay))?;
    }
    Ok(())
}

/// Render a sequence of frames as an animated GIF file.
///
/// An empty frame list writes nothing.
pub fn render_gif(frames: &[RgbaImage], fps: u32, path: &Path) -> Result<(), OutputError> {
    if frames.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    encode_gif(frames, fps, BufWriter::new(file))
}
