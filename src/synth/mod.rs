//! Pixel-art synthesis: turn an arbitrary picture into a small pet sprite.
//!
//! The pipeline runs in a fixed order:
//! 1. Decode the source image
//! 2. Nearest-neighbor downscale to fit a `size x size` square, keeping aspect ratio
//! 3. Center it on a transparent canvas
//! 4. Median-filter the opaque pixels
//! 5. Place the eyes from the silhouette (before any color reduction)
//! 6. Reduce colors with k-means and recolor every opaque pixel

mod denoise;
mod features;
mod quantize;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use thiserror::Error;

use crate::cutout::{CutoutError, CutoutService};
use crate::rng::Rng;

pub use denoise::median_filter;
pub use features::{locate_features, BoundingBox, EyePair, EyePoint, FeatureScan, Point, Silhouette};
pub use quantize::{
    boost_saturation, kmeans_palette, nearest_color, nearest_index, opaque_samples,
    quantize_palette, recolor, Rgb, DEFAULT_PALETTE_SIZE,
};

/// Alpha at or below this value counts as background.
pub const OPACITY_THRESHOLD: u8 = 20;

/// Default edge length of the generated sprite.
pub const DEFAULT_SIZE: u32 = 16;

/// Error type for synthesis failures
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Source bytes are not a decodable image
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    /// The background-removal step failed
    #[error("background removal failed: {0}")]
    Cutout(#[from] CutoutError),
    /// Source file could not be read
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    /// A background job ended without reporting a result
    #[error("synthesis worker stopped before producing a sprite")]
    WorkerLost,
}

/// Tunables for one synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Output edge length in pixels
    pub size: u32,
    /// Maximum palette entries
    pub palette_size: usize,
    /// Seed for k-means initialization; `None` draws one from the clock
    pub seed: Option<u64>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self { size: DEFAULT_SIZE, palette_size: DEFAULT_PALETTE_SIZE, seed: None }
    }
}

/// A finished sprite with everything the animator needs.
#[derive(Debug, Clone)]
pub struct PixelArt {
    /// Final quantized sprite
    pub image: RgbaImage,
    /// Eye anchors computed from the filtered silhouette
    pub eyes: EyePair,
    /// Boosted palette every opaque pixel was mapped to
    pub palette: Vec<Rgb>,
    /// Edge length used
    pub size: u32,
    /// Palette size requested
    pub palette_size: usize,
    /// Whether the silhouette was empty and the fallback box was used
    pub fallback_silhouette: bool,
}

/// Serializable description of a sprite, written next to the PNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteMetadata {
    pub size: u32,
    pub palette_size: usize,
    pub palette: Vec<Rgb>,
    pub eyes: EyePair,
}

impl PixelArt {
    pub fn metadata(&self) -> SpriteMetadata {
        SpriteMetadata {
            size: self.size,
            palette_size: self.palette_size,
            palette: self.palette.clone(),
            eyes: self.eyes,
        }
    }
}

/// Decode encoded image bytes and synthesize a sprite from them.
pub fn synthesize(bytes: &[u8], options: &SynthesisOptions) -> Result<PixelArt, SynthesisError> {
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    Ok(synthesize_image(&decoded, options))
}

/// Read an image file and synthesize a sprite from it.
pub fn synthesize_file<P: AsRef<Path>>(
    path: P,
    options: &SynthesisOptions,
) -> Result<PixelArt, SynthesisError> {
    let bytes = std::fs::read(path.as_ref())?;
    synthesize(&bytes, options)
}

/// Run the bytes through a cutout service first, then synthesize.
pub fn synthesize_with_cutout(
    bytes: &[u8],
    cutout: &dyn CutoutService,
    options: &SynthesisOptions,
) -> Result<PixelArt, SynthesisError> {
    let cut = cutout.remove_background(bytes)?;
    synthesize(&cut, options)
}

/// Synthesize from an already decoded image.
#[tracing::instrument(skip(source), fields(src_w = source.width(), src_h = source.height()))]
pub fn synthesize_image(source: &RgbaImage, options: &SynthesisOptions) -> PixelArt {
    let size = options.size.max(1);
    let canvas = fit_to_canvas(source, size);
    let filtered = median_filter(&canvas);

    let scan = locate_features(&filtered);
    tracing::debug!(bounds = ?scan.silhouette.bounds(), "silhouette located");

    let mut rng = options.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);
    let samples = opaque_samples(&filtered);
    let palette = quantize_palette(&samples, options.palette_size, &mut rng);
    let image = recolor(&filtered, &palette);
    tracing::debug!(opaque = samples.len(), colors = palette.len(), "palette reduced");

    PixelArt {
        image,
        eyes: scan.eyes,
        palette,
        size,
        palette_size: options.palette_size,
        fallback_silhouette: scan.silhouette.is_fallback(),
    }
}

/// Scale `source` to fit a `size x size` square (nearest neighbor) and center
/// it on a transparent canvas.
pub fn fit_to_canvas(source: &RgbaImage, size: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(size, size);
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return canvas;
    }

    let scale = (size as f64 / src_w as f64).min(size as f64 / src_h as f64);
    let scaled_w = ((src_w as f64 * scale).round() as u32).clamp(1, size);
    let scaled_h = ((src_h as f64 * scale).round() as u32).clamp(1, size);
    let scaled = imageops::resize(source, scaled_w, scaled_h, FilterType::Nearest);

    let offset_x = (size - scaled_w) / 2;
    let offset_y = (size - scaled_h) / 2;
    imageops::replace(&mut canvas, &scaled, offset_x as i64, offset_y as i64);
    canvas
}

/// A synthesis job running on a worker thread.
///
/// The result is delivered whole, so whoever installs it never observes a
/// half-built sprite.
#[derive(Debug)]
pub struct PendingSprite {
    receiver: Receiver<Result<PixelArt, SynthesisError>>,
}

impl PendingSprite {
    /// Non-blocking poll. `None` while the job is still running.
    pub fn try_take(&self) -> Option<Result<PixelArt, SynthesisError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SynthesisError::WorkerLost)),
        }
    }

    /// Block until the job finishes.
    pub fn wait(self) -> Result<PixelArt, SynthesisError> {
        self.receiver.recv().unwrap_or(Err(SynthesisError::WorkerLost))
    }
}

/// Start cutout + synthesis on a background thread.
pub fn spawn_synthesis<C>(bytes: Vec<u8>, cutout: C, options: SynthesisOptions) -> PendingSprite
where
    C: CutoutService + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let result = synthesize_with_cutout(&bytes, &cutout, &options);
        // The receiver may have been dropped; nothing left to notify then.
        let _ = sender.send(result);
    });
    PendingSprite { receiver }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::Passthrough;
    use image::Rgba;
    use std::io::Cursor;

    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .expect("png encoding should succeed");
        bytes
    }

    #[test]
    fn test_fit_to_canvas_centers_wide_image() {
        let src = RgbaImage::from_pixel(32, 16, Rgba([10, 20, 30, 255]));
        let canvas = fit_to_canvas(&src, 16);
        assert_eq!(canvas.dimensions(), (16, 16));
        // 32x16 -> 16x8, offset y = 4
        assert_eq!(canvas.get_pixel(0, 3)[3], 0);
        assert_eq!(*canvas.get_pixel(0, 4), Rgba([10, 20, 30, 255]));
        assert_eq!(*canvas.get_pixel(15, 11), Rgba([10, 20, 30, 255]));
        assert_eq!(canvas.get_pixel(15, 12)[3], 0);
    }

    #[test]
    fn test_fit_to_canvas_upscales_small_image() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let canvas = fit_to_canvas(&src, 16);
        assert!(canvas.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn test_fit_to_canvas_keeps_hard_edges() {
        // Left half black, right half white; nearest neighbor must not invent grays.
        let src = RgbaImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let canvas = fit_to_canvas(&src, 16);
        assert!(canvas.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_synthesize_rejects_garbage() {
        let result = synthesize(b"definitely not an image", &SynthesisOptions::default());
        assert!(matches!(result, Err(SynthesisError::ImageDecode(_))));
    }

    #[test]
    fn test_synthesize_png_bytes() {
        let src = RgbaImage::from_fn(24, 24, |x, y| {
            if (4..20).contains(&x) && (6..22).contains(&y) {
                Rgba([(x * 10) as u8, 120, (y * 10) as u8, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let options = SynthesisOptions { size: 16, palette_size: 4, seed: Some(5) };
        let art = synthesize(&encode_png(&src), &options).expect("synthesis should succeed");

        assert_eq!(art.image.dimensions(), (16, 16));
        assert!(art.palette.len() <= 4);
        assert!(!art.fallback_silhouette);
        for pixel in art.image.pixels().filter(|p| p[3] > OPACITY_THRESHOLD) {
            assert!(art.palette.contains(&Rgb::from_rgba(*pixel)));
        }
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let src = RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 77, 255]));
        let options = SynthesisOptions { size: 16, palette_size: 3, seed: Some(9) };
        let a = synthesize_image(&src, &options);
        let b = synthesize_image(&src, &options);
        assert_eq!(a.palette, b.palette);
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_transparent_source_uses_fallback() {
        let art = synthesize_image(&RgbaImage::new(10, 10), &SynthesisOptions::default());
        assert!(art.fallback_silhouette);
        assert!(art.palette.is_empty());
        assert_eq!(art.eyes.bounds, BoundingBox::new(4, 4, 12, 12));
    }

    #[test]
    fn test_cutout_failure_is_reported() {
        let result = synthesize_with_cutout(&[], &Passthrough, &SynthesisOptions::default());
        assert!(matches!(result, Err(SynthesisError::Cutout(CutoutError::Empty))));
    }

    #[test]
    fn test_spawned_synthesis_delivers_result() {
        let src = RgbaImage::from_pixel(8, 8, Rgba([0, 200, 0, 255]));
        let options = SynthesisOptions { seed: Some(1), ..Default::default() };
        let pending = spawn_synthesis(encode_png(&src), Passthrough, options);
        let art = pending.wait().expect("background synthesis should succeed");
        assert_eq!(art.image.dimensions(), (16, 16));
    }

    #[test]
    fn test_metadata_json() {
        let art = synthesize_image(
            &RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255])),
            &SynthesisOptions { palette_size: 1, seed: Some(1), ..Default::default() },
        );
        let json = serde_json::to_value(art.metadata()).unwrap();
        assert_eq!(json["palette"][0], "#FF0000");
        assert_eq!(json["size"], 16);
        assert!(json["eyes"]["left"]["pupil"]["x"].is_number());
    }
}
