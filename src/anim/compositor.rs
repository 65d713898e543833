//! Per-frame pixel operations over an immutable base sprite.

use image::{Rgba, RgbaImage};

use crate::synth::{BoundingBox, Silhouette, OPACITY_THRESHOLD};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Rows occupied by the body after a vertical stretch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StretchSpan {
    pub top: i32,
    pub height: i32,
}

/// A silhouette pixel with at least one background 4-neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePixel {
    pub x: i32,
    pub y: i32,
    pub color: Rgba<u8>,
}

/// Owns the base sprite and the live frame derived from it.
///
/// The base is never written after construction. Every operation writes only
/// to the frame, and all writes are bounds-checked: off-buffer coordinates
/// are dropped silently.
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    base: Option<RgbaImage>,
    bounds: BoundingBox,
    frame: RgbaImage,
}

impl FrameCompositor {
    /// A compositor with no sprite loaded; every frame it produces is cleared.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            base: None,
            bounds: BoundingBox::fallback(width, height),
            frame: RgbaImage::new(width, height),
        }
    }

    /// Load a base sprite.
    ///
    /// The base is normalized on install: every alpha-0 pixel becomes
    /// `(0, 0, 0, 0)`, whatever RGB it carried. Later copies, including
    /// [`frame_from_base`](Self::frame_from_base), see the normalized base
    /// rather than the buffer as passed in.
    pub fn new(mut base: RgbaImage, bounds: BoundingBox) -> Self {
        for pixel in base.pixels_mut() {
            if pixel[3] == 0 {
                *pixel = TRANSPARENT;
            }
        }
        let frame = RgbaImage::new(base.width(), base.height());
        Self { base: Some(base), bounds, frame }
    }

    /// Load a base sprite, computing the bounding box from its silhouette.
    pub fn from_sprite(base: RgbaImage) -> Self {
        let bounds = Silhouette::scan(&base).bounds();
        Self::new(base, bounds)
    }

    pub fn has_sprite(&self) -> bool {
        self.base.is_some()
    }

    pub fn base(&self) -> Option<&RgbaImage> {
        self.base.as_ref()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn width(&self) -> i32 {
        self.frame.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.frame.height() as i32
    }

    /// The current frame.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() && y < self.height()
    }

    /// Clamp a column into the buffer.
    pub fn clamp_x(&self, x: i32) -> i32 {
        x.clamp(0, (self.width() - 1).max(0))
    }

    /// Clamp a row into the buffer.
    pub fn clamp_y(&self, y: i32) -> i32 {
        y.clamp(0, (self.height() - 1).max(0))
    }

    /// Clear the frame to fully transparent.
    pub fn blank_frame(&mut self) {
        for pixel in self.frame.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    /// Copy the normalized base sprite into the frame verbatim.
    pub fn frame_from_base(&mut self) {
        match &self.base {
            Some(base) => self.frame.copy_from_slice(base.as_raw()),
            None => self.blank_frame(),
        }
    }

    /// Write one pixel; out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if self.in_bounds(x, y) {
            self.frame.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Base sprite pixel, or transparent when out of range or unloaded.
    pub fn base_pixel(&self, x: i32, y: i32) -> Rgba<u8> {
        match &self.base {
            Some(base) if self.in_bounds(x, y) => *base.get_pixel(x as u32, y as u32),
            _ => TRANSPARENT,
        }
    }

    /// Put the base pixel back, erasing any overlay at (x, y).
    pub fn restore_from_base(&mut self, x: i32, y: i32) {
        let color = self.base_pixel(x, y);
        self.set_pixel(x, y, color);
    }

    /// Translate the base sprite by (dx, dy) into the frame.
    ///
    /// Zero-alpha source pixels and off-buffer destinations are skipped.
    pub fn copy_with_offset(&mut self, dx: i32, dy: i32) {
        let Some(base) = &self.base else {
            return;
        };
        let (width, height) = (self.width(), self.height());
        for (x, y, pixel) in base.enumerate_pixels() {
            if pixel[3] == 0 {
                continue;
            }
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if nx < 0 || ny < 0 || nx >= width || ny >= height {
                continue;
            }
            self.frame.put_pixel(nx as u32, ny as u32, *pixel);
        }
    }

    /// Resample the body rows to `scale` times their height, keeping the
    /// bottom row fixed.
    ///
    /// Each destination row blends the two nearest source rows linearly, alpha
    /// included. Destinations whose two sources are both fully transparent
    /// are left as they are.
    pub fn vertical_stretch(&mut self, scale: f64) -> StretchSpan {
        let bounds = self.bounds;
        let height = self.height();
        let body_height = bounds.height();
        let new_height = ((body_height as f64 * scale).round() as i32).clamp(1, height.max(1));
        let top = (bounds.max_y - new_height + 1).clamp(0, (height - new_height).max(0));
        let span = StretchSpan { top, height: new_height };

        let Some(base) = &self.base else {
            return span;
        };

        for x in bounds.min_x.max(0)..=bounds.max_x.min(self.width() - 1) {
            for step in 0..new_height {
                let dest_y = top + step;
                let source_y = if new_height == 1 {
                    bounds.min_y as f64
                } else {
                    bounds.min_y as f64
                        + (step * (body_height - 1)) as f64 / (new_height - 1) as f64
                };
                let y0 = (source_y.floor() as i32).clamp(0, height - 1);
                let y1 = (y0 + 1).min(bounds.max_y).clamp(0, height - 1);
                let t = source_y - y0 as f64;

                let p0 = base.get_pixel(x as u32, y0 as u32);
                let p1 = base.get_pixel(x as u32, y1 as u32);
                if p0[3] == 0 && p1[3] == 0 {
                    continue;
                }
                let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
                let blended =
                    Rgba([mix(p0[0], p1[0]), mix(p0[1], p1[1]), mix(p0[2], p1[2]), mix(p0[3], p1[3])]);
                if dest_y >= 0 && dest_y < height {
                    self.frame.put_pixel(x as u32, dest_y as u32, blended);
                }
            }
        }

        span
    }

    /// Silhouette pixels touching the background or the buffer edge.
    pub fn edge_pixels(&self) -> Vec<EdgePixel> {
        let Some(base) = &self.base else {
            return Vec::new();
        };
        let (width, height) = (self.width(), self.height());
        let is_background = |x: i32, y: i32| {
            x < 0
                || y < 0
                || x >= width
                || y >= height
                || base.get_pixel(x as u32, y as u32)[3] <= OPACITY_THRESHOLD
        };

        base.enumerate_pixels()
            .filter(|(_, _, pixel)| pixel[3] > OPACITY_THRESHOLD)
            .map(|(x, y, pixel)| (x as i32, y as i32, *pixel))
            .filter(|&(x, y, _)| {
                [(0, -1), (1, 0), (0, 1), (-1, 0)]
                    .iter()
                    .any(|(ox, oy)| is_background(x + ox, y + oy))
            })
            .map(|(x, y, color)| EdgePixel { x, y, color })
            .collect()
    }
}
