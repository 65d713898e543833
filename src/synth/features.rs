//! Silhouette bounds and eye placement.
//!
//! Eyes are placed purely from the opaque bounding box, so they land in the
//! same spot no matter how the palette is later reduced.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::OPACITY_THRESHOLD;

/// An integer pixel coordinate. Signed so animation math can step off-buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Smallest rectangle containing every pixel above the opacity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// The fixed 9x9 box used when no pixel is opaque.
    pub const FALLBACK: BoundingBox = BoundingBox::new(4, 4, 12, 12);

    /// Substitute box for a sprite with no opaque pixels.
    ///
    /// Always [`BoundingBox::FALLBACK`], pulled inside the buffer only when
    /// the buffer is smaller than 13x13.
    pub fn fallback(width: u32, height: u32) -> Self {
        let last_x = width.saturating_sub(1) as i32;
        let last_y = height.saturating_sub(1) as i32;
        let f = Self::FALLBACK;
        Self {
            min_x: f.min_x.min(last_x),
            min_y: f.min_y.min(last_y),
            max_x: f.max_x.min(last_x),
            max_y: f.max_y.min(last_y),
        }
    }

    /// Number of rows covered, at least 1.
    pub fn height(&self) -> i32 {
        (self.max_y - self.min_y + 1).max(1)
    }

    /// Horizontal distance between the outermost columns.
    pub fn span_x(&self) -> i32 {
        self.max_x - self.min_x
    }

    /// Vertical distance between the outermost rows.
    pub fn span_y(&self) -> i32 {
        self.max_y - self.min_y
    }
}

/// Outcome of scanning a buffer for its opaque silhouette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Silhouette {
    /// At least one pixel cleared the threshold.
    Opaque(BoundingBox),
    /// Nothing cleared the threshold; the fixed fallback box stands in.
    EmptyFallback(BoundingBox),
}

impl Silhouette {
    pub fn scan(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut found: Option<BoundingBox> = None;

        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel[3] <= OPACITY_THRESHOLD {
                continue;
            }
            let (x, y) = (x as i32, y as i32);
            found = Some(match found {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(
                    b.min_x.min(x),
                    b.min_y.min(y),
                    b.max_x.max(x),
                    b.max_y.max(y),
                ),
            });
        }

        match found {
            Some(bounds) => Silhouette::Opaque(bounds),
            None => {
                let bounds = BoundingBox::fallback(width, height);
                tracing::warn!(
                    width,
                    height,
                    ?bounds,
                    "no opaque pixels found, using fallback silhouette"
                );
                Silhouette::EmptyFallback(bounds)
            }
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        match *self {
            Silhouette::Opaque(b) | Silhouette::EmptyFallback(b) => b,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Silhouette::EmptyFallback(_))
    }
}

/// The two dots of one eye. Which is painted black encodes gaze direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyePoint {
    /// Outer dot
    pub pupil: Point,
    /// Inner dot, one step toward the horizontal center
    pub highlight: Point,
}

/// Eye anchors for a sprite, fixed at synthesis time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyePair {
    pub left: EyePoint,
    pub right: EyePoint,
    pub center_y: i32,
    pub bounds: BoundingBox,
}

impl EyePair {
    /// Place both eyes at 60% height and 25% / 75% width of the box.
    pub fn from_bounds(bounds: BoundingBox, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1) as i32;
        let max_y = height.saturating_sub(1) as i32;

        let eye_y = (bounds.min_y as f64 + bounds.span_y() as f64 * 0.6).floor() as i32;
        let left_x = (bounds.min_x as f64 + bounds.span_x() as f64 * 0.25).floor() as i32;
        let right_x = (bounds.min_x as f64 + bounds.span_x() as f64 * 0.75).floor() as i32;
        let eye_y = eye_y.clamp(0, max_y);

        EyePair {
            left: EyePoint {
                pupil: Point::new(left_x, eye_y),
                highlight: Point::new((left_x + 1).clamp(0, max_x), eye_y),
            },
            right: EyePoint {
                pupil: Point::new(right_x, eye_y),
                highlight: Point::new((right_x - 1).clamp(0, max_x), eye_y),
            },
            center_y: eye_y,
            bounds,
        }
    }
}

/// Eyes plus the silhouette scan they were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureScan {
    pub eyes: EyePair,
    pub silhouette: Silhouette,
}

/// Scan the silhouette and place the eyes.
pub fn locate_features(image: &RgbaImage) -> FeatureScan {
    let silhouette = Silhouette::scan(image);
    let eyes = EyePair::from_bounds(silhouette.bounds(), image.width(), image.height());
    FeatureScan { eyes, silhouette }
}
