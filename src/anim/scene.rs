//! The installed sprite as seen by the renderers.

use image::RgbaImage;

use super::compositor::{EdgePixel, FrameCompositor};
use crate::synth::{EyePair, PixelArt, Silhouette};

/// Base sprite, eye anchors, bounds and edge set for one sprite lifetime.
///
/// Built in one go and replaced in one go, so a tick only ever sees a
/// consistent set.
#[derive(Debug, Clone)]
pub struct Scene {
    pub compositor: FrameCompositor,
    pub eyes: Option<EyePair>,
    pub edges: Vec<EdgePixel>,
}

impl Scene {
    /// No sprite loaded.
    pub fn empty(width: u32, height: u32) -> Self {
        Self { compositor: FrameCompositor::empty(width, height), eyes: None, edges: Vec::new() }
    }

    /// Prepare a sprite for animation. Missing eyes are located from the
    /// silhouette; provided eyes also supply the bounding box.
    pub fn with_sprite(pixels: RgbaImage, eyes: Option<EyePair>) -> Self {
        let eyes = eyes.unwrap_or_else(|| {
            let bounds = Silhouette::scan(&pixels).bounds();
            EyePair::from_bounds(bounds, pixels.width(), pixels.height())
        });
        let compositor = FrameCompositor::new(pixels, eyes.bounds);
        let edges = compositor.edge_pixels();
        Self { compositor, eyes: Some(eyes), edges }
    }

    pub fn has_sprite(&self) -> bool {
        self.compositor.has_sprite()
    }
}

impl From<&PixelArt> for Scene {
    fn from(art: &PixelArt) -> Self {
        Scene::with_sprite(art.image.clone(), Some(art.eyes))
    }
}
