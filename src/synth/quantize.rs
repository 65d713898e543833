//! Palette reduction using k-means clustering.
//!
//! Colors are clustered in plain RGB space with squared Euclidean distance.
//! Every resulting center then gets a saturation boost so a heavily reduced
//! palette stays readable at sprite scale.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

use super::OPACITY_THRESHOLD;
use crate::rng::Rng;

/// Default number of palette entries.
pub const DEFAULT_PALETTE_SIZE: usize = 16;

/// Upper bound on assign/update passes.
const MAX_ITERATIONS: usize = 12;

/// HSL saturation multiplier applied to every palette color.
const SATURATION_BOOST: f64 = 1.15;

/// An opaque color (alpha is carried separately by the pixel it recolors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2] }
    }

    pub fn with_alpha(self, a: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, a])
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse `#RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        Some(Self { r: channel(0)?, g: channel(2)?, b: channel(4)? })
    }

    /// Squared Euclidean distance over (R, G, B).
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", s)))
    }
}

/// Collect the colors of every pixel above the opacity threshold.
pub fn opaque_samples(image: &RgbaImage) -> Vec<Rgb> {
    image.pixels().filter(|p| p[3] > OPACITY_THRESHOLD).map(|p| Rgb::from_rgba(*p)).collect()
}

/// Build the final boosted palette for a set of opaque samples.
///
/// Samples are deduplicated (first occurrence order) before clustering. The
/// result has exactly `min(max_colors, distinct)` entries; an empty sample set
/// yields an empty palette.
pub fn quantize_palette(samples: &[Rgb], max_colors: usize, rng: &mut Rng) -> Vec<Rgb> {
    let mut seen = HashSet::new();
    let unique: Vec<Rgb> = samples.iter().copied().filter(|c| seen.insert(*c)).collect();
    if unique.is_empty() {
        return Vec::new();
    }

    let k = max_colors.clamp(1, unique.len());
    kmeans_palette(&unique, k, rng).into_iter().map(boost_saturation).collect()
}

/// Cluster `colors` into `k` centers.
///
/// When there are no more colors than clusters the colors themselves are the
/// centers. Otherwise centers start at `k` distinct random samples and are
/// refined until assignments settle or the iteration cap is hit. A cluster
/// that loses all its members keeps its previous center.
pub fn kmeans_palette(colors: &[Rgb], k: usize, rng: &mut Rng) -> Vec<Rgb> {
    let n = colors.len();
    if k == 0 || n == 0 {
        return Vec::new();
    }
    if k >= n {
        return colors.to_vec();
    }

    let mut used = HashSet::with_capacity(k);
    let mut centers = Vec::with_capacity(k);
    while centers.len() < k {
        let idx = rng.index(n);
        if used.insert(idx) {
            centers.push(colors[idx]);
        }
    }

    let mut assignments = vec![0usize; n];
    for iteration in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, &color) in colors.iter().enumerate() {
            let best = nearest_index(&centers, color).unwrap_or(0);
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        // [r, g, b, count]
        let mut sums = vec![[0u64; 4]; k];
        for (color, &cluster) in colors.iter().zip(&assignments) {
            let sum = &mut sums[cluster];
            sum[0] += color.r as u64;
            sum[1] += color.g as u64;
            sum[2] += color.b as u64;
            sum[3] += 1;
        }
        for (center, sum) in centers.iter_mut().zip(&sums) {
            if sum[3] == 0 {
                continue;
            }
            *center = Rgb::new(
                rounded_mean(sum[0], sum[3]),
                rounded_mean(sum[1], sum[3]),
                rounded_mean(sum[2], sum[3]),
            );
        }

        if !changed {
            tracing::debug!(iteration, clusters = k, "k-means converged");
            break;
        }
    }

    centers
}

/// Integer mean rounded half up.
fn rounded_mean(sum: u64, count: u64) -> u8 {
    ((sum * 2 + count) / (count * 2)).min(255) as u8
}

/// Index of the palette entry nearest to `color`. Ties keep the earliest entry.
pub fn nearest_index(palette: &[Rgb], color: Rgb) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, candidate) in palette.iter().enumerate() {
        let dist = candidate.distance_sq(color);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }
    best.map(|(i, _)| i)
}

/// The palette entry nearest to `color`.
pub fn nearest_color(palette: &[Rgb], color: Rgb) -> Option<Rgb> {
    nearest_index(palette, color).map(|i| palette[i])
}

/// Recolor every opaque pixel to its nearest palette entry.
///
/// Alpha is copied verbatim; pixels at or below the opacity threshold are
/// left untouched.
pub fn recolor(image: &RgbaImage, palette: &[Rgb]) -> RgbaImage {
    let mut output = image.clone();
    if palette.is_empty() {
        return output;
    }
    for pixel in output.pixels_mut() {
        if pixel[3] <= OPACITY_THRESHOLD {
            continue;
        }
        if let Some(nearest) = nearest_color(palette, Rgb::from_rgba(*pixel)) {
            *pixel = nearest.with_alpha(pixel[3]);
        }
    }
    output
}

/// Scale HSL saturation by the boost factor, keeping hue and lightness.
pub fn boost_saturation(color: Rgb) -> Rgb {
    let (h, s, l) = rgb_to_hsl(color);
    hsl_to_rgb(h, (s * SATURATION_BOOST).min(1.0), l)
}

pub(crate) fn rgb_to_hsl(color: Rgb) -> (f64, f64, f64) {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

pub(crate) fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    if s == 0.0 {
        let v = to_byte(l);
        return Rgb::new(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Rgb::new(
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
