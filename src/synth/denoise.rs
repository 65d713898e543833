//! Alpha-aware 3x3 median filter.

use image::{Rgba, RgbaImage};

use super::OPACITY_THRESHOLD;

/// Smooth resize and compression speckle inside the subject.
///
/// Each channel of an opaque pixel is replaced with the median of that channel
/// over its in-bounds 3x3 neighborhood (4 to 9 samples). Pixels at or below the
/// opacity threshold are copied unchanged so the silhouette keeps hard edges.
pub fn median_filter(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut filtered = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let pixel = *image.get_pixel(x, y);
            if pixel[3] <= OPACITY_THRESHOLD {
                filtered.put_pixel(x, y, pixel);
                continue;
            }

            let mut channels: [Vec<u8>; 4] = Default::default();
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let neighbor = image.get_pixel(nx, ny);
                    for (c, values) in channels.iter_mut().enumerate() {
                        values.push(neighbor[c]);
                    }
                }
            }

            let [r, g, b, a] = channels.map(median);
            filtered.put_pixel(x, y, Rgba([r, g, b, a]));
        }
    }

    filtered
}

/// Upper median of a sample set.
fn median(mut values: Vec<u8>) -> u8 {
    values.sort_unstable();
    values.get(values.len() / 2).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_speck_is_removed() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let out = median_filter(&img);
        assert_eq!(*out.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_transparent_pixels_pass_through() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([9, 8, 7, 0]));
        img.put_pixel(3, 3, Rgba([1, 2, 3, 20]));
        let out = median_filter(&img);

        assert_eq!(out.dimensions(), img.dimensions());
        assert_eq!(*out.get_pixel(0, 0), Rgba([9, 8, 7, 0]));
        assert_eq!(*out.get_pixel(3, 3), Rgba([1, 2, 3, 20]));
    }

    #[test]
    fn test_property_low_alpha_untouched_on_mixed_buffer() {
        // Stripe pattern with varying alpha, including values around the threshold.
        let img = RgbaImage::from_fn(7, 5, |x, y| {
            let a = ((x * 37 + y * 11) % 60) as u8;
            Rgba([(x * 30) as u8, (y * 40) as u8, ((x + y) * 9) as u8, a * 4])
        });
        let out = median_filter(&img);
        assert_eq!(out.dimensions(), (7, 5));
        for (x, y, pixel) in img.enumerate_pixels() {
            if pixel[3] <= OPACITY_THRESHOLD {
                assert_eq!(out.get_pixel(x, y), pixel, "pixel ({}, {}) changed", x, y);
            }
        }
    }

    #[test]
    fn test_corner_uses_in_bounds_neighbors_only() {
        // Corner has 4 samples: 3 dark, 1 bright -> upper median of [0, 0, 0, 255] is 0.
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        let out = median_filter(&img);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_input_not_mutated() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([5, 5, 5, 255]));
        img.put_pixel(1, 1, Rgba([250, 250, 250, 255]));
        let before = img.clone();
        let _ = median_filter(&img);
        assert_eq!(img, before);
    }
}
