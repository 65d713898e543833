//! Spritesheet export: every animation frame laid out on one image

use image::imageops;
use image::{Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Columns and rows needed for `count` frames.
///
/// `None` (or zero) puts every frame in one row. Columns never exceed the
/// frame count.
pub fn sheet_grid(count: u32, columns: Option<u32>) -> (u32, u32) {
    if count == 0 {
        return (0, 0);
    }
    let columns = columns.filter(|&c| c > 0).unwrap_or(count).min(count);
    (columns, count.div_ceil(columns))
}

/// Combine frames into a grid, row-major in frame order.
///
/// Cells are sized to the largest frame; smaller frames sit in the top-left
/// of their cell. No frames gives a single transparent pixel.
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use pixelpet::spritesheet::render_spritesheet;
///
/// let frame = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
/// let frames = vec![frame.clone(), frame.clone(), frame.clone(), frame];
///
/// let sheet = render_spritesheet(&frames, None);
/// assert_eq!(sheet.dimensions(), (8, 2));
///
/// let sheet = render_spritesheet(&frames, Some(2));
/// assert_eq!(sheet.dimensions(), (4, 4));
/// ```
pub fn render_spritesheet(frames: &[RgbaImage], columns: Option<u32>) -> RgbaImage {
    if frames.is_empty() {
        return RgbaImage::from_pixel(1, 1, TRANSPARENT);
    }

    let cell_w = frames.iter().map(|f| f.width()).max().unwrap_or(1);
    let cell_h = frames.iter().map(|f| f.height()).max().unwrap_or(1);
    let (cols, rows) = sheet_grid(frames.len() as u32, columns);

    let mut sheet = RgbaImage::from_pixel(cols * cell_w, rows * cell_h, TRANSPARENT);
    for (i, frame) in frames.iter().enumerate() {
        let (col, row) = (i as u32 % cols, i as u32 / cols);
        imageops::replace(&mut sheet, frame, (col * cell_w) as i64, (row * cell_h) as i64);
    }
    sheet
}
