//! PNG and JSON output, integer upscaling and output path generation

use image::imageops::FilterType;
use image::RgbaImage;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// Metadata serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    ensure_parent(path)?;
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Write any serializable value as pretty-printed JSON.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text + "\n")?;
    Ok(())
}

/// Scale image by integer factor using nearest-neighbor interpolation.
///
/// Factors of 0 and 1 return the image unchanged.
pub fn scale_image(image: RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    image::imageops::resize(&image, w * factor, h * factor, FilterType::Nearest)
}

/// Generate the path an output file is written to.
///
/// | Scenario | Output |
/// |----------|--------|
/// | No `-o` | `{input dir}/{stem}_{suffix}.{ext}` |
/// | `-o out.png` | `out.png` |
/// | `-o dir/` or an existing directory | `dir/{stem}_{suffix}.{ext}` |
pub fn generate_output_path(
    input: &Path,
    suffix: &str,
    extension: &str,
    output_arg: Option<&Path>,
) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("pet");
    let file_name = format!("{}_{}.{}", stem, suffix, extension);

    match output_arg {
        Some(output) => {
            let is_dir = output.as_os_str().to_string_lossy().ends_with('/') || output.is_dir();
            if is_dir {
                output.join(file_name)
            } else {
                output.to_path_buf()
            }
        }
        None => input.parent().unwrap_or(Path::new("")).join(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    #[test]
    fn test_save_png_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("pet.png");

        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        save_png(&img, &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, img);
    }

    #[test]
    fn test_save_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.json");

        save_json(&vec![1, 2, 3], &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let parsed: Vec<u32> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn test_scale_image() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let scaled = scale_image(img.clone(), 3);
        assert_eq!(scaled.dimensions(), (6, 3));
        assert_eq!(*scaled.get_pixel(2, 2), Rgba([255, 0, 0, 255]));
        assert_eq!(*scaled.get_pixel(3, 0), Rgba([0, 0, 255, 255]));

        assert_eq!(scale_image(img.clone(), 1), img);
        assert_eq!(scale_image(img.clone(), 0), img);
    }

    #[test]
    fn test_output_path_default() {
        let path = generate_output_path(Path::new("photos/cat.jpg"), "pixel", "png", None);
        assert_eq!(path, PathBuf::from("photos/cat_pixel.png"));

        let path = generate_output_path(Path::new("cat.jpg"), "sad", "gif", None);
        assert_eq!(path, PathBuf::from("cat_sad.gif"));
    }

    #[test]
    fn test_output_path_explicit_file() {
        let path = generate_output_path(
            Path::new("cat.jpg"),
            "pixel",
            "png",
            Some(Path::new("out/sprite.png")),
        );
        assert_eq!(path, PathBuf::from("out/sprite.png"));
    }

    #[test]
    fn test_output_path_directory() {
        let path =
            generate_output_path(Path::new("cat.jpg"), "wink_sheet", "png", Some(Path::new("out/")));
        assert_eq!(path, PathBuf::from("out/cat_wink_sheet.png"));

        let dir = tempdir().unwrap();
        let path = generate_output_path(Path::new("cat.jpg"), "calm", "gif", Some(dir.path()));
        assert_eq!(path, dir.path().join("cat_calm.gif"));
    }
}
