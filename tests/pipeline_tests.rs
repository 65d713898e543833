//! End-to-end tests: image bytes in, sprite and animated frames out.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use pixelpet::anim::{AnimationDriver, FrameCollector, Mode};
use pixelpet::cutout::{CutoutError, Passthrough};
use pixelpet::synth::{
    boost_saturation, kmeans_palette, locate_features, median_filter, quantize_palette, synthesize,
    synthesize_with_cutout, BoundingBox, Rgb, SynthesisError, SynthesisOptions, OPACITY_THRESHOLD,
};
use pixelpet::rng::Rng;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("png encoding should succeed");
    bytes
}

/// 64x48 photo-like input: a two-tone round subject on a transparent field.
fn subject_image() -> RgbaImage {
    RgbaImage::from_fn(64, 48, |x, y| {
        let (dx, dy) = (x as i32 - 32, y as i32 - 26);
        if dx * dx + dy * dy > 20 * 20 {
            Rgba([0, 0, 0, 0])
        } else if dy > 8 {
            Rgba([240, 200, 160, 255])
        } else {
            Rgba([150, 90, 40, 255])
        }
    })
}

fn options(size: u32, palette_size: usize) -> SynthesisOptions {
    SynthesisOptions { size, palette_size, seed: Some(11) }
}

#[test]
fn test_solid_square_single_color_palette() {
    let source = RgbaImage::from_pixel(16, 16, Rgba([200, 40, 40, 255]));
    let art = synthesize(&png_bytes(&source), &options(16, 1)).expect("synthesis succeeds");

    let expected = boost_saturation(Rgb::new(200, 40, 40));
    assert_eq!(art.palette, vec![expected]);
    assert_ne!(expected, Rgb::new(200, 40, 40));
    assert!(art.image.pixels().all(|p| *p == expected.with_alpha(255)));
    assert_eq!(art.size, 16);
    assert_eq!(art.palette_size, 1);
    assert!(!art.fallback_silhouette);
}

#[test]
fn test_synthesized_sprite_shape() {
    let art = synthesize(&png_bytes(&subject_image()), &options(16, 4)).unwrap();
    assert_eq!(art.image.dimensions(), (16, 16));
    assert!(art.palette.len() <= 4);

    // Every opaque pixel is a palette color
    for p in art.image.pixels().filter(|p| p[3] > OPACITY_THRESHOLD) {
        assert!(art.palette.contains(&Rgb::from_rgba(*p)), "{:?} not in palette", p);
    }

    // Eyes come from the silhouette and sit inside its box
    let bounds = art.eyes.bounds;
    for eye in [art.eyes.left, art.eyes.right] {
        assert!(eye.pupil.x >= bounds.min_x && eye.pupil.x <= bounds.max_x);
        assert!(eye.pupil.y >= bounds.min_y && eye.pupil.y <= bounds.max_y);
        assert_eq!((eye.pupil.x - eye.highlight.x).abs(), 1);
    }
    assert!(art.eyes.left.pupil.x < art.eyes.right.pupil.x);
}

#[test]
fn test_transparent_input_uses_fallback_box() {
    let source = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
    let art = synthesize(&png_bytes(&source), &options(16, 16)).unwrap();
    assert!(art.fallback_silhouette);
    assert_eq!(art.eyes.bounds, BoundingBox::new(4, 4, 12, 12));
    assert!(art.palette.is_empty());

    let scan = locate_features(&source);
    assert!(scan.silhouette.is_fallback());
}

#[test]
fn test_decode_failure_reports_error() {
    let result = synthesize(b"\x89PNG but not really", &SynthesisOptions::default());
    assert!(matches!(result, Err(SynthesisError::ImageDecode(_))));
}

#[test]
fn test_cutout_failure_reports_error() {
    let failing = |_: &[u8]| -> Result<Vec<u8>, CutoutError> {
        Err(CutoutError::Failed("quota exceeded".to_string()))
    };
    let result = synthesize_with_cutout(&png_bytes(&subject_image()), &failing, &options(16, 4));
    match result {
        Err(SynthesisError::Cutout(e)) => assert_eq!(e.to_string(), "quota exceeded"),
        other => panic!("expected cutout error, got {:?}", other.map(|a| a.size)),
    }
}

#[test]
fn test_noise_filter_keeps_background_pixels() {
    let mut img = subject_image();
    img.put_pixel(0, 0, Rgba([9, 8, 7, 20]));
    img.put_pixel(1, 0, Rgba([1, 2, 3, 5]));
    let filtered = median_filter(&img);

    assert_eq!(filtered.dimensions(), img.dimensions());
    for (x, y, p) in img.enumerate_pixels() {
        if p[3] <= OPACITY_THRESHOLD {
            assert_eq!(filtered.get_pixel(x, y), p);
        }
    }
}

#[test]
fn test_palette_centers_are_their_clusters_means() {
    let mut samples = Vec::new();
    for i in 0..6u8 {
        samples.push(Rgb::new(250 - i * 3, 10 + i, 10));
        samples.push(Rgb::new(10, 250 - i * 3, 10 + i));
        samples.push(Rgb::new(10 + i, 10, 250 - i * 3));
    }
    let centers = kmeans_palette(&samples, 3, &mut Rng::new(5));
    assert_eq!(centers.len(), 3);
    assert_eq!(quantize_palette(&samples, 3, &mut Rng::new(5)).len(), 3);

    let nearest = |c: Rgb| (0..centers.len()).min_by_key(|&i| centers[i].distance_sq(c)).unwrap();
    for (i, center) in centers.iter().enumerate() {
        let members: Vec<Rgb> = samples.iter().copied().filter(|&s| nearest(s) == i).collect();
        if members.is_empty() {
            continue;
        }
        let n = members.len() as f64;
        let mean = |f: fn(&Rgb) -> u8| (members.iter().map(|m| f(m) as f64).sum::<f64>() / n).round() as u8;
        let mean = Rgb::new(mean(|c| c.r), mean(|c| c.g), mean(|c| c.b));
        for (j, other) in centers.iter().enumerate() {
            if j != i {
                assert!(
                    center.distance_sq(mean) <= other.distance_sq(mean),
                    "cluster {} mean {:?} is closer to center {}",
                    i,
                    mean,
                    j
                );
            }
        }
    }
}

#[test]
fn test_sad_tear_period() {
    let art = synthesize(&png_bytes(&subject_image()), &options(16, 4)).unwrap();
    let mut driver = AnimationDriver::new(16, 16, 42);
    driver.install_art(&art);
    driver.select_mode(Mode::Sad);

    driver.tick(0.0);
    driver.tick(1600.0);
    assert_eq!(driver.state().tear_phase, 0.0);
}

#[test]
fn test_wink_at_start_has_two_open_eyes() {
    let sprite = RgbaImage::from_fn(16, 16, |x, y| {
        if (1..15).contains(&x) && (2..16).contains(&y) {
            Rgba([90, 200, 120, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut driver = AnimationDriver::new(16, 16, 42);
    driver.install(sprite, None);
    driver.select_mode(Mode::Wink);

    let frame = driver.tick(0.0).expect("driver runs after install").clone();
    assert!(!driver.state().wink.active);

    // Bounds {1,2,14,15}: columns 1+3+1 = 5 and 1+10-1 = 10, row round(2+5.2) = 7
    for x in [5, 10] {
        assert_eq!(*frame.get_pixel(x, 7), BLACK, "top of eye at column {}", x);
        assert_eq!(*frame.get_pixel(x, 8), BLACK, "bottom of eye at column {}", x);
    }
}

#[test]
fn test_every_mode_animates_without_touching_the_sprite() {
    let art = synthesize(&png_bytes(&subject_image()), &options(16, 6)).unwrap();
    let mut driver = AnimationDriver::new(16, 16, 42);
    driver.install_art(&art);

    for mode in Mode::ALL {
        driver.select_mode(mode);
        let mut frames = FrameCollector::new();
        assert_eq!(driver.run_for(20, 30, &mut frames), 20);
        assert!(frames.frames().iter().all(|f| f.dimensions() == (16, 16)));
        assert!(frames.frames().iter().any(|f| f.pixels().any(|p| p[3] > 0)), "{} drew nothing", mode);
    }
    assert_eq!(driver.scene().compositor.base(), Some(&art.image));
}

#[test]
fn test_fixed_seed_replays_identical_frames() {
    let art = synthesize(&png_bytes(&subject_image()), &options(16, 4)).unwrap();
    let render = || {
        let mut driver = AnimationDriver::new(16, 16, 99);
        driver.install_art(&art);
        driver.select_mode(Mode::Sad);
        let mut frames = FrameCollector::new();
        driver.run_for(15, 30, &mut frames);
        frames.into_frames()
    };
    assert_eq!(render(), render());
}

#[test]
fn test_passthrough_pipeline_matches_direct_synthesis() {
    let bytes = png_bytes(&subject_image());
    let direct = synthesize(&bytes, &options(16, 4)).unwrap();
    let via_cutout = synthesize_with_cutout(&bytes, &Passthrough, &options(16, 4)).unwrap();
    assert_eq!(direct.image, via_cutout.image);
    assert_eq!(direct.palette, via_cutout.palette);
}
