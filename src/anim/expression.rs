//! Per-mode frame renderers.
//!
//! Every renderer has the same shape: take the scene, the timers and the
//! current tick, compose one frame into the scene's compositor and hand back
//! the advanced timers. Nothing is cached between calls except what travels
//! in [`AnimationState`].

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::compositor::{FrameCompositor, StretchSpan};
use super::scene::Scene;
use super::Mode;
use crate::rng::Rng;
use crate::synth::{EyePoint, Point};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Period of the calm side-to-side glance.
pub const GAZE_PERIOD_MS: f64 = 3200.0;
/// Period of the excited bounce.
pub const BOUNCE_PERIOD_MS: f64 = 420.0;
/// Peak relative stretch of the excited bounce.
pub const BOUNCE_AMPLITUDE: f64 = 0.14;
/// Period of the happy sway.
pub const SWAY_PERIOD_MS: f64 = 550.0;
/// Time for one tear to fall and reset.
pub const TEAR_PERIOD_MS: f64 = 1600.0;
/// Share of the tear cycle spent falling.
const TEAR_FALL_SHARE: f64 = 0.9;
/// How long the right eye stays shut.
pub const WINK_DURATION_MS: f64 = 140.0;
/// Range of the pause between winks.
pub const WINK_INTERVAL_MS: (f64, f64) = (1000.0, 2000.0);
/// Range of one sleepy blink cycle.
pub const SLEEP_CYCLE_MS: (f64, f64) = (3000.0, 5000.0);

/// Signature shared by every mode renderer.
pub type Renderer = fn(&mut Scene, AnimationState, Tick, &mut Rng) -> AnimationState;

/// Timing information for one render call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tick {
    /// Absolute clock in milliseconds
    pub time_ms: f64,
    /// Milliseconds since the previous tick
    pub delta_ms: f64,
}

impl Tick {
    pub fn new(time_ms: f64, delta_ms: f64) -> Self {
        Self { time_ms, delta_ms }
    }
}

/// When the right eye is shut and when it shuts next.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WinkSchedule {
    pub active: bool,
    pub next: f64,
    pub ends_at: f64,
}

/// Timers carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub mode: Mode,
    /// Position in the tear cycle, always in [0, 1)
    pub tear_phase: f64,
    pub wink: WinkSchedule,
    pub sleep_elapsed: f64,
    pub sleep_duration: f64,
}

impl AnimationState {
    /// Fresh timers, with the first wink scheduled relative to `now`.
    pub fn new(mode: Mode, now: f64, rng: &mut Rng) -> Self {
        Self {
            mode,
            tear_phase: 0.0,
            wink: WinkSchedule {
                active: false,
                next: now + rng.range(WINK_INTERVAL_MS.0, WINK_INTERVAL_MS.1),
                ends_at: 0.0,
            },
            sleep_elapsed: 0.0,
            sleep_duration: rng.range(SLEEP_CYCLE_MS.0, SLEEP_CYCLE_MS.1),
        }
    }

    /// Same mode, every timer restarted.
    pub fn reset(self, now: f64, rng: &mut Rng) -> Self {
        Self::new(self.mode, now, rng)
    }

    /// Move the wink schedule by `offset_ms`, for a clock that jumped while
    /// nothing was rendering.
    pub fn shifted(mut self, offset_ms: f64) -> Self {
        self.wink.next += offset_ms;
        if self.wink.active {
            self.wink.ends_at += offset_ms;
        }
        self
    }
}

/// Look up the renderer for a mode.
pub fn renderer_for(mode: Mode) -> Renderer {
    match mode {
        Mode::Calm => render_calm,
        Mode::Excited => render_excited,
        Mode::Happy => render_happy,
        Mode::Sad => render_sad,
        Mode::Wink => render_wink,
        Mode::Sleepy => render_sleepy,
    }
}

/// Compose one frame for `state.mode`.
///
/// With no sprite installed the frame is cleared and the timers are returned
/// unchanged.
pub fn render(scene: &mut Scene, state: AnimationState, tick: Tick, rng: &mut Rng) -> AnimationState {
    if !scene.has_sprite() {
        scene.compositor.blank_frame();
        return state;
    }
    renderer_for(state.mode)(scene, state, tick, rng)
}

/// Which of the two eye dots is drawn black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gaze {
    Left,
    Right,
}

impl Gaze {
    fn at(time_ms: f64) -> Self {
        if (time_ms / GAZE_PERIOD_MS * TAU).sin() >= 0.0 {
            Gaze::Left
        } else {
            Gaze::Right
        }
    }
}

fn paint_eye(comp: &mut FrameCompositor, eye: EyePoint, gaze: Gaze) {
    let (dark, light) = match gaze {
        Gaze::Left => (eye.pupil, eye.highlight),
        Gaze::Right => (eye.highlight, eye.pupil),
    };
    comp.set_pixel(dark.x, dark.y, BLACK);
    comp.set_pixel(light.x, light.y, WHITE);
}

/// Move an eye into the current frame's geometry.
fn place_eye(
    comp: &FrameCompositor,
    eye: EyePoint,
    offset_x: i32,
    stretch: Option<StretchSpan>,
) -> EyePoint {
    let bounds = comp.bounds();
    let map_y = |y: i32| match stretch {
        Some(span) => {
            let ratio = (y - bounds.min_y) as f64 / bounds.height() as f64;
            comp.clamp_y((span.top as f64 + ratio * (span.height - 1) as f64).round() as i32)
        }
        None => comp.clamp_y(y),
    };
    let map = |p: Point| Point::new(comp.clamp_x(p.x + offset_x), map_y(p.y));
    EyePoint { pupil: map(eye.pupil), highlight: map(eye.highlight) }
}

fn paint_facing_eyes(scene: &mut Scene, time_ms: f64, offset_x: i32, stretch: Option<StretchSpan>) {
    let Some(eyes) = scene.eyes else {
        return;
    };
    let gaze = Gaze::at(time_ms);
    for eye in [eyes.left, eyes.right] {
        let placed = place_eye(&scene.compositor, eye, offset_x, stretch);
        paint_eye(&mut scene.compositor, placed, gaze);
    }
}

/// Static body, eyes glance left and right.
pub fn render_calm(scene: &mut Scene, state: AnimationState, tick: Tick, _rng: &mut Rng) -> AnimationState {
    scene.compositor.frame_from_base();
    paint_facing_eyes(scene, tick.time_ms, 0, None);
    state
}

/// Bottom-anchored squash and stretch.
pub fn render_excited(scene: &mut Scene, state: AnimationState, tick: Tick, _rng: &mut Rng) -> AnimationState {
    let cycle = tick.time_ms.rem_euclid(BOUNCE_PERIOD_MS) / BOUNCE_PERIOD_MS;
    let scale = 1.0 + BOUNCE_AMPLITUDE * (cycle * TAU).sin();

    scene.compositor.blank_frame();
    let span = scene.compositor.vertical_stretch(scale);
    paint_facing_eyes(scene, tick.time_ms, 0, Some(span));
    state
}

/// Whole body sways by one pixel.
pub fn render_happy(scene: &mut Scene, state: AnimationState, tick: Tick, _rng: &mut Rng) -> AnimationState {
    let offset = (((tick.time_ms / SWAY_PERIOD_MS * TAU).sin() + 1.0) / 2.0).round() as i32;

    scene.compositor.blank_frame();
    scene.compositor.copy_with_offset(offset, 0);
    paint_facing_eyes(scene, tick.time_ms, offset, None);
    state
}

/// Trembling outline, fixed eyes and falling tears.
pub fn render_sad(scene: &mut Scene, mut state: AnimationState, tick: Tick, rng: &mut Rng) -> AnimationState {
    let comp = &mut scene.compositor;
    comp.frame_from_base();

    for edge in &scene.edges {
        let x = comp.clamp_x(edge.x + rng.jitter());
        let y = comp.clamp_y(edge.y + rng.jitter());
        comp.set_pixel(x, y, edge.color);
    }

    let anchors = match scene.eyes {
        Some(eyes) => [eyes.left.pupil, eyes.right.pupil]
            .map(|p| Point::new(comp.clamp_x(p.x), comp.clamp_y(p.y))),
        None => {
            let layout = EyeLayout::of(comp, false);
            [Point::new(layout.left_x, layout.row), Point::new(layout.right_x, layout.row)]
        }
    };

    for (anchor, toward_center) in anchors.into_iter().zip([1, -1]) {
        let white_x = comp.clamp_x(anchor.x + toward_center);
        comp.set_pixel(anchor.x, anchor.y, BLACK);
        comp.set_pixel(white_x, anchor.y, WHITE);
    }

    state.tear_phase = (state.tear_phase + tick.delta_ms / TEAR_PERIOD_MS) % 1.0;
    let bottom = comp.clamp_y(comp.bounds().max_y);
    for anchor in anchors {
        let start = comp.clamp_y(anchor.y + 1);
        let row = if state.tear_phase < TEAR_FALL_SHARE {
            let progress = state.tear_phase / TEAR_FALL_SHARE;
            (start as f64 + (bottom - start) as f64 * progress).round() as i32
        } else {
            start
        };
        comp.set_pixel(anchor.x, row, WHITE);
    }

    state
}

/// Advance the wink timer to `now`.
fn update_wink(mut wink: WinkSchedule, now: f64, rng: &mut Rng) -> WinkSchedule {
    if now >= wink.next {
        wink.active = true;
        wink.ends_at = now + WINK_DURATION_MS;
        wink.next = wink.ends_at + rng.range(WINK_INTERVAL_MS.0, WINK_INTERVAL_MS.1);
    }
    if wink.active && now >= wink.ends_at {
        wink.active = false;
    }
    wink
}

/// Eye columns and row for the line-drawn faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EyeLayout {
    left_x: i32,
    right_x: i32,
    row: i32,
}

impl EyeLayout {
    fn of(comp: &FrameCompositor, toward_center: bool) -> Self {
        let bounds = comp.bounds();
        let width = bounds.span_x().max(1) as f64;
        let mut left_x = comp.clamp_x(bounds.min_x + (width * 0.25).floor() as i32);
        let mut right_x = comp.clamp_x(bounds.min_x + (width * 0.75).ceil() as i32);
        if left_x == right_x {
            right_x = comp.clamp_x(left_x + 2);
        }
        if toward_center {
            left_x = comp.clamp_x(left_x + 1);
            right_x = comp.clamp_x(right_x - 1);
            if left_x >= right_x {
                left_x = (left_x - 1).max(0);
                right_x = (right_x + 1).min(comp.width() - 1);
            }
        }
        let row = (bounds.min_y as f64 + bounds.span_y() as f64 * 0.4).round() as i32;
        let row = row.clamp(0, (comp.height() - 2).max(0));
        Self { left_x, right_x, row }
    }
}

fn eye_line(comp: &mut FrameCompositor, x: i32, top: i32, length: i32) {
    for i in 0..length {
        let y = comp.clamp_y(top + i);
        comp.set_pixel(x, y, BLACK);
    }
}

/// Two-pixel eyes; the right one blinks shut now and then.
pub fn render_wink(scene: &mut Scene, mut state: AnimationState, tick: Tick, rng: &mut Rng) -> AnimationState {
    state.wink = update_wink(state.wink, tick.time_ms, rng);

    let comp = &mut scene.compositor;
    comp.frame_from_base();
    let layout = EyeLayout::of(comp, true);

    eye_line(comp, layout.left_x, layout.row, 2);
    if state.wink.active {
        comp.restore_from_base(layout.right_x, layout.row);
        let below = comp.clamp_y(layout.row + 1);
        comp.set_pixel(layout.right_x, below, BLACK);
    } else {
        eye_line(comp, layout.right_x, layout.row, 2);
    }

    state
}

/// Opacity of the upper eyelid pixel at a point in the blink cycle.
pub fn sleepy_opacity(phase: f64) -> f64 {
    if phase < 0.7 {
        1.0 - phase / 0.7
    } else if phase < 0.85 {
        0.0
    } else {
        1.0
    }
}

fn sleepy_eye(comp: &mut FrameCompositor, x: i32, row: i32, opacity: f64) {
    let bottom = comp.clamp_y(row + 1);
    comp.set_pixel(x, bottom, BLACK);

    let top = comp.clamp_y(row);
    if opacity <= 0.0 {
        comp.restore_from_base(x, top);
    } else if opacity >= 1.0 {
        comp.set_pixel(x, top, BLACK);
    } else {
        let base = comp.base_pixel(x, top);
        let fade = |c: u8| (c as f64 * (1.0 - opacity)).round() as u8;
        comp.set_pixel(x, top, Rgba([fade(base[0]), fade(base[1]), fade(base[2]), 255]));
    }
}

/// Eyelids droop shut over a few seconds, then snap open.
pub fn render_sleepy(scene: &mut Scene, mut state: AnimationState, tick: Tick, rng: &mut Rng) -> AnimationState {
    state.sleep_elapsed += tick.delta_ms;
    if state.sleep_elapsed >= state.sleep_duration {
        state.sleep_elapsed %= state.sleep_duration;
        state.sleep_duration = rng.range(SLEEP_CYCLE_MS.0, SLEEP_CYCLE_MS.1);
    }
    let opacity = sleepy_opacity(state.sleep_elapsed / state.sleep_duration);

    let comp = &mut scene.compositor;
    comp.frame_from_base();
    let layout = EyeLayout::of(comp, true);
    sleepy_eye(comp, layout.left_x, layout.row, opacity);
    sleepy_eye(comp, layout.right_x, layout.row, opacity);

    state
}
