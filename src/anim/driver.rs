//! The render loop: one expression render per display tick.

use image::RgbaImage;

use super::expression::{render, AnimationState, Tick};
use super::scene::Scene;
use super::Mode;
use crate::rng::Rng;
use crate::synth::{EyePair, PendingSprite, PixelArt};

/// Receives each composed frame.
pub trait FrameSink {
    fn present(&mut self, frame: &RgbaImage);
}

impl<F> FrameSink for F
where
    F: FnMut(&RgbaImage),
{
    fn present(&mut self, frame: &RgbaImage) {
        self(frame)
    }
}

/// Keeps a copy of every presented frame, for export.
#[derive(Debug, Clone, Default)]
pub struct FrameCollector {
    frames: Vec<RgbaImage>,
}

impl FrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<RgbaImage> {
        self.frames
    }
}

impl FrameSink for FrameCollector {
    fn present(&mut self, frame: &RgbaImage) {
        self.frames.push(frame.clone());
    }
}

/// Owns the installed sprite, the timers and the clock.
///
/// Ticks are driven by the caller with an absolute timestamp in
/// milliseconds. Each tick finishes composing before it returns, and the
/// frame it lends out must be released before the next tick.
#[derive(Debug)]
pub struct AnimationDriver {
    width: u32,
    height: u32,
    scene: Scene,
    state: AnimationState,
    rng: Rng,
    running: bool,
    /// Set when the loop starts; the next tick re-anchors the clock.
    anchor_next_tick: bool,
    last_timestamp: f64,
    pending: Option<PendingSprite>,
}

impl AnimationDriver {
    /// A stopped driver with no sprite, in calm mode.
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        let mut rng = Rng::new(seed);
        let state = AnimationState::new(Mode::default(), 0.0, &mut rng);
        Self {
            width,
            height,
            scene: Scene::empty(width, height),
            state,
            rng,
            running: false,
            anchor_next_tick: false,
            last_timestamp: 0.0,
            pending: None,
        }
    }

    /// Swap in a new sprite and restart every timer.
    ///
    /// Eyes are located from the silhouette when not given. The loop is
    /// started if it was stopped.
    pub fn install(&mut self, pixels: RgbaImage, eyes: Option<EyePair>) {
        let (width, height) = pixels.dimensions();
        self.width = width;
        self.height = height;
        self.scene = Scene::with_sprite(pixels, eyes);
        self.state = self.state.reset(self.last_timestamp, &mut self.rng);
        tracing::info!(width, height, edges = self.scene.edges.len(), "sprite installed");
        self.ensure_running();
    }

    /// Install the output of a synthesis run.
    pub fn install_art(&mut self, art: &PixelArt) {
        self.install(art.image.clone(), Some(art.eyes));
    }

    /// Drop the sprite; following ticks render cleared frames.
    pub fn clear_sprite(&mut self) {
        self.scene = Scene::empty(self.width, self.height);
        self.state = self.state.reset(self.last_timestamp, &mut self.rng);
    }

    /// Install a background synthesis result as soon as it completes.
    ///
    /// A job queued later replaces one still running.
    pub fn install_when_ready(&mut self, pending: PendingSprite) {
        self.pending = Some(pending);
        self.ensure_running();
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Switch expression. Selecting the current mode again changes nothing.
    pub fn select_mode(&mut self, mode: Mode) {
        if self.state.mode == mode {
            return;
        }
        tracing::info!(from = %self.state.mode, to = %mode, "mode changed");
        self.state.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Start the loop if it is stopped.
    ///
    /// The first tick after a start renders with a zero delta, so time spent
    /// stopped never advances the timers.
    pub fn ensure_running(&mut self) {
        if !self.running {
            self.running = true;
            self.anchor_next_tick = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_timestamp(&self) -> f64 {
        self.last_timestamp
    }

    /// The most recently composed frame.
    pub fn frame(&self) -> &RgbaImage {
        self.scene.compositor.frame()
    }

    fn poll_pending(&mut self) {
        let Some(result) = self.pending.as_ref().and_then(PendingSprite::try_take) else {
            return;
        };
        self.pending = None;
        match result {
            Ok(art) => self.install_art(&art),
            Err(e) => tracing::warn!(error = %e, "background synthesis failed, keeping current sprite"),
        }
    }

    /// Advance the clock to `timestamp` and compose one frame.
    ///
    /// Returns `None` while stopped. Timestamps that run backwards count as a
    /// zero-length tick.
    pub fn tick(&mut self, timestamp: f64) -> Option<&RgbaImage> {
        if !self.running {
            return None;
        }
        if self.anchor_next_tick {
            self.anchor_next_tick = false;
            self.state = self.state.shifted(timestamp - self.last_timestamp);
            self.last_timestamp = timestamp;
        }
        let delta = (timestamp - self.last_timestamp).max(0.0);
        self.last_timestamp = timestamp;
        self.poll_pending();

        let tick = Tick::new(timestamp, delta);
        self.state = render(&mut self.scene, self.state, tick, &mut self.rng);
        Some(self.scene.compositor.frame())
    }

    /// Tick `frames` times at `fps`, continuing from the current clock, and
    /// present each frame. Returns how many frames were presented.
    pub fn run_for<S: FrameSink + ?Sized>(&mut self, frames: usize, fps: u32, sink: &mut S) -> usize {
        let interval = 1000.0 / fps.max(1) as f64;
        let start = self.last_timestamp;
        let mut presented = 0;
        for i in 1..=frames {
            if let Some(frame) = self.tick(start + i as f64 * interval) {
                sink.present(frame);
                presented += 1;
            }
        }
        tracing::debug!(presented, fps, "animation run finished");
        presented
    }
}
