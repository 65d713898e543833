//! Procedural sprite animation.
//!
//! Nothing here is pre-authored: each frame is derived from the static base
//! sprite plus a handful of time-dependent transforms.
//!
//! # Architecture
//!
//! 1. [`FrameCompositor`] owns the base sprite and the live frame buffer
//! 2. [`expression`] has one pure renderer per [`Mode`]
//! 3. [`AnimationDriver`] owns the installed [`Scene`], the timers and the
//!    clock, and runs one render per tick
//!
//! # Example
//!
//! ```ignore
//! use pixelpet::anim::{AnimationDriver, Mode};
//!
//! let mut driver = AnimationDriver::new(16, 16, 42);
//! driver.install(sprite, None);
//! driver.select_mode(Mode::Sad);
//! let frame = driver.tick(16.0);
//! ```

pub mod compositor;
pub mod driver;
pub mod expression;
pub mod scene;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use compositor::{EdgePixel, FrameCompositor, StretchSpan};
pub use driver::{AnimationDriver, FrameCollector, FrameSink};
pub use expression::{render, AnimationState, Tick, WinkSchedule};
pub use scene::Scene;

/// Emotional expression currently being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Static body, eyes glance side to side
    #[default]
    Calm,
    /// Bottom-anchored vertical bounce
    Excited,
    /// One-pixel horizontal sway
    Happy,
    /// Trembling outline and falling tears
    Sad,
    /// Right eye blinks shut every second or two
    Wink,
    /// Eyelids droop closed and snap back open
    Sleepy,
}

impl Mode {
    pub const ALL: [Mode; 6] =
        [Mode::Calm, Mode::Excited, Mode::Happy, Mode::Sad, Mode::Wink, Mode::Sleepy];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Calm => "calm",
            Mode::Excited => "excited",
            Mode::Happy => "happy",
            Mode::Sad => "sad",
            Mode::Wink => "wink",
            Mode::Sleepy => "sleepy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error for an unrecognized mode name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("unknown mode '{0}' (expected one of: calm, excited, happy, sad, wink, sleepy)")]
    Unknown(String),
}

impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|m| m.name() == needle)
            .ok_or_else(|| ModeError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>(), Ok(mode));
        }
    }

    #[test]
    fn test_mode_parse_is_case_insensitive() {
        assert_eq!("Sleepy".parse::<Mode>(), Ok(Mode::Sleepy));
        assert_eq!(" WINK ".parse::<Mode>(), Ok(Mode::Wink));
    }

    #[test]
    fn test_unknown_mode() {
        let err = "angry".parse::<Mode>().unwrap_err();
        assert_eq!(err, ModeError::Unknown("angry".to_string()));
        assert!(err.to_string().contains("calm"));
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&Mode::Excited).unwrap(), "\"excited\"");
        assert_eq!(serde_json::from_str::<Mode>("\"sad\"").unwrap(), Mode::Sad);
    }
}
