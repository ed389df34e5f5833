use crate::foundation::error::{RibError, RibResult};

pub use glam::{Mat4, Quat, Vec3};

/// Host timeline frame number. Host frames may be zero or negative.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Frame(pub i64);

impl Frame {
    /// Frame number as a timeline time in frame units.
    pub fn as_time(self) -> f64 {
        self.0 as f64
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive frame range `[start, end]`, matching host frame-range semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// First frame.
    pub start: Frame,
    /// Last frame (inclusive).
    pub end: Frame,
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: Frame, end: Frame) -> RibResult<Self> {
        if start.0 > end.0 {
            return Err(RibError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Single-frame range.
    pub fn single(frame: Frame) -> Self {
        Self {
            start: frame,
            end: frame,
        }
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        (self.end.0 - self.start.0 + 1).max(0) as u64
    }

    /// Return `true` when `f` is inside `[start, end]`.
    pub fn contains(self, f: Frame) -> bool {
        self.start.0 <= f.0 && f.0 <= self.end.0
    }

    /// Iterate frames in ascending order.
    pub fn iter(self) -> impl Iterator<Item = Frame> {
        (self.start.0..=self.end.0).map(Frame)
    }
}

/// Shutter interval and efficiency, in frame-relative units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shutter {
    /// Shutter open offset from the frame time.
    pub open: f64,
    /// Shutter close offset from the frame time.
    pub close: f64,
    /// Opening efficiency in `[0, 1]`; 1 opens instantly.
    pub efficiency_open: f64,
    /// Closing efficiency in `[0, 1]`; 1 closes instantly.
    pub efficiency_close: f64,
}

impl Default for Shutter {
    fn default() -> Self {
        Self {
            open: 0.0,
            close: 1.0,
            efficiency_open: 1.0,
            efficiency_close: 1.0,
        }
    }
}

impl Shutter {
    /// Validate interval ordering and efficiency bounds.
    pub fn validate(&self) -> RibResult<()> {
        if !self.open.is_finite() || !self.close.is_finite() {
            return Err(RibError::validation("shutter open/close must be finite"));
        }
        if self.close < self.open {
            return Err(RibError::validation("shutter close must be >= shutter open"));
        }
        for eff in [self.efficiency_open, self.efficiency_close] {
            if !(0.0..=1.0).contains(&eff) {
                return Err(RibError::validation(
                    "shutter efficiency must be within [0, 1]",
                ));
            }
        }
        Ok(())
    }
}
