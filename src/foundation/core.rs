use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::Affine;

/// Tolerance used when converting seconds to whole frame/sample counts.
///
/// Durations such as `9.0 * 24.0` must land on `216` even after float drift.
pub const TIME_EPSILON: f64 = 1e-6;

/// Absolute 0-based frame index in output timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)` in timeline space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> ReelResult<Self> {
        if start.0 > end.0 {
            return Err(ReelError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Number of frames whose start time falls inside `[0, secs)`.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        count_at_rate(secs, self.as_f64())
    }

    /// Render-argument form accepted by `ffmpeg` (`num/den`).
    pub fn ffmpeg_arg(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 24, den: 1 }
    }
}

/// Number of sample points at `rate` per second whose timestamp falls inside `[0, secs)`.
///
/// Every boundary computation in the crate goes through this function so that adjacent windows
/// computed from the same rate tile an index range with no gaps or overlaps.
pub fn count_at_rate(secs: f64, rate: f64) -> u64 {
    if !secs.is_finite() || !rate.is_finite() || secs <= 0.0 || rate <= 0.0 {
        return 0;
    }
    (secs * rate - TIME_EPSILON).ceil().max(0.0) as u64
}

/// Frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Geometry {
    /// The fixed short-form vertical target (9:16, 1080x1920).
    pub const VERTICAL_1080X1920: Geometry = Geometry {
        width: 1080,
        height: 1920,
    };

    /// Create a geometry value.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::VERTICAL_1080X1920
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A frame as RGBA8 pixels.
///
/// Frames carry premultiplied alpha once they enter compositing; decoded video is opaque, so the
/// distinction only matters for caption overlays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Solid opaque frame.
    pub fn solid(geometry: Geometry, rgba: [u8; 4]) -> Self {
        let mut data = vec![0u8; geometry.rgba8_len()];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Self {
            width: geometry.width,
            height: geometry.height,
            data,
            premultiplied: true,
        }
    }

    /// Frame dimensions.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }

    /// Check that `data` matches `width * height * 4`.
    pub fn validate(&self) -> ReelResult<()> {
        if self.data.len() != self.geometry().rgba8_len() {
            return Err(ReelError::render(format!(
                "frame buffer holds {} bytes, expected {} for {}",
                self.data.len(),
                self.geometry().rgba8_len(),
                self.geometry()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
