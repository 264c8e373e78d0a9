//! Run configuration.
//!
//! Every option has a default, so an empty JSON object (`{}`) is a valid configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Fps, Geometry};
use crate::foundation::error::{ReelError, ReelResult};

/// Default caption wrap width in characters.
pub const DEFAULT_WRAP_WIDTH: usize = 35;
/// Default background music gain relative to narration (about -10.5 dB).
pub const DEFAULT_BACKGROUND_GAIN: f32 = 0.3;
/// Default mixed-audio sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Full configuration for one composition run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReelConfig {
    /// Output frame geometry.
    pub target: Geometry,
    /// Frame rate of the silent video render.
    pub fps: Fps,
    /// Sample rate of the mixed audio track.
    pub sample_rate: u32,
    /// Channel count of the mixed audio track.
    pub channels: u16,
    /// Background music gain applied while mixing under narration.
    pub background_gain: f32,
    /// Caption layout and styling.
    pub captions: CaptionStyle,
    /// Codec settings for the final container.
    pub encode: EncodeSettings,
    /// External tool locations used by the `ffmpeg` backend.
    pub tools: ToolPaths,
    /// Directory for intermediate renders. Derived from the output path when unset.
    pub work_dir: Option<PathBuf>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            target: Geometry::VERTICAL_1080X1920,
            fps: Fps::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            background_gain: DEFAULT_BACKGROUND_GAIN,
            captions: CaptionStyle::default(),
            encode: EncodeSettings::default(),
            tools: ToolPaths::default(),
            work_dir: None,
        }
    }
}

/// Caption wrapping, font and raster style.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionStyle {
    /// Maximum characters per caption line.
    pub wrap_width: usize,
    /// Font file. When unset a bold sans-serif system font is used.
    pub font_path: Option<PathBuf>,
    /// Glyph size in pixels.
    pub font_size_px: f32,
    /// Height of the transparent caption band.
    pub band_height: u32,
    /// Glyph fill color (straight RGBA8).
    pub fill_rgba: [u8; 4],
    /// Glyph outline color (straight RGBA8).
    pub stroke_rgba: [u8; 4],
    /// Outline thickness outside the glyph edge, in pixels.
    pub stroke_width_px: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
            font_path: None,
            font_size_px: 70.0,
            band_height: 200,
            fill_rgba: [255, 255, 255, 255],
            stroke_rgba: [0, 0, 0, 255],
            stroke_width_px: 2.0,
        }
    }
}

/// Codec selection for the final mux.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeSettings {
    /// Video codec passed to `-c:v`.
    pub video_codec: String,
    /// Pixel format passed to `-pix_fmt`.
    pub pixel_format: String,
    /// Audio codec passed to `-c:a`.
    pub audio_codec: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

/// Locations of the media tools. Bare names are resolved through `PATH`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl ReelConfig {
    /// Load a JSON configuration file. Missing keys take their defaults.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parse a JSON configuration string.
    pub fn from_json_str(text: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| ReelError::validation(format!("invalid config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check option ranges the pipeline relies on.
    pub fn validate(&self) -> ReelResult<()> {
        if self.target.is_empty() {
            return Err(ReelError::validation("target width/height must be non-zero"));
        }
        if !self.target.width.is_multiple_of(2) || !self.target.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "target width/height must be even (required for yuv420p output)",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.sample_rate == 0 {
            return Err(ReelError::validation("sample_rate must be non-zero"));
        }
        if self.channels == 0 {
            return Err(ReelError::validation("channels must be non-zero"));
        }
        if !self.background_gain.is_finite() || self.background_gain < 0.0 {
            return Err(ReelError::validation(
                "background_gain must be finite and >= 0",
            ));
        }

        let c = &self.captions;
        if c.wrap_width == 0 {
            return Err(ReelError::validation("captions.wrap_width must be > 0"));
        }
        if !c.font_size_px.is_finite() || c.font_size_px <= 0.0 {
            return Err(ReelError::validation(
                "captions.font_size_px must be finite and > 0",
            ));
        }
        if !c.stroke_width_px.is_finite() || c.stroke_width_px < 0.0 {
            return Err(ReelError::validation(
                "captions.stroke_width_px must be finite and >= 0",
            ));
        }
        if c.band_height == 0 || c.band_height > self.target.height {
            return Err(ReelError::validation(format!(
                "captions.band_height must be in 1..={}",
                self.target.height
            )));
        }

        for (name, value) in [
            ("encode.video_codec", &self.encode.video_codec),
            ("encode.pixel_format", &self.encode.pixel_format),
            ("encode.audio_codec", &self.encode.audio_codec),
        ] {
            if value.trim().is_empty() {
                return Err(ReelError::validation(format!("{name} must be non-empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
