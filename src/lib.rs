//! reelforge assembles narrated vertical short-form videos from local files.
//!
//! A run takes a stock video clip, a narration track, background music and the narration text,
//! and produces one 1080x1920 container:
//!
//! - The video is looped or trimmed to the narration duration and cropped or padded to the
//!   vertical frame
//! - The text is split into equal-duration caption lines rendered as outlined overlays
//! - The music is synchronized to the narration and mixed under it at a reduced gain
//!
//! Codec work goes through a [`MediaBackend`]; [`FfmpegBackend`] drives the `ffmpeg` and
//! `ffprobe` executables. [`Composer`] runs the whole pipeline.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Narration and background mixing.
pub mod audio;
/// Media backend abstraction and its `ffmpeg` implementation.
pub mod backend;
/// Caption segmentation and rendering.
pub mod captions;
/// Composition plan and pipeline.
pub mod compose;
/// Run configuration.
pub mod config;
/// Encoding sinks and `ffmpeg` command builders.
pub mod encode;
/// Clip model, probing and decoding.
pub mod media;
/// Crop/pad reformatting onto the vertical frame.
pub mod reformat;
/// Input discovery and output naming.
pub mod source;
/// Duration synchronization.
pub mod sync;

pub use crate::foundation::core::{
    Affine, Fps, FrameIndex, FrameRGBA, FrameRange, Geometry, count_at_rate,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::audio::mix::{MixLayer, mix_narration};
pub use crate::backend::ffmpeg::FfmpegBackend;
pub use crate::backend::{FrameSource, MediaBackend, MuxJob};
pub use crate::captions::font::CaptionFont;
pub use crate::captions::render::{CaptionRenderer, OverlayClip};
pub use crate::captions::segment::{CaptionSegment, segment_captions};
pub use crate::compose::pipeline::{ComposeReport, Composer, ReelInputs, ScratchPaths};
pub use crate::compose::plan::CompositionPlan;
pub use crate::config::{CaptionStyle, EncodeSettings, ReelConfig, ToolPaths};
pub use crate::encode::sink::{FrameSink, SinkConfig};
pub use crate::media::clip::{AudioClip, AudioPcm, ClipTimeline, TimedClip, VideoClip, VideoSourceInfo};
pub use crate::reformat::{FitMode, FramePlan};
pub use crate::sync::sync_to_duration;
