//! Media capability injected into the composer.
//!
//! Everything that touches a codec goes through [`MediaBackend`]; reformatting, trimming, looping
//! and overlay compositing stay in pure Rust.

use std::path::{Path, PathBuf};

use crate::encode::sink::FrameSink;
use crate::foundation::core::{Fps, FrameRGBA, Geometry};
use crate::foundation::error::ReelResult;
use crate::media::clip::{AudioPcm, VideoSourceInfo};

/// `ffmpeg`/`ffprobe` process backend.
pub mod ffmpeg;

/// Sequential decoder of opaque RGBA8 frames at a fixed output rate.
pub trait FrameSource {
    /// Size of every frame this source yields.
    fn geometry(&self) -> Geometry;

    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> ReelResult<Option<FrameRGBA>>;
}

/// Inputs of the final container mux.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxJob {
    /// Silent rendered video.
    pub video_path: PathBuf,
    /// Encoded mixed audio.
    pub audio_path: PathBuf,
    /// Container to write. Its extension selects the container format.
    pub out_path: PathBuf,
}

/// Probe, decode, encode and mux operations required by the pipeline.
pub trait MediaBackend {
    /// Read metadata for a source video.
    fn probe_video(&self, path: &Path) -> ReelResult<VideoSourceInfo>;

    /// Decode the audio of `path` to interleaved `f32`, resampled to `sample_rate`/`channels`.
    fn decode_audio(&self, path: &Path, sample_rate: u32, channels: u16) -> ReelResult<AudioPcm>;

    /// Open a frame stream on `source` that starts at `start_sec` and yields frames at `fps`.
    fn open_video(
        &self,
        source: &VideoSourceInfo,
        start_sec: f64,
        fps: Fps,
    ) -> ReelResult<Box<dyn FrameSource>>;

    /// Sink that encodes frames into a silent video file at `out_path`.
    fn video_sink(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>>;

    /// Encode raw interleaved `f32le` PCM at `pcm_path` into `out_path`.
    fn encode_audio(
        &self,
        pcm_path: &Path,
        sample_rate: u32,
        channels: u16,
        out_path: &Path,
    ) -> ReelResult<()>;

    /// Combine the rendered video and audio into the final container.
    fn mux(&self, job: &MuxJob) -> ReelResult<()>;
}
