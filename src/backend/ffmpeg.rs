use std::path::Path;

use crate::backend::{FrameSource, MediaBackend, MuxJob};
use crate::config::{EncodeSettings, ReelConfig, ToolPaths};
use crate::encode::ffmpeg::{
    FfmpegSink, FfmpegSinkOpts, encode_audio_args, ensure_parent_dir, is_tool_available,
    mux_args, run_ffmpeg,
};
use crate::encode::sink::FrameSink;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::{AudioPcm, VideoSourceInfo};
use crate::media::decode::{FfmpegFrameSource, decode_audio_f32};
use crate::media::probe::probe_video;

/// [`MediaBackend`] that shells out to `ffmpeg` and `ffprobe`.
#[derive(Clone, Debug, Default)]
pub struct FfmpegBackend {
    tools: ToolPaths,
    encode: EncodeSettings,
}

impl FfmpegBackend {
    /// Backend using the given tool locations and codecs.
    pub fn new(tools: ToolPaths, encode: EncodeSettings) -> Self {
        Self { tools, encode }
    }

    /// Backend configured from a run configuration.
    pub fn from_config(config: &ReelConfig) -> Self {
        Self::new(config.tools.clone(), config.encode.clone())
    }

    /// Return `true` when both `ffmpeg` and `ffprobe` can be run.
    pub fn is_available(&self) -> bool {
        is_tool_available(&self.tools.ffmpeg) && is_tool_available(&self.tools.ffprobe)
    }
}

impl MediaBackend for FfmpegBackend {
    fn probe_video(&self, path: &Path) -> ReelResult<VideoSourceInfo> {
        probe_video(&self.tools.ffprobe, path)
    }

    fn decode_audio(&self, path: &Path, sample_rate: u32, channels: u16) -> ReelResult<AudioPcm> {
        decode_audio_f32(&self.tools.ffmpeg, path, sample_rate, channels)
    }

    fn open_video(
        &self,
        source: &VideoSourceInfo,
        start_sec: f64,
        fps: Fps,
    ) -> ReelResult<Box<dyn FrameSource>> {
        let source = FfmpegFrameSource::open(&self.tools.ffmpeg, source, start_sec, fps)?;
        Ok(Box::new(source))
    }

    fn video_sink(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(
            &self.tools.ffmpeg,
            out_path,
            &self.encode,
        ))))
    }

    fn encode_audio(
        &self,
        pcm_path: &Path,
        sample_rate: u32,
        channels: u16,
        out_path: &Path,
    ) -> ReelResult<()> {
        ensure_parent_dir(out_path)?;
        let args = encode_audio_args(
            pcm_path,
            sample_rate,
            channels,
            &self.encode.audio_codec,
            out_path,
        );
        run_ffmpeg(&self.tools.ffmpeg, &args, "audio encode")
    }

    fn mux(&self, job: &MuxJob) -> ReelResult<()> {
        let args = mux_args(&job.video_path, &job.audio_path, &job.out_path);
        run_ffmpeg(&self.tools.ffmpeg, &args, "mux").map_err(|e| match e {
            ReelError::Render(msg) => ReelError::mux(msg),
            other => other,
        })
    }
}
