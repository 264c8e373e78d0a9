use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::audio::mix::{mix_narration, write_pcm_f32le};
use crate::backend::{MediaBackend, MuxJob};
use crate::captions::font::CaptionFont;
use crate::captions::render::CaptionRenderer;
use crate::compose::composite::composite_overlay;
use crate::compose::plan::CompositionPlan;
use crate::config::ReelConfig;
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::SinkConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::{AudioClip, VideoClip};
use crate::media::reader::ClipFrameReader;

/// Local inputs of one composition run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReelInputs {
    /// Stock video clip.
    pub video: PathBuf,
    /// Narration audio; its duration defines the output duration.
    pub narration: PathBuf,
    /// Background music.
    pub music: PathBuf,
    /// Narration text mirrored as captions.
    pub caption_text: String,
}

/// Intermediate files of a run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ScratchPaths {
    /// Directory holding the intermediates.
    pub dir: PathBuf,
    /// Silent rendered video.
    pub silent_video: PathBuf,
    /// Raw mixed PCM (`f32le`).
    pub mixed_pcm: PathBuf,
    /// Encoded mixed audio.
    pub mixed_audio: PathBuf,
}

impl ScratchPaths {
    /// Scratch layout inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            silent_video: dir.join("silent_video.mp4"),
            mixed_pcm: dir.join("mixed_audio.f32le"),
            mixed_audio: dir.join("mixed_audio.m4a"),
            dir,
        }
    }

    /// Scratch layout for `output`: `work_dir` when given, else `<output dir>/.<stem>.reelforge`.
    pub fn for_output(output: &Path, work_dir: Option<&Path>) -> Self {
        match work_dir {
            Some(dir) => Self::in_dir(dir),
            None => {
                let stem = output
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "reel".to_string());
                Self::in_dir(output_dir(output).join(format!(".{stem}.reelforge")))
            }
        }
    }
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ComposeReport {
    /// Final container path.
    pub output: PathBuf,
    /// Output duration in seconds (the narration duration).
    pub duration_sec: f64,
    /// Video frames rendered.
    pub frame_count: u64,
    /// Caption segments rendered.
    pub caption_count: usize,
    /// Mixed audio sample frames.
    pub audio_frames: u64,
    /// Intermediate files left in the work directory.
    pub scratch: ScratchPaths,
}

/// Runs the full pipeline against an injected [`MediaBackend`].
pub struct Composer<'a> {
    backend: &'a dyn MediaBackend,
    config: ReelConfig,
}

impl<'a> Composer<'a> {
    /// Composer using `backend` for every codec operation.
    pub fn new(backend: &'a dyn MediaBackend, config: ReelConfig) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Compose `inputs` into the container at `out`.
    ///
    /// Any file already at `out` is removed first. The final file only appears once the mux
    /// succeeded, so a failed run leaves nothing at `out`.
    #[tracing::instrument(skip(self, inputs, out), fields(out = %out.display()))]
    pub fn compose(&self, inputs: &ReelInputs, out: &Path) -> ReelResult<ComposeReport> {
        check_inputs(inputs)?;
        if out.is_dir() {
            return Err(ReelError::validation(format!(
                "output '{}' is a directory",
                out.display()
            )));
        }
        remove_stale(out)?;

        let scratch = ScratchPaths::for_output(out, self.config.work_dir.as_deref());
        std::fs::create_dir_all(&scratch.dir)
            .with_context(|| format!("create work directory '{}'", scratch.dir.display()))?;

        let plan = self.plan(inputs)?;

        tracing::info!(path = %scratch.silent_video.display(), "rendering silent video");
        let frame_count = self.render_video(&plan, &scratch.silent_video)?;

        tracing::info!(path = %scratch.mixed_audio.display(), "rendering mixed audio");
        let audio_frames = self.render_audio(&plan, &scratch.mixed_pcm, &scratch.mixed_audio)?;

        tracing::info!("muxing final output");
        self.mux_atomic(&scratch.silent_video, &scratch.mixed_audio, out)?;
        tracing::info!(frames = frame_count, "composition written");

        Ok(ComposeReport {
            output: out.to_path_buf(),
            duration_sec: plan.duration_sec,
            frame_count,
            caption_count: plan.overlays.len(),
            audio_frames,
            scratch,
        })
    }

    /// Load the caption font, decode the inputs and build the composition plan.
    pub fn plan(&self, inputs: &ReelInputs) -> ReelResult<CompositionPlan> {
        let font = CaptionFont::resolve(self.config.captions.font_path.as_deref())?;
        tracing::debug!(family = font.family(), "caption font loaded");
        let mut captions = CaptionRenderer::new(&font, &self.config.captions, self.config.target)?;

        tracing::info!(path = %inputs.video.display(), "probing video");
        let video = VideoClip::new(self.backend.probe_video(&inputs.video)?)?;

        tracing::info!(path = %inputs.narration.display(), "decoding narration");
        let narration = self.decode_audio(&inputs.narration)?;
        if narration.frame_count() == 0 {
            return Err(ReelError::empty_input(format!(
                "narration '{}' has no audio",
                inputs.narration.display()
            )));
        }

        tracing::info!(path = %inputs.music.display(), "decoding background music");
        let background = self.decode_audio(&inputs.music)?;

        CompositionPlan::build(
            &video,
            narration,
            &background,
            &inputs.caption_text,
            &self.config,
            &mut captions,
        )
    }

    /// Render the base video with its overlays into a silent file. Returns the frame count.
    pub fn render_video(&self, plan: &CompositionPlan, path: &Path) -> ReelResult<u64> {
        remove_stale(path)?;
        let mut reader = ClipFrameReader::new(self.backend, &plan.video, plan.fps);
        let frame_count = plan.frame_count();
        if frame_count == 0 || reader.frame_count() != frame_count {
            return Err(ReelError::render(format!(
                "video timeline yields {} frames, expected {frame_count}",
                reader.frame_count()
            )));
        }

        let geometry = plan.geometry();
        let mut sink = self.backend.video_sink(path)?;
        sink.begin(SinkConfig {
            width: geometry.width,
            height: geometry.height,
            fps: plan.fps,
            frame_count,
        })?;
        while let Some((idx, mut frame)) = reader.next_frame()? {
            for overlay in plan.overlays_at(idx) {
                composite_overlay(&mut frame, overlay)?;
            }
            sink.push_frame(idx, &frame)?;
        }
        sink.end()?;
        Ok(frame_count)
    }

    /// Mix narration and background, then encode the mix. Returns the mixed sample frame count.
    pub fn render_audio(
        &self,
        plan: &CompositionPlan,
        pcm_path: &Path,
        audio_path: &Path,
    ) -> ReelResult<u64> {
        remove_stale(pcm_path)?;
        remove_stale(audio_path)?;
        let mixed = mix_narration(
            &plan.narration,
            &plan.background,
            self.config.background_gain,
        )?;
        write_pcm_f32le(&mixed, pcm_path)?;
        self.backend
            .encode_audio(pcm_path, mixed.sample_rate, mixed.channels, audio_path)?;
        Ok(mixed.frames())
    }

    fn decode_audio(&self, path: &Path) -> ReelResult<AudioClip> {
        let pcm = self
            .backend
            .decode_audio(path, self.config.sample_rate, self.config.channels)?;
        AudioClip::new(pcm)
    }

    /// Mux into a staged file beside `out`, then rename it into place.
    fn mux_atomic(&self, video: &Path, audio: &Path, out: &Path) -> ReelResult<()> {
        ensure_parent_dir(out)?;
        let stem = out
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Keep the extension so the muxer still picks the container from the name.
        let suffix = out
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let staged = tempfile::Builder::new()
            .prefix(&format!(".{stem}."))
            .suffix(&suffix)
            .tempfile_in(output_dir(out))
            .map_err(|e| ReelError::mux(format!("failed to stage output: {e}")))?
            .into_temp_path();

        self.backend.mux(&MuxJob {
            video_path: video.to_path_buf(),
            audio_path: audio.to_path_buf(),
            out_path: staged.to_path_buf(),
        })?;
        staged.persist(out).map_err(|e| {
            ReelError::mux(format!(
                "failed to move muxed output to '{}': {e}",
                out.display()
            ))
        })?;
        Ok(())
    }
}

fn output_dir(out: &Path) -> &Path {
    match out.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn check_inputs(inputs: &ReelInputs) -> ReelResult<()> {
    for (what, path) in [
        ("video", &inputs.video),
        ("narration", &inputs.narration),
        ("music", &inputs.music),
    ] {
        let readable = std::fs::metadata(path).is_ok_and(|m| m.is_file())
            && std::fs::File::open(path).is_ok();
        if !readable {
            return Err(ReelError::input_missing(format!(
                "{what} file '{}' does not exist or is unreadable",
                path.display()
            )));
        }
    }
    Ok(())
}

fn remove_stale(path: &Path) -> ReelResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("remove stale '{}'", path.display()))
            .into()),
    }
}
