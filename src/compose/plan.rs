use crate::captions::render::{CaptionRenderer, OverlayClip};
use crate::captions::segment::segment_captions;
use crate::config::ReelConfig;
use crate::foundation::core::{Fps, FrameIndex, FrameRange, Geometry};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::{AudioClip, TimedClip, VideoClip};
use crate::reformat::reformat_clip;
use crate::sync::sync_to_duration;

/// Everything one run renders: the video track with its overlays and the two audio layers.
///
/// Built once per run from decoded inputs; every clip already has the narration's duration.
#[derive(Clone, Debug)]
pub struct CompositionPlan {
    /// Synchronized, reformatted base video.
    pub video: VideoClip,
    /// Caption overlays in display order.
    pub overlays: Vec<OverlayClip>,
    /// Narration, unchanged.
    pub narration: AudioClip,
    /// Background music synchronized to the narration.
    pub background: AudioClip,
    /// Narration duration in seconds.
    pub duration_sec: f64,
    /// Output frame rate.
    pub fps: Fps,
    overlay_ranges: Vec<FrameRange>,
}

impl CompositionPlan {
    /// Synchronize, reformat and caption the decoded inputs.
    ///
    /// Fails with [`ReelError::EmptyInput`] when the narration has no duration.
    #[tracing::instrument(skip_all, fields(narration_sec = narration.duration_sec()))]
    pub fn build(
        video: &VideoClip,
        narration: AudioClip,
        background: &AudioClip,
        caption_text: &str,
        config: &ReelConfig,
        captions: &mut CaptionRenderer,
    ) -> ReelResult<Self> {
        let duration_sec = narration.duration_sec();
        if duration_sec <= 0.0 {
            return Err(ReelError::empty_input("narration has zero duration"));
        }

        let synced = sync_to_duration(video, duration_sec)?;
        let video = reformat_clip(&synced, config.target)?;
        let background = sync_to_duration(background, duration_sec)?;

        let segments = segment_captions(caption_text, config.captions.wrap_width, duration_sec)?;
        let overlays = captions.render_all(&segments)?;
        tracing::info!(
            duration_sec,
            captions = overlays.len(),
            video_loops = synced.timeline().spans().len(),
            "composition planned"
        );

        Ok(Self::new(
            video,
            overlays,
            narration,
            background,
            duration_sec,
            config.fps,
        ))
    }

    /// Assemble a plan from already prepared parts.
    pub fn new(
        video: VideoClip,
        overlays: Vec<OverlayClip>,
        narration: AudioClip,
        background: AudioClip,
        duration_sec: f64,
        fps: Fps,
    ) -> Self {
        let overlay_ranges = overlays.iter().map(|o| o.frame_range(fps)).collect();
        Self {
            video,
            overlays,
            narration,
            background,
            duration_sec,
            fps,
            overlay_ranges,
        }
    }

    /// Output frame size.
    pub fn geometry(&self) -> Geometry {
        self.video.geometry()
    }

    /// Number of video frames: `ceil(duration * fps)`.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_ceil(self.duration_sec)
    }

    /// Overlays visible on frame `idx`, in layering order.
    pub fn overlays_at(&self, idx: FrameIndex) -> impl Iterator<Item = &OverlayClip> {
        self.overlays
            .iter()
            .zip(&self.overlay_ranges)
            .filter(move |(_, range)| range.contains(idx))
            .map(|(o, _)| o)
    }
}
