use std::path::PathBuf;
use std::sync::Arc;

use crate::foundation::core::{Geometry, TIME_EPSILON, count_at_rate};
use crate::foundation::error::{ReelError, ReelResult};
use crate::reformat::FramePlan;

/// A contiguous range of source time `[start_sec, end_sec)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceSpan {
    /// Inclusive start in source seconds.
    pub start_sec: f64,
    /// Exclusive end in source seconds.
    pub end_sec: f64,
}

impl SourceSpan {
    /// Span length in seconds.
    pub fn len_sec(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }
}

/// Output index range covered by one [`SourceSpan`], and where in the source it begins.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanWindow {
    /// Source time of the first output index in `range`.
    pub source_start_sec: f64,
    /// Source time at which this window stops reading.
    pub source_end_sec: f64,
    /// Output indices (frames or samples) served by this window.
    pub range: std::ops::Range<u64>,
}

/// Timing view over a decoded source: which source ranges play, in which order.
///
/// Trimming and looping never touch the source; they only edit the span list. The duration is
/// stored exactly so that a clip trimmed to `d` reports `d` with no accumulated float error.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipTimeline {
    source_duration_sec: f64,
    spans: Vec<SourceSpan>,
    duration_sec: f64,
}

impl ClipTimeline {
    /// Timeline that plays the whole source once.
    pub fn new(source_duration_sec: f64) -> ReelResult<Self> {
        if !source_duration_sec.is_finite() || source_duration_sec < 0.0 {
            return Err(ReelError::validation(format!(
                "clip duration must be finite and >= 0, got {source_duration_sec}"
            )));
        }
        let spans = if source_duration_sec > 0.0 {
            vec![SourceSpan {
                start_sec: 0.0,
                end_sec: source_duration_sec,
            }]
        } else {
            Vec::new()
        };
        Ok(Self {
            source_duration_sec,
            spans,
            duration_sec: source_duration_sec,
        })
    }

    /// Intrinsic duration of the underlying source.
    pub fn source_duration_sec(&self) -> f64 {
        self.source_duration_sec
    }

    /// Playback duration of this view.
    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    /// Source spans in playback order.
    pub fn spans(&self) -> &[SourceSpan] {
        &self.spans
    }

    /// Keep `[0, duration_sec)` of this view. Longer requests leave the view unchanged.
    pub fn trimmed(&self, duration_sec: f64) -> Self {
        let target = duration_sec.max(0.0).min(self.duration_sec);
        let mut spans = Vec::new();
        let mut acc = 0.0f64;
        for span in &self.spans {
            let remaining = target - acc;
            if remaining <= TIME_EPSILON {
                break;
            }
            let len = span.len_sec();
            if len <= remaining {
                spans.push(*span);
                acc += len;
            } else {
                spans.push(SourceSpan {
                    start_sec: span.start_sec,
                    end_sec: span.start_sec + remaining,
                });
                break;
            }
        }

        Self {
            source_duration_sec: self.source_duration_sec,
            spans,
            duration_sec: target,
        }
    }

    /// Play this view `times` times back to back, with a hard cut at each boundary.
    pub fn looped(&self, times: u32) -> Self {
        let mut spans = Vec::with_capacity(self.spans.len() * times as usize);
        for _ in 0..times {
            spans.extend_from_slice(&self.spans);
        }
        Self {
            source_duration_sec: self.source_duration_sec,
            spans,
            duration_sec: self.duration_sec * f64::from(times),
        }
    }

    /// Number of output indices at `rate` per second covering this view.
    pub fn index_count(&self, rate: f64) -> u64 {
        count_at_rate(self.duration_sec, rate)
    }

    /// Map output indices at `rate` per second onto source time, one window per span.
    ///
    /// Windows are ordered, non-overlapping and together cover `0..index_count(rate)`.
    pub fn windows(&self, rate: f64) -> Vec<SpanWindow> {
        let mut out = Vec::with_capacity(self.spans.len());
        let last = self.spans.len().saturating_sub(1);
        let mut t0 = 0.0f64;
        for (i, span) in self.spans.iter().enumerate() {
            let t1 = if i == last {
                self.duration_sec
            } else {
                t0 + span.len_sec()
            };
            let first = count_at_rate(t0, rate);
            let end = count_at_rate(t1, rate);
            if end > first {
                let lead_in = (first as f64) / rate - t0;
                out.push(SpanWindow {
                    source_start_sec: span.start_sec + lead_in.max(0.0),
                    source_end_sec: span.end_sec,
                    range: first..end,
                });
            }
            t0 = t1;
        }
        out
    }
}

/// A clip with an editable timeline. Implemented by both video and audio clips.
pub trait TimedClip: Sized {
    /// Current timeline view.
    fn timeline(&self) -> &ClipTimeline;

    /// Derived clip sharing the same source with a different timeline.
    fn with_timeline(&self, timeline: ClipTimeline) -> Self;

    /// Playback duration in seconds.
    fn duration_sec(&self) -> f64 {
        self.timeline().duration_sec()
    }

    /// Subclip `[0, duration_sec)`.
    fn trimmed(&self, duration_sec: f64) -> Self {
        self.with_timeline(self.timeline().trimmed(duration_sec))
    }

    /// Repeat the clip `times` times.
    fn looped(&self, times: u32) -> Self {
        self.with_timeline(self.timeline().looped(times))
    }
}

/// Probed metadata about a source video file.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    /// Path used for decoding.
    pub source_path: PathBuf,
    /// Display frame size: stream rotation and sample aspect ratio already applied.
    pub geometry: Geometry,
    /// Container or stream duration in seconds.
    pub duration_sec: f64,
}

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Silent buffer of `frames` sample frames.
    pub fn silence(sample_rate: u32, channels: u16, frames: u64) -> Self {
        Self {
            sample_rate,
            channels,
            interleaved_f32: vec![0.0; frames as usize * usize::from(channels)],
        }
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.interleaved_f32.len() / usize::from(self.channels)) as u64
    }

    /// Duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (self.frames() as f64) / f64::from(self.sample_rate)
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.interleaved_f32
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()))
    }
}

/// Video clip: a shared source plus a timeline view and an optional geometry plan.
#[derive(Clone, Debug)]
pub struct VideoClip {
    source: Arc<VideoSourceInfo>,
    timeline: ClipTimeline,
    plan: Option<FramePlan>,
}

impl VideoClip {
    /// Clip playing the whole source at its natural size.
    pub fn new(source: VideoSourceInfo) -> ReelResult<Self> {
        if source.geometry.is_empty() {
            return Err(ReelError::validation(format!(
                "video '{}' has empty geometry {}",
                source.source_path.display(),
                source.geometry
            )));
        }
        let timeline = ClipTimeline::new(source.duration_sec)?;
        Ok(Self {
            source: Arc::new(source),
            timeline,
            plan: None,
        })
    }

    /// Shared source metadata.
    pub fn source(&self) -> &Arc<VideoSourceInfo> {
        &self.source
    }

    /// Decoded frame size before any reformatting.
    pub fn natural_geometry(&self) -> Geometry {
        self.source.geometry
    }

    /// Frame size this clip renders at.
    pub fn geometry(&self) -> Geometry {
        self.plan
            .as_ref()
            .map(FramePlan::output)
            .unwrap_or(self.source.geometry)
    }

    /// Geometry plan applied to every decoded frame, if any.
    pub fn plan(&self) -> Option<&FramePlan> {
        self.plan.as_ref()
    }

    /// Derived clip that renders through `plan`.
    pub fn with_plan(&self, plan: FramePlan) -> Self {
        Self {
            source: Arc::clone(&self.source),
            timeline: self.timeline.clone(),
            plan: Some(plan),
        }
    }
}

impl TimedClip for VideoClip {
    fn timeline(&self) -> &ClipTimeline {
        &self.timeline
    }

    fn with_timeline(&self, timeline: ClipTimeline) -> Self {
        Self {
            source: Arc::clone(&self.source),
            timeline,
            plan: self.plan.clone(),
        }
    }
}

/// Audio clip: shared decoded PCM plus a timeline view.
#[derive(Clone, Debug)]
pub struct AudioClip {
    pcm: Arc<AudioPcm>,
    timeline: ClipTimeline,
}

impl AudioClip {
    /// Clip playing the whole buffer once.
    pub fn new(pcm: AudioPcm) -> ReelResult<Self> {
        if pcm.sample_rate == 0 || pcm.channels == 0 {
            return Err(ReelError::validation(
                "audio sample_rate and channels must be non-zero",
            ));
        }
        let timeline = ClipTimeline::new(pcm.duration_sec())?;
        Ok(Self {
            pcm: Arc::new(pcm),
            timeline,
        })
    }

    /// Shared decoded samples.
    pub fn pcm(&self) -> &Arc<AudioPcm> {
        &self.pcm
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.pcm.sample_rate
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.pcm.channels
    }

    /// Number of sample frames this view plays.
    pub fn frame_count(&self) -> u64 {
        self.timeline.index_count(f64::from(self.pcm.sample_rate))
    }
}

impl TimedClip for AudioClip {
    fn timeline(&self) -> &ClipTimeline {
        &self.timeline
    }

    fn with_timeline(&self, timeline: ClipTimeline) -> Self {
        Self {
            pcm: Arc::clone(&self.pcm),
            timeline,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/clip.rs"]
mod tests;
