use crate::backend::{FrameSource, MediaBackend};
use crate::foundation::core::{Fps, FrameIndex, FrameRGBA, count_at_rate};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::{SpanWindow, TimedClip, VideoClip};

/// Looped sources whose decoded frames fit in this many bytes are decoded once and replayed.
const LOOP_CACHE_MAX_BYTES: u64 = 256 << 20;

/// Span count above which per-span decoding is worth a warning.
const MANY_SPANS: usize = 64;

enum ReadMode {
    Pending,
    Spans,
    Cached(Vec<FrameRGBA>),
}

/// Pulls the frames of a [`VideoClip`] in output order at a fixed frame rate.
///
/// A looped clip whose decoded frames fit the cache budget is decoded once and replayed from
/// memory. Otherwise one decoder is opened per timeline span, so the source restarts at every
/// loop boundary. Either way, a source that runs dry inside a span repeats its last frame.
pub struct ClipFrameReader<'a> {
    backend: &'a dyn MediaBackend,
    clip: VideoClip,
    fps: Fps,
    windows: Vec<SpanWindow>,
    window_idx: usize,
    next_index: u64,
    total: u64,
    mode: ReadMode,
    cache_budget: u64,
    decoder: Option<Box<dyn FrameSource>>,
    decoder_dry: bool,
    last: Option<FrameRGBA>,
}

impl<'a> ClipFrameReader<'a> {
    /// Reader over every output frame of `clip` at `fps`.
    pub fn new(backend: &'a dyn MediaBackend, clip: &VideoClip, fps: Fps) -> Self {
        let rate = fps.as_f64();
        Self {
            backend,
            clip: clip.clone(),
            fps,
            windows: clip.timeline().windows(rate),
            window_idx: 0,
            next_index: 0,
            total: clip.timeline().index_count(rate),
            mode: ReadMode::Pending,
            cache_budget: LOOP_CACHE_MAX_BYTES,
            decoder: None,
            decoder_dry: false,
            last: None,
        }
    }

    #[cfg(test)]
    fn with_cache_budget(mut self, bytes: u64) -> Self {
        self.cache_budget = bytes;
        self
    }

    /// Number of frames this reader yields in total.
    pub fn frame_count(&self) -> u64 {
        self.total
    }

    /// Next output frame and its index, or `None` after the last one.
    pub fn next_frame(&mut self) -> ReelResult<Option<(FrameIndex, FrameRGBA)>> {
        if self.next_index >= self.total {
            self.decoder = None;
            return Ok(None);
        }
        if matches!(self.mode, ReadMode::Pending) {
            self.mode = self.choose_mode()?;
        }

        while self
            .windows
            .get(self.window_idx)
            .is_some_and(|w| w.range.end <= self.next_index)
        {
            self.window_idx += 1;
            self.decoder = None;
            self.decoder_dry = false;
        }
        let window = self
            .windows
            .get(self.window_idx)
            .cloned()
            .ok_or_else(|| {
                ReelError::render(format!(
                    "frame {} of '{}' falls outside the clip timeline",
                    self.next_index,
                    self.clip.source().source_path.display()
                ))
            })?;

        let frame = match self.cached_frame(&window) {
            Some(frame) => frame?,
            None => self.next_span_frame(&window)?,
        };

        let idx = FrameIndex(self.next_index);
        self.next_index += 1;
        Ok(Some((idx, frame)))
    }

    fn choose_mode(&self) -> ReelResult<ReadMode> {
        let rate = self.fps.as_f64();
        let source_frames = count_at_rate(self.clip.timeline().source_duration_sec(), rate);
        let cache_bytes =
            source_frames.saturating_mul(self.clip.geometry().rgba8_len() as u64);
        if self.windows.len() > 1 && cache_bytes <= self.cache_budget {
            return self.decode_whole_source(source_frames).map(ReadMode::Cached);
        }
        if self.windows.len() > MANY_SPANS {
            tracing::warn!(
                spans = self.windows.len(),
                cache_bytes,
                path = %self.clip.source().source_path.display(),
                "looped source is too large to cache, restarting the decoder at every loop"
            );
        }
        Ok(ReadMode::Spans)
    }

    fn decode_whole_source(&self, source_frames: u64) -> ReelResult<Vec<FrameRGBA>> {
        tracing::debug!(
            frames = source_frames,
            spans = self.windows.len(),
            "caching looped source"
        );
        let mut decoder = self.backend.open_video(self.clip.source(), 0.0, self.fps)?;
        let mut frames = Vec::with_capacity(usize::try_from(source_frames).unwrap_or(0));
        while (frames.len() as u64) < source_frames {
            let Some(raw) = decoder.next_frame()? else {
                break;
            };
            frames.push(self.fit(raw)?);
        }
        if frames.is_empty() {
            return Err(self.no_frames_error());
        }
        Ok(frames)
    }

    /// Replay from the cache; `None` when the reader decodes per span.
    fn cached_frame(&self, window: &SpanWindow) -> Option<ReelResult<FrameRGBA>> {
        let ReadMode::Cached(frames) = &self.mode else {
            return None;
        };
        // Source frame k sits at k / rate, the same grid a decoder seeked to the span start uses.
        let offset = count_at_rate(window.source_start_sec, self.fps.as_f64())
            + (self.next_index - window.range.start);
        let last = frames.len().saturating_sub(1);
        let i = usize::try_from(offset).map_or(last, |i| i.min(last));
        Some(frames.get(i).cloned().ok_or_else(|| self.no_frames_error()))
    }

    fn next_span_frame(&mut self, window: &SpanWindow) -> ReelResult<FrameRGBA> {
        if self.decoder.is_none() && !self.decoder_dry {
            tracing::debug!(
                window = self.window_idx,
                source_start_sec = window.source_start_sec,
                frames = window.range.end - window.range.start,
                "open span decoder"
            );
            self.decoder = Some(self.backend.open_video(
                self.clip.source(),
                window.source_start_sec,
                self.fps,
            )?);
        }

        let decoded = match self.decoder.as_mut() {
            Some(decoder) if !self.decoder_dry => decoder.next_frame()?,
            _ => None,
        };

        match decoded {
            Some(raw) => {
                let frame = self.fit(raw)?;
                self.last = Some(frame.clone());
                Ok(frame)
            }
            None => {
                self.decoder_dry = true;
                self.decoder = None;
                self.last.clone().ok_or_else(|| self.no_frames_error())
            }
        }
    }

    fn fit(&self, raw: FrameRGBA) -> ReelResult<FrameRGBA> {
        match self.clip.plan() {
            Some(plan) => plan.apply(&raw),
            None => Ok(raw),
        }
    }

    fn no_frames_error(&self) -> ReelError {
        ReelError::render(format!(
            "video '{}' produced no frames",
            self.clip.source().source_path.display()
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/reader.rs"]
mod tests;
