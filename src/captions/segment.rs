use crate::foundation::error::{ReelError, ReelResult};

/// One wrapped caption line and the narration window it is shown for.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptionSegment {
    /// Line text, at most the wrap width unless a single word is longer.
    pub text: String,
    /// Seconds from narration start.
    pub start_sec: f64,
    /// Seconds the line stays on screen.
    pub duration_sec: f64,
}

impl CaptionSegment {
    /// Exclusive end time in seconds.
    pub fn end_sec(&self) -> f64 {
        self.start_sec + self.duration_sec
    }
}

/// Greedy word wrap at `width` characters.
///
/// Whitespace runs collapse to single spaces. Words are never split: a word longer than `width`
/// sits alone on its own line. Empty or whitespace-only text yields no lines.
pub fn wrap_text(text: &str, width: usize) -> ReelResult<Vec<String>> {
    if width == 0 {
        return Err(ReelError::validation("caption wrap width must be > 0"));
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_chars = 0usize;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if line_chars == 0 {
            line.push_str(word);
            line_chars = word_chars;
        } else if line_chars + 1 + word_chars <= width {
            line.push(' ');
            line.push_str(word);
            line_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
            line_chars = word_chars;
        }
    }
    if line_chars > 0 {
        lines.push(line);
    }
    Ok(lines)
}

/// Wrap `text` and split `duration_sec` equally across the lines.
///
/// Segments are contiguous and cover `[0, duration_sec]`. Empty text produces one blank segment
/// spanning the whole duration.
#[tracing::instrument(skip(text), fields(text_chars = text.chars().count()))]
pub fn segment_captions(
    text: &str,
    width: usize,
    duration_sec: f64,
) -> ReelResult<Vec<CaptionSegment>> {
    if !duration_sec.is_finite() || duration_sec <= 0.0 {
        return Err(ReelError::empty_input(format!(
            "caption duration must be positive, got {duration_sec}"
        )));
    }
    let mut lines = wrap_text(text, width)?;
    if lines.is_empty() {
        lines.push(String::new());
    }

    let step = duration_sec / lines.len() as f64;
    let segments: Vec<CaptionSegment> = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| CaptionSegment {
            text,
            start_sec: i as f64 * step,
            duration_sec: step,
        })
        .collect();
    tracing::debug!(segments = segments.len(), step_sec = step, "captions segmented");
    Ok(segments)
}

#[cfg(test)]
#[path = "../../tests/unit/captions/segment.rs"]
mod tests;
