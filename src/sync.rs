//! Force a clip to an exact duration by looping and trimming.

use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::TimedClip;

/// Loop-then-trim (shorter clips) or trim (longer clips) `clip` to exactly `target_sec`.
///
/// Loop points are hard cuts. The returned clip shares the source of `clip` and its
/// `duration_sec()` equals `target_sec`.
pub fn sync_to_duration<C: TimedClip>(clip: &C, target_sec: f64) -> ReelResult<C> {
    if !target_sec.is_finite() || target_sec < 0.0 {
        return Err(ReelError::validation(format!(
            "target duration must be finite and >= 0, got {target_sec}"
        )));
    }
    if target_sec == 0.0 {
        return Ok(clip.trimmed(0.0));
    }

    let duration = clip.duration_sec();
    if duration <= 0.0 {
        return Err(ReelError::empty_input(format!(
            "cannot loop a zero-length clip to {target_sec:.3}s"
        )));
    }
    if duration >= target_sec {
        return Ok(clip.trimmed(target_sec));
    }

    let mut loops = (target_sec / duration).ceil().max(1.0);
    while loops * duration < target_sec {
        loops += 1.0;
    }
    if loops > f64::from(u32::MAX) {
        return Err(ReelError::validation(format!(
            "looping a {duration}s clip to {target_sec}s needs too many repetitions"
        )));
    }
    let loops = loops as u32;
    tracing::debug!(duration, target_sec, loops, "loop clip");
    Ok(clip.looped(loops).trimmed(target_sec))
}
