use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::{AudioClip, AudioPcm, TimedClip};

/// One input of a mix: a clip played from t=0 at a linear gain.
#[derive(Clone, Debug)]
pub struct MixLayer<'a> {
    /// Clip whose timeline is rendered into the mix.
    pub clip: &'a AudioClip,
    /// Linear gain.
    pub gain: f32,
}

/// Mix narration at unity gain with `background` at `background_gain`.
///
/// The result has the narration's sample rate, channel count and exact frame count; background
/// audio past the end of the narration is dropped.
#[tracing::instrument(skip(narration, background))]
pub fn mix_narration(
    narration: &AudioClip,
    background: &AudioClip,
    background_gain: f32,
) -> ReelResult<AudioPcm> {
    let frames = narration.frame_count();
    if frames == 0 {
        return Err(ReelError::empty_input("narration has no audio samples"));
    }
    let pcm = mix_layers(
        &[
            MixLayer {
                clip: narration,
                gain: 1.0,
            },
            MixLayer {
                clip: background,
                gain: background_gain,
            },
        ],
        narration.sample_rate(),
        narration.channels(),
        frames,
    )?;
    tracing::debug!(frames, peak = pcm.peak(), "audio mixed");
    Ok(pcm)
}

/// Sum `layers` into `frames` sample frames, clamped to `[-1, 1]`.
pub fn mix_layers(
    layers: &[MixLayer<'_>],
    sample_rate: u32,
    channels: u16,
    frames: u64,
) -> ReelResult<AudioPcm> {
    if sample_rate == 0 || channels == 0 {
        return Err(ReelError::validation(
            "mix sample_rate and channels must be non-zero",
        ));
    }
    let mut out = AudioPcm::silence(sample_rate, channels, frames);
    for layer in layers {
        if layer.clip.sample_rate() != sample_rate {
            return Err(ReelError::validation(format!(
                "cannot mix {} Hz audio into a {sample_rate} Hz track",
                layer.clip.sample_rate()
            )));
        }
        if !layer.gain.is_finite() || layer.gain < 0.0 {
            return Err(ReelError::validation(
                "mix gain must be finite and >= 0",
            ));
        }
        mix_clip(&mut out, layer.clip, layer.gain);
    }

    for s in &mut out.interleaved_f32 {
        *s = s.clamp(-1.0, 1.0);
    }
    Ok(out)
}

fn mix_clip(out: &mut AudioPcm, clip: &AudioClip, gain: f32) {
    if gain == 0.0 {
        return;
    }
    let rate = f64::from(out.sample_rate);
    let out_frames = out.frames();
    let out_ch = usize::from(out.channels);
    let src = clip.pcm();
    let src_ch = usize::from(src.channels);
    let src_frames = src.frames();

    for window in clip.timeline().windows(rate) {
        let first_src = (window.source_start_sec * rate).round() as u64;
        let end_src = ((window.source_end_sec * rate).round() as u64).min(src_frames);
        let end_dst = window.range.end.min(out_frames);

        for (dst_frame, src_frame) in (window.range.start..end_dst).zip(first_src..end_src) {
            let s = src_frame as usize * src_ch;
            let d = dst_frame as usize * out_ch;
            let frame = &src.interleaved_f32[s..s + src_ch];
            if out_ch == 1 && src_ch > 1 {
                let mean = frame.iter().sum::<f32>() / src_ch as f32;
                out.interleaved_f32[d] += mean * gain;
                continue;
            }
            for c in 0..out_ch {
                out.interleaved_f32[d + c] += frame[c.min(src_ch - 1)] * gain;
            }
        }
    }
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_pcm_f32le(pcm: &AudioPcm, out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::render(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(pcm.interleaved_f32.len() * 4);
    for &sample in &pcm.interleaved_f32 {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::render(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
