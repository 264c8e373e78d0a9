use super::*;
use crate::sync::sync_to_duration;

const RATE: u32 = 8_000;

fn constant(value: f32, channels: u16, secs: u64) -> AudioClip {
    let frames = u64::from(RATE) * secs;
    AudioClip::new(AudioPcm {
        sample_rate: RATE,
        channels,
        interleaved_f32: vec![value; frames as usize * usize::from(channels)],
    })
    .unwrap()
}

fn ramp(frames: u64) -> AudioClip {
    AudioClip::new(AudioPcm {
        sample_rate: RATE,
        channels: 1,
        interleaved_f32: (0..frames).map(|i| i as f32 / 100_000.0).collect(),
    })
    .unwrap()
}

#[test]
fn long_background_is_truncated_to_narration_and_ducked() {
    let narration = constant(0.2, 2, 20);
    let background = sync_to_duration(&constant(0.5, 2, 45), narration.duration_sec()).unwrap();
    let mixed = mix_narration(&narration, &background, 0.3).unwrap();

    assert_eq!(mixed.frames(), u64::from(RATE) * 20);
    assert_eq!(mixed.duration_sec(), 20.0);
    assert!(
        mixed
            .interleaved_f32
            .iter()
            .all(|&s| (s - (0.2 + 0.3 * 0.5)).abs() < 1e-6)
    );
}

#[test]
fn short_background_loops_under_narration() {
    let narration = constant(0.0, 1, 3);
    let bg = ramp(u64::from(RATE));
    let background = sync_to_duration(&bg, 3.0).unwrap();
    let mixed = mix_narration(&narration, &background, 1.0).unwrap();

    assert_eq!(mixed.frames(), u64::from(RATE) * 3);
    let r = RATE as usize;
    // Every loop restarts the ramp from its first sample.
    assert_eq!(mixed.interleaved_f32[0], 0.0);
    assert_eq!(mixed.interleaved_f32[r], 0.0);
    assert_eq!(mixed.interleaved_f32[2 * r], 0.0);
    assert_eq!(mixed.interleaved_f32[r + 10], bg.pcm().interleaved_f32[10]);
}

#[test]
fn mono_background_is_duplicated_across_stereo() {
    let narration = constant(0.0, 2, 1);
    let background = constant(0.4, 1, 1);
    let mixed = mix_narration(&narration, &background, 0.5).unwrap();
    assert_eq!(mixed.channels, 2);
    assert!(mixed.interleaved_f32.iter().all(|&s| (s - 0.2).abs() < 1e-6));
}

#[test]
fn sum_is_clamped() {
    let narration = constant(0.9, 1, 1);
    let background = constant(0.9, 1, 1);
    let mixed = mix_narration(&narration, &background, 1.0).unwrap();
    assert!(mixed.interleaved_f32.iter().all(|&s| s == 1.0));
}

#[test]
fn sample_rate_mismatch_is_rejected() {
    let narration = constant(0.1, 1, 1);
    let other = AudioClip::new(AudioPcm::silence(RATE * 2, 1, 100)).unwrap();
    assert!(matches!(
        mix_narration(&narration, &other, 0.3),
        Err(ReelError::Validation(_))
    ));
}

#[test]
fn silent_narration_is_empty_input() {
    let narration = AudioClip::new(AudioPcm::silence(RATE, 2, 0)).unwrap();
    let background = constant(0.5, 2, 1);
    assert!(matches!(
        mix_narration(&narration, &background, 0.3),
        Err(ReelError::EmptyInput(_))
    ));
}

#[test]
fn pcm_file_is_little_endian_f32() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("mix.f32le");
    let pcm = AudioPcm {
        sample_rate: RATE,
        channels: 1,
        interleaved_f32: vec![0.25, -1.0],
    };
    write_pcm_f32le(&pcm, &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[..4], &0.25f32.to_le_bytes());
    assert_eq!(&bytes[4..], &(-1.0f32).to_le_bytes());
}
