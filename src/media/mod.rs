//! Media clip model plus `ffprobe`/`ffmpeg` probing and decoding.

/// Clip timelines, video/audio clips and decoded PCM.
pub mod clip;
/// Streaming video decode and audio decode through `ffmpeg`.
pub mod decode;
/// Source metadata through `ffprobe`.
pub mod probe;
/// Frame-accurate reader over a clip timeline.
pub mod reader;
