//! Narration and background mixing.

/// Two-layer ducking mix and raw PCM output.
pub mod mix;
