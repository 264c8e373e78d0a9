//! Encoding sinks and `ffmpeg` command builders.
//!
//! Sinks consume rendered frames in timeline order and are used by the composer's silent render.

/// `ffmpeg`-based sink plus audio encode and mux commands.
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
