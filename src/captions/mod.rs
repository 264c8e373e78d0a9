//! Caption segmentation, font resolution and rasterization.

/// Caption font loading and text layout.
pub mod font;
/// Caption band rasterization.
pub mod render;
/// Word wrap and equal-split timing.
pub mod segment;
