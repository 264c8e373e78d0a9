//! Fit arbitrary source frames onto the fixed vertical target.
//!
//! Frames are scaled so their height matches the target, then center-cropped when too wide or
//! padded with opaque black when too narrow. The output is always exactly the target size.

use image::{Rgba, RgbaImage, imageops};

use crate::foundation::core::{FrameRGBA, Geometry};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::VideoClip;

/// Horizontal fit applied after height normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitMode {
    /// Scaled frame is at least as wide as the target; keep `[x_offset, x_offset + W)`.
    Crop {
        /// First kept column of the scaled frame.
        x_offset: u32,
    },
    /// Scaled frame is narrower than the target; add black bars.
    Pad {
        /// Bar width on the left.
        left: u32,
        /// Bar width on the right.
        right: u32,
    },
}

/// Per-source geometry plan, computed once and applied to every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    /// Natural size of the decoded frames.
    pub source: Geometry,
    /// Size after uniform scaling to the target height.
    pub scaled: Geometry,
    /// Final output size.
    pub target: Geometry,
    /// Crop or pad step.
    pub fit: FitMode,
}

impl FramePlan {
    /// Plan the crop-or-pad fit of `source` onto `target`.
    pub fn fit_vertical(source: Geometry, target: Geometry) -> ReelResult<Self> {
        if source.is_empty() {
            return Err(ReelError::validation(format!(
                "cannot reformat empty frame geometry {source}"
            )));
        }
        if target.is_empty() {
            return Err(ReelError::validation(format!(
                "cannot reformat onto empty target {target}"
            )));
        }

        // round(w * H / h) in integer math
        let w = u64::from(source.width);
        let h = u64::from(source.height);
        let scaled_w = ((2 * w * u64::from(target.height) + h) / (2 * h)).max(1);
        let scaled_w = u32::try_from(scaled_w).map_err(|_| {
            ReelError::validation(format!("scaled width of {source} overflows"))
        })?;
        let scaled = Geometry::new(scaled_w, target.height);

        let fit = if scaled_w >= target.width {
            FitMode::Crop {
                x_offset: (scaled_w - target.width) / 2,
            }
        } else {
            let total = target.width - scaled_w;
            let left = total / 2;
            FitMode::Pad {
                left,
                right: total - left,
            }
        };

        Ok(Self {
            source,
            scaled,
            target,
            fit,
        })
    }

    /// Size of every frame produced by [`FramePlan::apply`].
    pub fn output(&self) -> Geometry {
        self.target
    }

    /// Return `true` when frames pass through unchanged.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Resize, then crop or pad one opaque frame.
    pub fn apply(&self, frame: &FrameRGBA) -> ReelResult<FrameRGBA> {
        if frame.geometry() != self.source {
            return Err(ReelError::render(format!(
                "frame is {}, plan expects {}",
                frame.geometry(),
                self.source
            )));
        }
        frame.validate()?;
        if self.is_identity() {
            return Ok(frame.clone());
        }

        let img = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| ReelError::render("frame buffer does not match its dimensions"))?;
        let scaled = if self.scaled == self.source {
            img
        } else {
            imageops::resize(
                &img,
                self.scaled.width,
                self.scaled.height,
                imageops::FilterType::Triangle,
            )
        };

        let out = match self.fit {
            FitMode::Crop { x_offset } => {
                imageops::crop_imm(&scaled, x_offset, 0, self.target.width, self.target.height)
                    .to_image()
            }
            FitMode::Pad { left, .. } => {
                let mut canvas = RgbaImage::from_pixel(
                    self.target.width,
                    self.target.height,
                    Rgba([0, 0, 0, 255]),
                );
                imageops::replace(&mut canvas, &scaled, i64::from(left), 0);
                canvas
            }
        };

        Ok(FrameRGBA {
            width: out.width(),
            height: out.height(),
            data: out.into_raw(),
            premultiplied: frame.premultiplied,
        })
    }
}

/// Attach a fit-to-`target` plan to `clip`. Timing is untouched.
#[tracing::instrument(skip(clip, target), fields(source = %clip.natural_geometry(), target = %target))]
pub fn reformat_clip(clip: &VideoClip, target: Geometry) -> ReelResult<VideoClip> {
    let plan = FramePlan::fit_vertical(clip.natural_geometry(), target)?;
    tracing::debug!(fit = ?plan.fit, scaled = %plan.scaled, "frame plan");
    Ok(clip.with_plan(plan))
}

#[cfg(test)]
#[path = "../tests/unit/reformat.rs"]
mod tests;
