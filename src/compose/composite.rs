use crate::captions::render::OverlayClip;
use crate::foundation::core::FrameRGBA;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;

/// Premultiplied source-over.
pub(crate) fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Layer `overlay` onto `frame` at the overlay's placement. Pixels outside the frame are dropped.
pub fn composite_overlay(frame: &mut FrameRGBA, overlay: &OverlayClip) -> ReelResult<()> {
    frame.validate()?;
    let expected = overlay.geometry().rgba8_len();
    if overlay.rgba8_premul.len() != expected {
        return Err(ReelError::render(format!(
            "overlay '{}' holds {} bytes, expected {expected}",
            overlay.text,
            overlay.rgba8_premul.len()
        )));
    }

    let fw = i64::from(frame.width);
    let fh = i64::from(frame.height);
    let x0 = i64::from(overlay.x).max(0);
    let y0 = i64::from(overlay.y).max(0);
    let x1 = (i64::from(overlay.x) + i64::from(overlay.width)).min(fw);
    let y1 = (i64::from(overlay.y) + i64::from(overlay.height)).min(fh);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let ow = i64::from(overlay.width);
    for y in y0..y1 {
        let oy = y - i64::from(overlay.y);
        for x in x0..x1 {
            let ox = x - i64::from(overlay.x);
            let s = ((oy * ow + ox) * 4) as usize;
            let d = ((y * fw + x) * 4) as usize;
            let src = &overlay.rgba8_premul[s..s + 4];
            if src[3] == 0 {
                continue;
            }
            let dst = &mut frame.data[d..d + 4];
            let out = over(
                [dst[0], dst[1], dst[2], dst[3]],
                [src[0], src[1], src[2], src[3]],
            );
            dst.copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/composite.rs"]
mod tests;
