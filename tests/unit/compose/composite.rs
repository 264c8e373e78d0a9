use std::sync::Arc;

use super::*;
use crate::foundation::core::Geometry;

fn overlay(x: i32, y: i32, width: u32, height: u32, px: [u8; 4]) -> OverlayClip {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&px);
    }
    OverlayClip {
        text: "t".to_string(),
        start_sec: 0.0,
        duration_sec: 1.0,
        x,
        y,
        width,
        height,
        rgba8_premul: Arc::new(data),
    }
}

fn pixel(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn over_respects_premultiplied_alpha() {
    let red = [255, 0, 0, 255];
    assert_eq!(over(red, [0, 0, 0, 0]), red);
    assert_eq!(over(red, [0, 0, 255, 255]), [0, 0, 255, 255]);
    // 50% white over opaque red.
    assert_eq!(over(red, [128, 128, 128, 128]), [255, 128, 128, 255]);
}

#[test]
fn overlay_only_touches_its_rect() {
    let mut frame = FrameRGBA::solid(Geometry::new(4, 4), [10, 20, 30, 255]);
    composite_overlay(&mut frame, &overlay(1, 1, 2, 2, [200, 200, 200, 255])).unwrap();
    assert_eq!(pixel(&frame, 0, 0), [10, 20, 30, 255]);
    assert_eq!(pixel(&frame, 1, 1), [200, 200, 200, 255]);
    assert_eq!(pixel(&frame, 2, 2), [200, 200, 200, 255]);
    assert_eq!(pixel(&frame, 3, 3), [10, 20, 30, 255]);
}

#[test]
fn overlay_hanging_off_frame_is_clipped() {
    let mut frame = FrameRGBA::solid(Geometry::new(4, 4), [0, 0, 0, 255]);
    composite_overlay(&mut frame, &overlay(-1, 3, 3, 3, [255, 255, 255, 255])).unwrap();
    assert_eq!(pixel(&frame, 0, 3), [255, 255, 255, 255]);
    assert_eq!(pixel(&frame, 1, 3), [255, 255, 255, 255]);
    assert_eq!(pixel(&frame, 2, 3), [0, 0, 0, 255]);
    assert_eq!(pixel(&frame, 0, 2), [0, 0, 0, 255]);
}

#[test]
fn transparent_overlay_leaves_frame_untouched() {
    let before = FrameRGBA::solid(Geometry::new(3, 3), [1, 2, 3, 255]);
    let mut frame = before.clone();
    composite_overlay(&mut frame, &overlay(0, 0, 3, 3, [0, 0, 0, 0])).unwrap();
    assert_eq!(frame, before);
}

#[test]
fn malformed_overlay_is_rejected() {
    let mut frame = FrameRGBA::solid(Geometry::new(2, 2), [0, 0, 0, 255]);
    let mut o = overlay(0, 0, 2, 2, [0, 0, 0, 0]);
    o.rgba8_premul = Arc::new(vec![0; 3]);
    assert!(composite_overlay(&mut frame, &o).is_err());
}
