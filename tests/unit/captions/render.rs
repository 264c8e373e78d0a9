use super::*;

fn overlay(start_sec: f64, duration_sec: f64) -> OverlayClip {
    OverlayClip {
        text: "x".to_string(),
        start_sec,
        duration_sec,
        x: 0,
        y: 0,
        width: 2,
        height: 2,
        rgba8_premul: Arc::new(vec![0; 16]),
    }
}

fn renderer() -> Option<CaptionRenderer> {
    // Machines without any installed font cannot rasterize text.
    let font = CaptionFont::system_default().ok()?;
    Some(
        CaptionRenderer::new(&font, &CaptionStyle::default(), Geometry::VERTICAL_1080X1920)
            .unwrap(),
    )
}

fn alpha_bbox(pixels: &[u8], width: u32) -> Option<(u32, u32, u32, u32)> {
    let mut bbox: Option<(u32, u32, u32, u32)> = None;
    for (i, px) in pixels.chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let (x, y) = (i as u32 % width, i as u32 / width);
        bbox = Some(match bbox {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bbox
}

#[test]
fn frame_range_follows_ceil_rule() {
    let fps = Fps::new(24, 1).unwrap();
    let r = overlay(10.0, 10.0).frame_range(fps);
    assert_eq!((r.start.0, r.end.0), (240, 480));

    // 0.5s at 24fps starts on frame 12; 1.3s ends before frame 32.
    let r = overlay(0.5, 0.8).frame_range(fps);
    assert_eq!((r.start.0, r.end.0), (12, 32));
}

#[test]
fn adjacent_overlays_share_boundary_frames_exactly_once() {
    let fps = Fps::new(30000, 1001).unwrap();
    let step = 37.0 / 3.0;
    let a = overlay(0.0, step).frame_range(fps);
    let b = overlay(step, step).frame_range(fps);
    assert_eq!(a.end, b.start);
}

#[test]
fn band_outside_frame_is_rejected() {
    let Ok(font) = CaptionFont::system_default() else {
        return;
    };
    let style = CaptionStyle {
        band_height: 400,
        ..CaptionStyle::default()
    };
    assert!(CaptionRenderer::new(&font, &style, Geometry::new(1080, 300)).is_err());
}

#[test]
fn empty_text_renders_transparent_band() {
    let Some(mut r) = renderer() else {
        return;
    };
    let px = r.render_band("  ").unwrap();
    assert_eq!(px.len(), 1080 * 200 * 4);
    assert!(px.iter().all(|&b| b == 0));
}

#[test]
fn text_is_outlined_and_centered_in_band() {
    let Some(mut r) = renderer() else {
        return;
    };
    let px = r.render_band("Hello world").unwrap();
    let (x0, y0, x1, y1) = alpha_bbox(&px, 1080).expect("glyphs are drawn");

    let cx = (x0 + x1) / 2;
    let cy = (y0 + y1) / 2;
    assert!((cx as i64 - 540).abs() < 40, "horizontal center {cx}");
    assert!((cy as i64 - 100).abs() < 50, "vertical center {cy}");

    let opaque: Vec<&[u8]> = px.chunks_exact(4).filter(|p| p[3] == 255).collect();
    assert!(opaque.iter().any(|p| p[0] > 240 && p[1] > 240 && p[2] > 240));
    assert!(opaque.iter().any(|p| p[0] < 16 && p[1] < 16 && p[2] < 16));
}

#[test]
fn segment_overlay_is_centered_on_frame() {
    let Some(mut r) = renderer() else {
        return;
    };
    let seg = CaptionSegment {
        text: "Caption".to_string(),
        start_sec: 2.0,
        duration_sec: 3.0,
    };
    let o = r.render_segment(&seg).unwrap();
    assert_eq!((o.x, o.y), (0, 860));
    assert_eq!(o.geometry(), Geometry::new(1080, 200));
    assert_eq!(o.end_sec(), 5.0);
    assert!(!o.is_transparent());
}

#[test]
fn straight_export_unpremultiplies_pixels() {
    let mut o = overlay(0.0, 1.0);
    o.width = 2;
    o.height = 1;
    o.rgba8_premul = Arc::new(vec![128, 128, 128, 128, 0, 0, 0, 0]);
    assert_eq!(o.to_straight_rgba8(), vec![255, 255, 255, 128, 0, 0, 0, 0]);
}
