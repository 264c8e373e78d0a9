use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
}

#[test]
fn frame_range_rejects_reversed_bounds() {
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

#[test]
fn secs_to_frames_ceil_absorbs_float_drift() {
    let fps = Fps::new(24, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(9.0), 216);
    assert_eq!(fps.secs_to_frames_ceil(0.1 * 3.0 * 80.0), 576);
    assert_eq!(fps.secs_to_frames_ceil(9.01), 217);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
    assert_eq!(fps.secs_to_frames_ceil(-1.0), 0);
}

#[test]
fn count_at_rate_handles_non_finite() {
    assert_eq!(count_at_rate(f64::NAN, 44_100.0), 0);
    assert_eq!(count_at_rate(1.0, f64::INFINITY), 0);
    assert_eq!(count_at_rate(20.0, 44_100.0), 882_000);
}

#[test]
fn geometry_defaults_to_vertical_target() {
    let g = Geometry::default();
    assert_eq!(g, Geometry::new(1080, 1920));
    assert_eq!(g.to_string(), "1080x1920");
    assert_eq!(g.rgba8_len(), 1080 * 1920 * 4);
}

#[test]
fn solid_frame_is_valid() {
    let f = FrameRGBA::solid(Geometry::new(4, 2), [1, 2, 3, 255]);
    f.validate().unwrap();
    assert_eq!(&f.data[4..8], &[1, 2, 3, 255]);
}
