use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = ReelConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, ReelConfig::default());
    assert_eq!(cfg.target, Geometry::new(1080, 1920));
    assert_eq!(cfg.fps, Fps::new(24, 1).unwrap());
    assert_eq!(cfg.sample_rate, 44_100);
    assert_eq!(cfg.captions.wrap_width, 35);
    assert!((cfg.background_gain - 0.3).abs() < 1e-6);
    assert_eq!(cfg.encode.video_codec, "libx264");
    assert_eq!(cfg.encode.pixel_format, "yuv420p");
    assert_eq!(cfg.encode.audio_codec, "aac");
}

#[test]
fn partial_override_keeps_other_defaults() {
    let cfg = ReelConfig::from_json_str(
        r#"{ "fps": { "num": 30, "den": 1 }, "captions": { "wrap_width": 20 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.fps.num, 30);
    assert_eq!(cfg.captions.wrap_width, 20);
    assert_eq!(cfg.captions.band_height, 200);
    assert_eq!(cfg.sample_rate, 44_100);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = ReelConfig::from_json_str(r#"{ "resolution": "4k" }"#).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn odd_target_is_rejected() {
    let mut cfg = ReelConfig::default();
    cfg.target = Geometry::new(1081, 1920);
    assert!(cfg.validate().is_err());
}

#[test]
fn zero_wrap_width_and_negative_gain_are_rejected() {
    let mut cfg = ReelConfig::default();
    cfg.captions.wrap_width = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = ReelConfig::default();
    cfg.background_gain = -0.5;
    assert!(cfg.validate().is_err());
}

#[test]
fn band_taller_than_frame_is_rejected() {
    let mut cfg = ReelConfig::default();
    cfg.captions.band_height = 4000;
    assert!(cfg.validate().is_err());
}
