use super::*;

fn video_info(w: u32, h: u32, duration_sec: f64) -> VideoSourceInfo {
    VideoSourceInfo {
        source_path: PathBuf::from("clip.mp4"),
        geometry: Geometry::new(w, h),
        duration_sec,
    }
}

#[test]
fn new_timeline_plays_whole_source() {
    let t = ClipTimeline::new(3.0).unwrap();
    assert_eq!(t.duration_sec(), 3.0);
    assert_eq!(
        t.spans(),
        &[SourceSpan {
            start_sec: 0.0,
            end_sec: 3.0
        }]
    );
}

#[test]
fn negative_or_nan_duration_is_rejected() {
    assert!(ClipTimeline::new(-1.0).is_err());
    assert!(ClipTimeline::new(f64::NAN).is_err());
}

#[test]
fn zero_duration_timeline_has_no_spans() {
    let t = ClipTimeline::new(0.0).unwrap();
    assert!(t.spans().is_empty());
    assert!(t.windows(24.0).is_empty());
    assert_eq!(t.index_count(24.0), 0);
}

#[test]
fn trim_cuts_last_span_and_stores_exact_duration() {
    let t = ClipTimeline::new(3.0).unwrap().looped(4).trimmed(10.0);
    assert_eq!(t.duration_sec(), 10.0);
    assert_eq!(t.spans().len(), 4);
    let last = t.spans()[3];
    assert_eq!(last.start_sec, 0.0);
    assert!((last.end_sec - 1.0).abs() < 1e-9);
}

#[test]
fn trim_longer_than_view_is_noop() {
    let t = ClipTimeline::new(3.0).unwrap();
    assert_eq!(t.trimmed(10.0), t);
}

#[test]
fn loop_repeats_spans() {
    let t = ClipTimeline::new(2.0).unwrap().trimmed(1.5).looped(3);
    assert_eq!(t.duration_sec(), 4.5);
    assert_eq!(t.spans().len(), 3);
    assert!(t.spans().iter().all(|s| s.start_sec == 0.0 && s.end_sec == 1.5));
}

#[test]
fn windows_tile_index_range_without_gaps() {
    let t = ClipTimeline::new(1.3).unwrap().looped(5).trimmed(6.1);
    let fps = 24.0;
    let windows = t.windows(fps);
    assert_eq!(windows.first().unwrap().range.start, 0);
    for pair in windows.windows(2) {
        assert_eq!(pair[0].range.end, pair[1].range.start);
    }
    assert_eq!(windows.last().unwrap().range.end, t.index_count(fps));
    assert_eq!(t.index_count(fps), 147);
}

#[test]
fn window_lead_in_maps_onto_source_time() {
    // Second repetition starts at t=1.3s; the first frame at or after that is frame 32 (1.3333s).
    let t = ClipTimeline::new(1.3).unwrap().looped(2);
    let windows = t.windows(24.0);
    assert_eq!(windows[1].range.start, 32);
    assert!((windows[1].source_start_sec - (32.0 / 24.0 - 1.3)).abs() < 1e-9);
}

#[test]
fn video_clip_derivations_share_source() {
    let clip = VideoClip::new(video_info(1920, 1080, 5.0)).unwrap();
    let trimmed = clip.trimmed(2.0);
    assert!(Arc::ptr_eq(clip.source(), trimmed.source()));
    assert_eq!(trimmed.duration_sec(), 2.0);
    assert_eq!(clip.duration_sec(), 5.0);
}

#[test]
fn video_clip_rejects_empty_geometry() {
    assert!(VideoClip::new(video_info(0, 1080, 5.0)).is_err());
}

#[test]
fn audio_frame_count_matches_pcm_exactly() {
    let pcm = AudioPcm::silence(44_100, 2, 44_100 * 20 + 17);
    let clip = AudioClip::new(pcm).unwrap();
    assert_eq!(clip.frame_count(), 44_100 * 20 + 17);
}

#[test]
fn audio_clip_rejects_zero_rate() {
    assert!(AudioClip::new(AudioPcm::silence(0, 2, 10)).is_err());
}
