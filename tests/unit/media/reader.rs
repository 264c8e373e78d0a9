use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::*;
use crate::encode::sink::FrameSink;
use crate::foundation::core::Geometry;
use crate::media::clip::{AudioPcm, VideoSourceInfo};
use crate::reformat::reformat_clip;
use crate::sync::sync_to_duration;

/// Serves `frames_per_open` frames per decoder; frame `k` of a decoder opened at `start` has its
/// red channel set to `start * 10 + k`.
struct CountingBackend {
    frames_per_open: u32,
    opens: RefCell<Vec<f64>>,
}

impl CountingBackend {
    fn new(frames_per_open: u32) -> Self {
        Self {
            frames_per_open,
            opens: RefCell::new(Vec::new()),
        }
    }
}

struct CountingSource {
    geometry: Geometry,
    base: u32,
    produced: u32,
    limit: u32,
}

impl FrameSource for CountingSource {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn next_frame(&mut self) -> ReelResult<Option<FrameRGBA>> {
        if self.produced >= self.limit {
            return Ok(None);
        }
        let v = (self.base + self.produced) as u8;
        self.produced += 1;
        Ok(Some(FrameRGBA::solid(self.geometry, [v, 0, 0, 255])))
    }
}

impl MediaBackend for CountingBackend {
    fn probe_video(&self, _path: &Path) -> ReelResult<VideoSourceInfo> {
        Err(ReelError::render("not used"))
    }

    fn decode_audio(&self, _: &Path, _: u32, _: u16) -> ReelResult<AudioPcm> {
        Err(ReelError::render("not used"))
    }

    fn open_video(
        &self,
        source: &VideoSourceInfo,
        start_sec: f64,
        _fps: Fps,
    ) -> ReelResult<Box<dyn FrameSource>> {
        self.opens.borrow_mut().push(start_sec);
        Ok(Box::new(CountingSource {
            geometry: source.geometry,
            base: (start_sec * 10.0).round() as u32,
            produced: 0,
            limit: self.frames_per_open,
        }))
    }

    fn video_sink(&self, _: &Path) -> ReelResult<Box<dyn FrameSink>> {
        Err(ReelError::render("not used"))
    }

    fn encode_audio(&self, _: &Path, _: u32, _: u16, _: &Path) -> ReelResult<()> {
        Err(ReelError::render("not used"))
    }

    fn mux(&self, _: &crate::backend::MuxJob) -> ReelResult<()> {
        Err(ReelError::render("not used"))
    }
}

fn one_second_clip(geometry: Geometry) -> VideoClip {
    VideoClip::new(VideoSourceInfo {
        source_path: PathBuf::from("clip.mp4"),
        geometry,
        duration_sec: 1.0,
    })
    .unwrap()
}

fn fps10() -> Fps {
    Fps::new(10, 1).unwrap()
}

fn drain(reader: &mut ClipFrameReader<'_>) -> Vec<(u64, FrameRGBA)> {
    let mut out = Vec::new();
    while let Some((idx, frame)) = reader.next_frame().unwrap() {
        out.push((idx.0, frame));
    }
    out
}

#[test]
fn single_pass_reads_every_frame_in_order() {
    let backend = CountingBackend::new(10);
    let clip = one_second_clip(Geometry::new(4, 2));
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10());
    assert_eq!(reader.frame_count(), 10);

    let frames = drain(&mut reader);
    assert_eq!(frames.len(), 10);
    for (i, (idx, frame)) in frames.iter().enumerate() {
        assert_eq!(*idx, i as u64);
        assert_eq!(frame.data[0], i as u8);
    }
    assert_eq!(backend.opens.borrow().len(), 1);
    assert!(reader.next_frame().unwrap().is_none());
}

#[test]
fn short_looped_clip_is_decoded_once() {
    let backend = CountingBackend::new(10);
    let clip = sync_to_duration(&one_second_clip(Geometry::new(4, 2)), 2.5).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10());
    assert_eq!(reader.frame_count(), 25);

    let reds: Vec<u8> = drain(&mut reader).iter().map(|(_, f)| f.data[0]).collect();
    let expected: Vec<u8> = (0..10).chain(0..10).chain(0..5).collect();
    assert_eq!(reds, expected);
    assert_eq!(*backend.opens.borrow(), vec![0.0]);
}

#[test]
fn many_loops_of_a_short_clip_share_one_decoder() {
    let backend = CountingBackend::new(10);
    let clip = sync_to_duration(&one_second_clip(Geometry::new(4, 2)), 100.0).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10());

    let frames = drain(&mut reader);
    assert_eq!(frames.len(), 1000);
    assert_eq!(frames[995].1.data[0], 5);
    assert_eq!(backend.opens.borrow().len(), 1);
}

#[test]
fn cached_replay_repeats_last_frame_of_short_decode() {
    let backend = CountingBackend::new(6);
    let clip = sync_to_duration(&one_second_clip(Geometry::new(4, 2)), 2.0).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10());

    let reds: Vec<u8> = drain(&mut reader).iter().map(|(_, f)| f.data[0]).collect();
    assert_eq!(&reds[..10], &[0, 1, 2, 3, 4, 5, 5, 5, 5, 5]);
    assert_eq!(&reds[10..], &[0, 1, 2, 3, 4, 5, 5, 5, 5, 5]);
    assert_eq!(backend.opens.borrow().len(), 1);
}

#[test]
fn cached_replay_of_empty_source_is_a_render_error() {
    let backend = CountingBackend::new(0);
    let clip = sync_to_duration(&one_second_clip(Geometry::new(4, 2)), 2.0).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10());
    assert!(matches!(reader.next_frame(), Err(ReelError::Render(_))));
}

#[test]
fn looped_clip_over_cache_budget_restarts_decoder_at_each_loop() {
    let backend = CountingBackend::new(10);
    let clip = sync_to_duration(&one_second_clip(Geometry::new(4, 2)), 2.5).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10()).with_cache_budget(0);
    assert_eq!(reader.frame_count(), 25);

    let frames = drain(&mut reader);
    let reds: Vec<u8> = frames.iter().map(|(_, f)| f.data[0]).collect();
    let expected: Vec<u8> = (0..10).chain(0..10).chain(0..5).collect();
    assert_eq!(reds, expected);

    let opens = backend.opens.borrow();
    assert_eq!(opens.len(), 3);
    assert!(opens.iter().all(|s| s.abs() < 1e-9));
}

#[test]
fn early_end_of_stream_repeats_last_frame() {
    let backend = CountingBackend::new(6);
    let clip = sync_to_duration(&one_second_clip(Geometry::new(4, 2)), 2.0).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10()).with_cache_budget(0);

    let reds: Vec<u8> = drain(&mut reader).iter().map(|(_, f)| f.data[0]).collect();
    assert_eq!(reds.len(), 20);
    assert_eq!(&reds[..10], &[0, 1, 2, 3, 4, 5, 5, 5, 5, 5]);
    // The second loop opens a fresh decoder rather than staying dry.
    assert_eq!(&reds[10..], &[0, 1, 2, 3, 4, 5, 5, 5, 5, 5]);
    assert_eq!(backend.opens.borrow().len(), 2);
}

#[test]
fn source_without_frames_is_a_render_error() {
    let backend = CountingBackend::new(0);
    let clip = one_second_clip(Geometry::new(4, 2));
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10());
    assert!(matches!(reader.next_frame(), Err(ReelError::Render(_))));
}

#[test]
fn frame_plan_is_applied_to_decoded_frames() {
    let backend = CountingBackend::new(10);
    let target = Geometry::new(2, 4);
    let clip = reformat_clip(&one_second_clip(Geometry::new(4, 2)), target).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &clip, fps10());

    let frames = drain(&mut reader);
    assert_eq!(frames.len(), 10);
    assert!(frames.iter().all(|(_, f)| f.geometry() == target));

    let looped = sync_to_duration(&clip, 1.5).unwrap();
    let mut reader = ClipFrameReader::new(&backend, &looped, fps10());
    let frames = drain(&mut reader);
    assert_eq!(frames.len(), 15);
    assert!(frames.iter().all(|(_, f)| f.geometry() == target));
}
