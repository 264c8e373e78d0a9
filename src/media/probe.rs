use std::path::Path;
use std::process::Command;

use crate::foundation::core::Geometry;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::VideoSourceInfo;

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    sample_aspect_ratio: Option<String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    tags: Option<ProbeTags>,
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

/// Older muxers store rotation as a stream tag instead of a display matrix.
#[derive(serde::Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe source video metadata through `ffprobe`.
pub fn probe_video(ffprobe: &Path, source_path: &Path) -> ReelResult<VideoSourceInfo> {
    let parsed = run_ffprobe(ffprobe, source_path)?;
    parse_video_probe(&parsed, source_path)
}

/// Probe the duration in seconds of any media file through `ffprobe`.
pub fn probe_duration(ffprobe: &Path, source_path: &Path) -> ReelResult<f64> {
    let parsed = run_ffprobe(ffprobe, source_path)?;
    container_duration(&parsed).ok_or_else(|| {
        ReelError::render(format!(
            "ffprobe reported no duration for '{}'",
            source_path.display()
        ))
    })
}

fn run_ffprobe(ffprobe: &Path, source_path: &Path) -> ReelResult<ProbeOut> {
    let out = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| {
            ReelError::render(format!(
                "failed to run '{}' (is it installed?): {e}",
                ffprobe.display()
            ))
        })?;
    if !out.status.success() {
        return Err(ReelError::render(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

fn parse_probe_json(bytes: &[u8]) -> ReelResult<ProbeOut> {
    serde_json::from_slice(bytes)
        .map_err(|e| ReelError::render(format!("ffprobe json parse failed: {e}")))
}

fn parse_video_probe(parsed: &ProbeOut, source_path: &Path) -> ReelResult<VideoSourceInfo> {
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ReelError::render(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::render("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::render("missing video height from ffprobe"))?;
    let duration_sec = video_stream
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .or_else(|| container_duration(parsed))
        .ok_or_else(|| {
            ReelError::empty_input(format!(
                "video '{}' reports no duration",
                source_path.display()
            ))
        })?;

    let geometry = display_geometry(video_stream, width, height);
    if geometry != Geometry::new(width, height) {
        tracing::debug!(
            coded = %Geometry::new(width, height),
            display = %geometry,
            "video stream is rotated or has non-square pixels"
        );
    }

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        geometry,
        duration_sec,
    })
}

/// Frame size as shown to the viewer: the sample aspect ratio stretches the width, then a
/// quarter-turn rotation swaps the axes.
fn display_geometry(stream: &ProbeStream, width: u32, height: u32) -> Geometry {
    let display_width = stream
        .sample_aspect_ratio
        .as_deref()
        .and_then(parse_ratio)
        .map(|(num, den)| {
            let w = (f64::from(width) * f64::from(num) / f64::from(den)).round();
            (w as u32).max(1)
        })
        .unwrap_or(width);

    match rotation_degrees(stream) {
        90 | 270 => Geometry::new(height, display_width),
        _ => Geometry::new(display_width, height),
    }
}

/// Stream rotation normalized to `0..360`, rounded to whole degrees.
fn rotation_degrees(stream: &ProbeStream) -> i64 {
    let raw = stream
        .side_data_list
        .iter()
        .find_map(|sd| sd.rotation)
        .or_else(|| {
            stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse::<f64>().ok())
        })
        .filter(|r| r.is_finite())
        .unwrap_or(0.0);
    (raw.round() as i64).rem_euclid(360)
}

fn container_duration(parsed: &ProbeOut) -> Option<f64> {
    parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds)
}

fn parse_seconds(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse `ffprobe` ratios such as `4:3` or `30000/1001`. `0:1` (unknown) yields `None`.
fn parse_ratio(s: &str) -> Option<(u32, u32)> {
    let (num, den) = s.split_once([':', '/'])?;
    let num = num.trim().parse::<u32>().ok()?;
    let den = den.trim().parse::<u32>().ok()?;
    if num == 0 || den == 0 {
        return None;
    }
    Some((num, den))
}
