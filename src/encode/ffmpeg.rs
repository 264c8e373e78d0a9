use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::config::EncodeSettings;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameRGBA};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::media::decode::{join_stderr, spawn_stderr_drain};

/// Options for [`FfmpegSink`] silent video output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,
    /// Output video file path.
    pub out_path: PathBuf,
    /// Video codec passed to `-c:v`.
    pub video_codec: String,
    /// Pixel format passed to `-pix_fmt`.
    pub pixel_format: String,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Create options for writing a silent video to `out_path` with `encode` codecs.
    pub fn new(
        ffmpeg: impl Into<PathBuf>,
        out_path: impl Into<PathBuf>,
        encode: &EncodeSettings,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            out_path: out_path.into(),
            video_codec: encode.video_codec.clone(),
            pixel_format: encode.pixel_format.clone(),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that spawns `ffmpeg` and streams raw frames to its stdin.
///
/// The output carries no audio; the mixed track is joined later by the mux step. Dropping an
/// unfinished sink kills the encoder.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;

        let mut cmd = Command::new(&self.opts.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw premultiplied RGBA8 frames. `ffmpeg` does not understand premul, so alpha
        // is flattened before writing to stdin (push_frame).
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.ffmpeg_arg(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            &self.opts.video_codec,
            "-pix_fmt",
            &self.opts.pixel_format,
        ]);
        cmd.arg(&self.opts.out_path);
        tracing::debug!(
            out = %self.opts.out_path.display(),
            frames = cfg.frame_count,
            "spawn video encoder"
        );

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::render(format!(
                "failed to spawn '{}' (is it installed?): {e}",
                self.opts.ffmpeg.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::render("failed to open ffmpeg stdin (unexpected)"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::render("failed to open ffmpeg stderr (unexpected)"))?;

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(spawn_stderr_drain(stderr));
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::render("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelError::render(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::render("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelError::render(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::render("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| ReelError::render(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = join_stderr(self.stderr_drain.take())?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::render(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let r = u16::from(s[0]) + mul_div255_u16(bg_r, inv);
        let g = u16::from(s[1]) + mul_div255_u16(bg_g, inv);
        let b = u16::from(s[2]) + mul_div255_u16(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// `ffmpeg` arguments that encode raw interleaved `f32le` PCM into `out_path`.
pub fn encode_audio_args(
    pcm_path: &Path,
    sample_rate: u32,
    channels: u16,
    audio_codec: &str,
    out_path: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "f32le",
        "-ar",
        &sample_rate.to_string(),
        "-ac",
        &channels.to_string(),
        "-i",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(pcm_path.into());
    args.extend(["-vn", "-c:a", audio_codec].iter().map(OsString::from));
    args.push(out_path.into());
    args
}

/// `ffmpeg` arguments that mux a silent video and an encoded audio track into `out_path`.
///
/// Both streams were already encoded with the configured codecs, so they are stream-copied.
/// The container follows the extension of `out_path`.
pub fn mux_args(video_path: &Path, audio_path: &Path, out_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-loglevel".into(), "error".into()];
    args.push("-i".into());
    args.push(video_path.into());
    args.push("-i".into());
    args.push(audio_path.into());
    args.extend(
        [
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "copy", "-shortest",
        ]
        .iter()
        .map(OsString::from),
    );
    if is_mp4_family(out_path) {
        args.extend(["-movflags", "+faststart"].iter().map(OsString::from));
    }
    args.push(out_path.into());
    args
}

fn is_mp4_family(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "mp4" | "m4v" | "mov"))
}

/// Run `ffmpeg` to completion with `args`, capturing stderr for the error message.
pub fn run_ffmpeg(ffmpeg: &Path, args: &[OsString], what: &str) -> ReelResult<()> {
    tracing::debug!(?args, "{what}");
    let out = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            ReelError::render(format!(
                "failed to run '{}' for {what} (is it installed?): {e}",
                ffmpeg.display()
            ))
        })?;
    if !out.status.success() {
        return Err(ReelError::render(format!(
            "ffmpeg {what} exited with status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `tool -version` runs successfully.
pub fn is_tool_available(tool: &Path) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
