use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::backend::FrameSource;
use crate::foundation::core::{Fps, FrameRGBA, Geometry};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::clip::{AudioPcm, VideoSourceInfo};

type StderrDrain = std::thread::JoinHandle<std::io::Result<Vec<u8>>>;

/// Streaming RGBA8 decoder backed by one `ffmpeg` process.
///
/// The process is started seeked to `start_sec`, resamples to the requested frame rate and
/// scales to the probed geometry, so every frame has the same size. Dropping the source kills
/// and reaps the process.
pub struct FfmpegFrameSource {
    source_path: PathBuf,
    geometry: Geometry,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<StderrDrain>,
    frame_len: usize,
}

impl FfmpegFrameSource {
    /// Spawn `ffmpeg` on `source`.
    pub fn open(
        ffmpeg: &Path,
        source: &VideoSourceInfo,
        start_sec: f64,
        fps: Fps,
    ) -> ReelResult<Self> {
        let geometry = source.geometry;
        if geometry.is_empty() {
            return Err(ReelError::render(
                "decoded video frame size is zero (invalid source dimensions)",
            ));
        }
        let start_sec = if start_sec.is_finite() {
            start_sec.max(0.0)
        } else {
            0.0
        };

        // Input autorotation is on by default, so scaling to the display geometry yields upright
        // square-pixel frames.
        let mut cmd = Command::new(ffmpeg);
        cmd.args(["-v", "error", "-nostdin", "-ss", &format!("{start_sec:.6}")])
            .arg("-i")
            .arg(&source.source_path)
            .args([
                "-an",
                "-vf",
                &format!(
                    "fps={},scale={}:{},setsar=1",
                    fps.ffmpeg_arg(),
                    geometry.width,
                    geometry.height
                ),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(path = %source.source_path.display(), start_sec, "spawn video decoder");

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::render(format!(
                "failed to spawn '{}' for video decode (is it installed?): {e}",
                ffmpeg.display()
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::render("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr_drain = child.stderr.take().map(spawn_stderr_drain);

        Ok(Self {
            source_path: source.source_path.clone(),
            geometry,
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain,
            frame_len: geometry.rgba8_len(),
        })
    }

    fn finish(&mut self) -> ReelResult<()> {
        drop(self.stdout.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ReelError::render(format!("failed to wait for ffmpeg decoder: {e}")))?;
        let stderr = join_stderr(self.stderr_drain.take())?;
        if !status.success() {
            return Err(ReelError::render(format!(
                "ffmpeg video decode failed for '{}' ({status}): {}",
                self.source_path.display(),
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegFrameSource {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn next_frame(&mut self) -> ReelResult<Option<FrameRGBA>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut data = vec![0u8; self.frame_len];
        let got = read_full(stdout, &mut data).map_err(|e| {
            ReelError::render(format!(
                "failed to read decoded frame from '{}': {e}",
                self.source_path.display()
            ))
        })?;
        if got == self.frame_len {
            return Ok(Some(FrameRGBA {
                width: self.geometry.width,
                height: self.geometry.height,
                data,
                premultiplied: true,
            }));
        }

        self.finish()?;
        if got != 0 {
            return Err(ReelError::render(format!(
                "decoded video stream for '{}' ended mid-frame ({got} of {} bytes)",
                self.source_path.display(),
                self.frame_len
            )));
        }
        Ok(None)
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Read until `buf` is full or the reader hits EOF. Returns the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub(crate) fn spawn_stderr_drain(mut stderr: impl Read + Send + 'static) -> StderrDrain {
    std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok(stderr_bytes)
    })
}

pub(crate) fn join_stderr(handle: Option<StderrDrain>) -> ReelResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| ReelError::render("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| ReelError::render(format!("ffmpeg stderr read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

/// Decode the audio of `path` to interleaved `f32` PCM at `sample_rate` with `channels`.
///
/// Files without an audio stream decode to an empty buffer.
pub fn decode_audio_f32(
    ffmpeg: &Path,
    path: &Path,
    sample_rate: u32,
    channels: u16,
) -> ReelResult<AudioPcm> {
    let out = Command::new(ffmpeg)
        .args(["-v", "error", "-nostdin", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &channels.to_string(),
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            ReelError::render(format!(
                "failed to run '{}' for audio decode: {e}",
                ffmpeg.display()
            ))
        })?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::render(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: f32le_to_samples(&out.stdout)?,
    })
}

fn f32le_to_samples(bytes: &[u8]) -> ReelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
