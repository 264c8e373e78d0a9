//! Local input selection: a random clip from a folder, caption text files, output naming.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Extensions accepted as stock video clips.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv"];

/// Video files directly inside `dir`, sorted by path.
pub fn list_videos(dir: &Path) -> ReelResult<Vec<PathBuf>> {
    let rd = std::fs::read_dir(dir).map_err(|e| {
        ReelError::input_missing(format!("cannot read video folder '{}': {e}", dir.display()))
    })?;
    let mut out: Vec<PathBuf> = rd
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_video_extension(p))
        .collect();
    out.sort();
    Ok(out)
}

/// Pick one video from `dir` uniformly at random.
pub fn pick_video<R: Rng + ?Sized>(dir: &Path, rng: &mut R) -> ReelResult<PathBuf> {
    let videos = list_videos(dir)?;
    let picked = videos.choose(rng).cloned().ok_or_else(|| {
        ReelError::input_missing(format!(
            "no {} files in '{}'",
            VIDEO_EXTENSIONS.join("/"),
            dir.display()
        ))
    })?;
    tracing::info!(path = %picked.display(), candidates = videos.len(), "picked video");
    Ok(picked)
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            let e = e.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&e.as_str())
        })
}

/// Read caption text from a UTF-8 file.
pub fn read_caption_text(path: &Path) -> ReelResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ReelError::input_missing(format!("cannot read caption text '{}': {e}", path.display()))
    })
}

/// `<stem>_final.mp4` next to `text_file`.
pub fn default_output_for(text_file: &Path) -> PathBuf {
    let stem = text_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reel".to_string());
    text_file.with_file_name(format!("{stem}_final.mp4"))
}
