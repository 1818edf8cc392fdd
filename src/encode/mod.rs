//! Animation encoders for stack mode.
//!
//! GIFs are written in-process through the `image` crate; MP4s are streamed to the system
//! `ffmpeg` binary.

use std::path::Path;

use crate::{AnimationFormat, MergeResult, PixelArray};

/// `ffmpeg`-based MP4 writer.
pub mod ffmpeg;
/// Looping GIF writer.
pub mod gif;

/// Write `frames` to `out_path` in `format`.
///
/// For [`AnimationFormat::Gif`], `framerate` is used directly as the per-frame delay in
/// milliseconds, raised to [`gif::MIN_GIF_DELAY_MS`] when smaller. For [`AnimationFormat::Mp4`]
/// it is the output frames per second.
pub fn encode_animation(
    frames: &[PixelArray],
    format: AnimationFormat,
    framerate: u32,
    out_path: &Path,
) -> MergeResult<()> {
    match format {
        AnimationFormat::Gif => gif::encode_gif(frames, framerate, out_path),
        AnimationFormat::Mp4 => ffmpeg::encode_video(frames, framerate, out_path),
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MergeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}
