use std::{fs::File, io::BufWriter, path::Path};

use anyhow::Context as _;
use image::{
    Delay, Frame, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};

use crate::{MergeError, MergeResult, PixelArray, encode::ensure_parent_dir};

/// Shortest frame delay a GIF can carry; the format counts in hundredths of a second.
pub const MIN_GIF_DELAY_MS: u32 = 10;

/// Write `frames` as an infinitely looping GIF, each frame shown for `frame_delay_ms`.
///
/// Delays below [`MIN_GIF_DELAY_MS`] are raised to it with a warning.
///
/// The GIF canvas is the largest width and height across `frames`. Smaller frames are placed
/// top-left on white; nothing is resized.
pub fn encode_gif(frames: &[PixelArray], frame_delay_ms: u32, out_path: &Path) -> MergeResult<()> {
    if frames.is_empty() {
        return Err(MergeError::validation("gif needs at least one frame"));
    }

    ensure_parent_dir(out_path)?;
    let file = File::create(out_path)
        .with_context(|| format!("create gif '{}'", out_path.display()))?;

    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| MergeError::encode(format!("failed to set gif repeat: {e}")))?;

    let width = frames.iter().map(|f| f.width).max().unwrap_or(0);
    let height = frames.iter().map(|f| f.height).max().unwrap_or(0);
    if frame_delay_ms < MIN_GIF_DELAY_MS {
        tracing::warn!(
            requested_ms = frame_delay_ms,
            used_ms = MIN_GIF_DELAY_MS,
            "gif frame delay below format resolution, clamping"
        );
    }
    let delay = Delay::from_numer_denom_ms(frame_delay_ms.max(MIN_GIF_DELAY_MS), 1);
    for (i, px) in frames.iter().enumerate() {
        let rgba = if (px.width, px.height) == (width, height) {
            to_rgba(px)?
        } else {
            let mut canvas = PixelArray::white(width, height);
            canvas.blit(px, 0, 0);
            to_rgba(&canvas)?
        };
        let frame = Frame::from_parts(rgba, 0, 0, delay);
        encoder.encode_frame(frame).map_err(|e| {
            MergeError::encode(format!(
                "failed to encode gif frame {i} into '{}': {e}",
                out_path.display()
            ))
        })?;
    }

    Ok(())
}

fn to_rgba(px: &PixelArray) -> MergeResult<RgbaImage> {
    let mut rgba = Vec::with_capacity(px.data.len() / PixelArray::CHANNELS * 4);
    for rgb in px.data.chunks_exact(PixelArray::CHANNELS) {
        rgba.extend_from_slice(rgb);
        rgba.push(255);
    }
    RgbaImage::from_raw(px.width, px.height, rgba)
        .ok_or_else(|| MergeError::validation("gif frame buffer does not match its dimensions"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
