use std::path::Path;

use anyhow::Context as _;

use crate::{MergeResult, PixelArray, encode::ensure_parent_dir};

/// Extensions (lowercase, no dot) treated as data images.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["tif", "tiff", "png", "jpg", "jpeg"];

/// Return `true` when `path` carries a recognized image extension (case-insensitive).
pub fn is_recognized_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Load an image file and convert it to 8-bit RGB.
///
/// Grayscale and 16-bit TIFFs are converted by the `image` crate; alpha is dropped.
pub fn load_image(path: &Path) -> MergeResult<PixelArray> {
    let dyn_img =
        image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(PixelArray::from_rgb_image(dyn_img.to_rgb8()))
}

/// Write `pixels` as a PNG at `path`, creating the parent directory if needed.
pub fn save_png(pixels: &PixelArray, path: &Path) -> MergeResult<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &pixels.data,
        pixels.width,
        pixels.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
