//! Strip and grid composition over a white canvas.
//!
//! Images are placed at native resolution, top-left aligned in their slot. Slots larger than the
//! image keep the background fill.

use crate::{GridShape, MergeError, MergeResult, PixelArray};

/// Policy bounds for [`stitch_horizontal`].
pub const MIN_STRIP_IMAGES: usize = 2;
/// Policy bounds for [`stitch_horizontal`].
pub const MAX_STRIP_IMAGES: usize = 10;

/// Place `images` left to right on one canvas.
///
/// The canvas is `sum(widths) × max(heights)`. Requires between [`MIN_STRIP_IMAGES`] and
/// [`MAX_STRIP_IMAGES`] inputs.
pub fn stitch_horizontal(images: &[PixelArray]) -> MergeResult<PixelArray> {
    if !(MIN_STRIP_IMAGES..=MAX_STRIP_IMAGES).contains(&images.len()) {
        return Err(MergeError::validation(format!(
            "horizontal stitch takes {MIN_STRIP_IMAGES}..={MAX_STRIP_IMAGES} images, got {}",
            images.len()
        )));
    }
    Ok(compose_strip(images))
}

/// Tile `images` row-major into a `shape.columns × shape.rows` grid.
///
/// Returns `None` (and allocates nothing) when `images.len()` differs from
/// `shape.cell_count()`. Each row is stitched as a strip; strips are stacked top to bottom on a
/// `max(strip widths) × sum(strip heights)` canvas.
pub fn stitch_grid(images: &[PixelArray], shape: GridShape) -> Option<PixelArray> {
    if shape.cell_count() == 0 || images.len() != shape.cell_count() {
        return None;
    }

    let strips: Vec<PixelArray> = images
        .chunks(shape.columns as usize)
        .map(compose_strip)
        .collect();

    Some(compose_column(&strips))
}

// Unchecked strip placement shared by both public entry points.
fn compose_strip(images: &[PixelArray]) -> PixelArray {
    let width: u32 = images.iter().map(|img| img.width).sum();
    let height = images.iter().map(|img| img.height).max().unwrap_or(0);

    let mut canvas = PixelArray::white(width, height);
    let mut x = 0;
    for img in images {
        canvas.blit(img, x, 0);
        x += img.width;
    }
    canvas
}

fn compose_column(strips: &[PixelArray]) -> PixelArray {
    let width = strips.iter().map(|s| s.width).max().unwrap_or(0);
    let height: u32 = strips.iter().map(|s| s.height).sum();

    let mut canvas = PixelArray::white(width, height);
    let mut y = 0;
    for strip in strips {
        canvas.blit(strip, 0, y);
        y += strip.height;
    }
    canvas
}

#[cfg(test)]
#[path = "../tests/unit/compose.rs"]
mod tests;
