use crate::foundation::error::{MergeError, MergeResult};

/// Background used for every canvas the compositor and the video encoder allocate.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Dense 8-bit RGB pixel grid, row-major, tightly packed (`height × width × 3`).
///
/// Composition never mutates its inputs; every stitched result is a freshly allocated array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelArray {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGB8 samples, `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl PixelArray {
    /// Number of samples per pixel.
    pub const CHANNELS: usize = 3;

    /// Allocate a `width × height` array filled with `rgb`.
    pub fn new_filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * Self::CHANNELS);
        for _ in 0..len {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Allocate a white `width × height` array.
    pub fn white(width: u32, height: u32) -> Self {
        Self::new_filled(width, height, WHITE)
    }

    /// Take ownership of an `image` RGB buffer.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    /// Convert into an `image` RGB buffer for encoding.
    pub fn into_rgb_image(self) -> MergeResult<image::RgbImage> {
        let (width, height) = (self.width, self.height);
        image::RgbImage::from_raw(width, height, self.data).ok_or_else(|| {
            MergeError::validation(format!(
                "pixel buffer does not hold a {width}x{height} RGB image"
            ))
        })
    }

    /// Sample the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Copy `src` into `self` with its top-left corner at `(x, y)`.
    ///
    /// Parts of `src` falling outside `self` are clipped; no scaling is performed.
    pub fn blit(&mut self, src: &PixelArray, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let copy_w = src.width.min(self.width - x) as usize;
        let copy_h = src.height.min(self.height - y) as usize;
        let dst_stride = self.width as usize * Self::CHANNELS;
        let src_stride = src.width as usize * Self::CHANNELS;
        let row_bytes = copy_w * Self::CHANNELS;

        for row in 0..copy_h {
            let d = (y as usize + row) * dst_stride + x as usize * Self::CHANNELS;
            let s = row * src_stride;
            self.data[d..d + row_bytes].copy_from_slice(&src.data[s..s + row_bytes]);
        }
    }
}

/// Grid dimensions used by grid mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridShape {
    /// Number of images per row.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
}

impl GridShape {
    /// Create a validated grid shape.
    pub fn new(columns: u32, rows: u32) -> MergeResult<Self> {
        let shape = Self { columns, rows };
        shape.validate()?;
        Ok(shape)
    }

    /// Reject zero-sized grids.
    pub fn validate(&self) -> MergeResult<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(MergeError::validation(format!(
                "grid dimensions must be non-zero, got {}x{}",
                self.columns, self.rows
            )));
        }
        Ok(())
    }

    /// Number of images a complete grid holds.
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 2,
        }
    }
}

/// Container used for stack-mode animations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationFormat {
    /// Looping animated GIF.
    #[default]
    Gif,
    /// Fixed-framerate MP4 (requires `ffmpeg` on `PATH`).
    Mp4,
}

impl AnimationFormat {
    /// Map the CLI's GIF flag to a format.
    pub fn from_gif_flag(gif: bool) -> Self {
        if gif { Self::Gif } else { Self::Mp4 }
    }

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
