/// Decoding source images into [`crate::PixelArray`] and writing PNG composites.
pub(crate) mod decode;
