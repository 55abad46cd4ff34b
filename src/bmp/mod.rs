//! Minimal BMP reader and writer (8, 24 and 32 bits per pixel).

mod decode;
mod encode;

use alloc::vec::Vec;

use crate::decode::Image;
use crate::error::RasterError;
use crate::limits::Limits;
use crate::surface::Surface;

/// Decode BMP data. Resolution comes back in dpi.
pub(crate) fn decode(data: &[u8], limits: Option<&Limits>) -> Result<Image, RasterError> {
    let (surface, dpi) = decode::decode_bmp(data, limits)?;
    Ok(Image::new(surface).with_dpi(dpi))
}

/// Encode to BMP, writing `dpi` as pixels per meter.
pub(crate) fn encode(surface: &Surface, dpi: f32) -> Result<Vec<u8>, RasterError> {
    encode::encode_bmp(surface, dpi)
}
