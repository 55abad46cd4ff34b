//! PNG and APNG.
//!
//! Stills decode to RGB or RGBA (gray is widened, 16-bit is stripped).
//! APNG frames decode to RGBA parts; dispose and blend ops map one to one
//! onto [`Disposal`](crate::Disposal) and [`Blend`](crate::Blend).

mod decode;
mod encode;

use alloc::vec::Vec;

use crate::anim::AnimationSequence;
use crate::decode::Image;
use crate::error::RasterError;
use crate::limits::Limits;
use crate::surface::Surface;

pub(crate) use decode::is_animated;

pub(crate) fn decode(data: &[u8], limits: Option<&Limits>) -> Result<Image, RasterError> {
    let (surface, dpi) = decode::decode_still(data, limits)?;
    Ok(Image::new(surface).with_dpi(dpi))
}

pub(crate) fn decode_animation(
    data: &[u8],
    limits: Option<&Limits>,
) -> Result<AnimationSequence, RasterError> {
    decode::decode_frames(data, limits)
}

pub(crate) fn encode(
    surface: &Surface,
    dpi: f32,
    transparent: Option<u8>,
) -> Result<Vec<u8>, RasterError> {
    encode::encode_still(surface, dpi, transparent)
}

pub(crate) fn encode_animation(seq: &AnimationSequence) -> Result<Vec<u8>, RasterError> {
    encode::encode_animation(seq)
}
