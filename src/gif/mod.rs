//! GIF and animated GIF.
//!
//! Frames are read and written as indexed parts; the animation model
//! handles compositing. Disposal codes 0 and 1 both read as
//! [`Disposal::None`](crate::Disposal::None), which is written back as 1.

mod decode;
mod encode;

use alloc::vec::Vec;

use crate::anim::AnimationSequence;
use crate::decode::Image;
use crate::error::RasterError;
use crate::limits::Limits;
use crate::quantize::Quantizer;
use crate::surface::Surface;

pub(crate) fn decode_animation(
    data: &[u8],
    limits: Option<&Limits>,
) -> Result<AnimationSequence, RasterError> {
    decode::decode_frames(data, limits)
}

/// The first frame as an indexed still with its transparency key.
pub(crate) fn decode_still(seq: &AnimationSequence) -> Result<Image, RasterError> {
    let (surface, transparent) = decode::first_frame(seq)?;
    Ok(Image::new(surface).with_transparent(transparent))
}

pub(crate) fn encode_animation(
    seq: &AnimationSequence,
    quantizer: &Quantizer,
) -> Result<Vec<u8>, RasterError> {
    encode::encode_animation(seq, quantizer)
}

pub(crate) fn encode_still(
    surface: &Surface,
    transparent: Option<u8>,
    quantizer: &Quantizer,
) -> Result<Vec<u8>, RasterError> {
    encode::encode_still(surface, transparent, quantizer)
}
