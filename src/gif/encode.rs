//! GIF writing through the `gif` crate.

use alloc::borrow::Cow;
use alloc::vec::Vec;

use crate::anim::{AnimationFrame, AnimationSequence, Disposal};
use crate::error::RasterError;
use crate::quantize::Quantizer;
use crate::surface::Surface;

fn dimension(value: u32) -> Result<u16, RasterError> {
    u16::try_from(value).map_err(|_| {
        RasterError::UnsupportedFormat(alloc::format!("GIF dimension {value} exceeds 65535"))
    })
}

fn dispose_method(disposal: Disposal) -> ::gif::DisposalMethod {
    match disposal.gif_code() {
        2 => ::gif::DisposalMethod::Background,
        3 => ::gif::DisposalMethod::Previous,
        _ => ::gif::DisposalMethod::Keep,
    }
}

/// Write an indexed animation. Every part must already be indexed.
fn write_frames(seq: &AnimationSequence, single: bool) -> Result<Vec<u8>, RasterError> {
    let global = seq
        .global_palette
        .as_ref()
        .map(|p| p.to_rgb_bytes())
        .unwrap_or_default();
    let mut out = Vec::new();
    {
        let mut encoder = ::gif::Encoder::new(
            &mut out,
            dimension(seq.width)?,
            dimension(seq.height)?,
            &global,
        )?;
        // A single play needs no NETSCAPE2.0 block.
        if !single && seq.loop_count != 1 {
            encoder.set_repeat(match seq.loop_count {
                0 => ::gif::Repeat::Infinite,
                n => ::gif::Repeat::Finite(u16::try_from(n).unwrap_or(u16::MAX)),
            })?;
        }
        for (i, frame) in seq.frames.iter().enumerate() {
            let local = local_palette(seq, frame)?;
            log::trace!(
                "GIF write frame {i}: {:?} local palette {}",
                frame.region,
                local.is_some()
            );
            encoder.write_frame(&::gif::Frame {
                delay: u16::try_from(frame.delay_ms / 10).unwrap_or(u16::MAX),
                dispose: dispose_method(frame.disposal),
                transparent: frame.transparent,
                left: dimension(frame.region.x)?,
                top: dimension(frame.region.y)?,
                width: dimension(frame.region.width)?,
                height: dimension(frame.region.height)?,
                palette: local,
                buffer: Cow::Borrowed(frame.part.pixels()),
                ..::gif::Frame::default()
            })?;
        }
    }
    Ok(out)
}

/// Color table written with a frame: its own, or the part's palette when
/// the file has no global one.
fn local_palette(
    seq: &AnimationSequence,
    frame: &AnimationFrame,
) -> Result<Option<Vec<u8>>, RasterError> {
    if !frame.part.format().is_indexed() {
        return Err(RasterError::Encode("GIF frames must be indexed".into()));
    }
    if let Some(p) = &frame.palette {
        return Ok(Some(p.to_rgb_bytes()));
    }
    if seq.global_palette.is_some() {
        return Ok(None);
    }
    frame
        .part
        .palette()
        .map(|p| Some(p.to_rgb_bytes()))
        .ok_or_else(|| RasterError::Encode("GIF frame has no palette".into()))
}

/// Encode an animation, quantizing screens or full-color parts first.
pub(crate) fn encode_animation(
    seq: &AnimationSequence,
    quantizer: &Quantizer,
) -> Result<Vec<u8>, RasterError> {
    let frames = seq.to_gif_frames(quantizer)?;
    write_frames(&frames, false)
}

/// Encode a still image.
///
/// Indexed surfaces are written as they are with `transparent` as the key.
/// Other surfaces are quantized first; those with any transparency get a
/// dedicated transparent slot.
pub(crate) fn encode_still(
    surface: &Surface,
    transparent: Option<u8>,
    quantizer: &Quantizer,
) -> Result<Vec<u8>, RasterError> {
    let (indexed, key) = if surface.format().is_indexed() {
        (surface.clone(), transparent)
    } else if surface.is_opaque() {
        (quantizer.to_indexed(surface, 256)?, None)
    } else {
        let (s, key) = quantizer.to_indexed_keyed(surface)?;
        (s, Some(key))
    };
    let mut seq = AnimationSequence::new(indexed.width(), indexed.height());
    seq.global_palette = indexed.palette().cloned();
    seq.push(AnimationFrame::new(indexed).with_transparent(key).with_delay(0));
    write_frames(&seq, true)
}
