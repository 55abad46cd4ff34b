//! GIF reading through the `gif` crate, indexed output only.

use std::io::Cursor;

use crate::anim::{AnimationFrame, AnimationSequence, Blend, Disposal};
use crate::error::RasterError;
use crate::limits::Limits;
use crate::palette::Palette;
use crate::pixel::PixelFormat;
use crate::surface::{Region, Surface};

/// Every frame as an indexed part carrying the palette it decodes with.
///
/// Screens are not reconstructed here.
pub(crate) fn decode_frames(
    data: &[u8],
    limits: Option<&Limits>,
) -> Result<AnimationSequence, RasterError> {
    let mut options = ::gif::DecodeOptions::new();
    options.set_color_output(::gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(Cursor::new(data))?;

    let (width, height) = (u32::from(decoder.width()), u32::from(decoder.height()));
    if let Some(limits) = limits {
        limits.check_image(width, height, 4)?;
    }

    let mut seq = AnimationSequence::new(width, height);
    seq.global_palette = decoder.global_palette().map(Palette::from_rgb_bytes);
    seq.background_index = decoder.bg_color().and_then(|i| u8::try_from(i).ok());
    // `Finite(0)` is what the decoder reports without a NETSCAPE2.0 block;
    // a stored count of 0 comes back as `Infinite`.
    seq.loop_count = match decoder.repeat() {
        ::gif::Repeat::Infinite => 0,
        ::gif::Repeat::Finite(0) => 1,
        ::gif::Repeat::Finite(n) => u32::from(n),
    };
    log::debug!(
        "GIF {width}x{height}, global palette {:?} colors, background {:?}, loop {}",
        seq.global_palette.as_ref().map(Palette::len),
        seq.background_index,
        seq.loop_count
    );

    while let Some(frame) = decoder.read_next_frame()? {
        if let Some(limits) = limits {
            limits.check_frames(seq.frames.len() + 1)?;
        }
        let local = frame.palette.as_deref().map(Palette::from_rgb_bytes);
        let palette = local
            .clone()
            .or_else(|| seq.global_palette.clone())
            .ok_or_else(|| {
                RasterError::Decode(alloc::format!(
                    "GIF frame {} has no color table",
                    seq.frames.len()
                ))
            })?;
        let region = Region::new(
            u32::from(frame.left),
            u32::from(frame.top),
            u32::from(frame.width),
            u32::from(frame.height),
        );
        let part = Surface::from_pixels(
            region.width,
            region.height,
            PixelFormat::Indexed8,
            frame.buffer.to_vec(),
            Some(palette),
        )?;
        log::trace!(
            "GIF frame {}: {region:?} delay {}cs dispose {:?} transparent {:?}",
            seq.frames.len(),
            frame.delay,
            frame.dispose,
            frame.transparent
        );
        seq.push(AnimationFrame {
            region,
            disposal: Disposal::from_gif_code(frame.dispose as u8),
            blend: Blend::Over,
            delay_ms: u32::from(frame.delay) * 10,
            palette: local,
            transparent: frame.transparent,
            part,
            screen: None,
        });
    }

    seq.validate()
        .map_err(|e| RasterError::Decode(alloc::format!("GIF: {e}")))?;
    Ok(seq)
}

/// First frame on the full canvas, indexed, with its transparency key.
///
/// Canvas area the frame does not cover takes the key, or the background
/// index when there is none.
pub(crate) fn first_frame(seq: &AnimationSequence) -> Result<(Surface, Option<u8>), RasterError> {
    let frame = seq
        .frames
        .first()
        .ok_or_else(|| RasterError::Decode("GIF has no frames".into()))?;
    if frame.region == Region::full(seq.width, seq.height) {
        return Ok((frame.part.clone(), frame.transparent));
    }
    let palette = frame.part.palette().cloned().unwrap_or_default();
    let fill = frame.transparent.or(seq.background_index).unwrap_or(0);
    let mut canvas = Surface::solid_indexed(seq.width, seq.height, palette, fill)?;
    let w = frame.region.width as usize;
    let x = frame.region.x as usize;
    for y in 0..frame.region.height {
        canvas.row_mut(frame.region.y + y)[x..x + w].copy_from_slice(frame.part.row(y));
    }
    Ok((canvas, frame.transparent))
}
