//! PNG and APNG writing through the `png` crate.

use alloc::vec;
use alloc::vec::Vec;

use crate::anim::{AnimationSequence, Blend, Disposal};
use crate::composite::Compositor;
use crate::error::RasterError;
use crate::pixel::PixelFormat;
use crate::surface::{Region, Surface};

fn pixel_dims(dpi: f32) -> Option<::png::PixelDimensions> {
    if dpi <= 0.0 {
        return None;
    }
    let ppm = (f64::from(dpi) * 100.0 / 2.54 + 0.5) as u32;
    Some(::png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: ::png::Unit::Meter,
    })
}

/// Encode a still PNG. Indexed surfaces write PLTE, plus tRNS for the key.
pub(crate) fn encode_still(
    surface: &Surface,
    dpi: f32,
    transparent: Option<u8>,
) -> Result<Vec<u8>, RasterError> {
    let mut out = Vec::new();
    {
        let mut encoder = ::png::Encoder::new(&mut out, surface.width(), surface.height());
        encoder.set_depth(::png::BitDepth::Eight);
        match surface.format() {
            PixelFormat::Indexed8 => {
                encoder.set_color(::png::ColorType::Indexed);
                let palette = surface.palette().cloned().unwrap_or_default();
                encoder.set_palette(palette.to_rgb_bytes());
                if let Some(key) = transparent {
                    let mut trns = vec![0xFFu8; usize::from(key) + 1];
                    trns[usize::from(key)] = 0;
                    encoder.set_trns(trns);
                }
            }
            PixelFormat::Rgb24 => encoder.set_color(::png::ColorType::Rgb),
            PixelFormat::Rgba32 => encoder.set_color(::png::ColorType::Rgba),
        }
        encoder.set_pixel_dims(pixel_dims(dpi));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(surface.pixels())?;
        writer.finish()?;
    }
    Ok(out)
}

fn dispose_op(disposal: Disposal) -> ::png::DisposeOp {
    match disposal {
        Disposal::None => ::png::DisposeOp::None,
        Disposal::Background => ::png::DisposeOp::Background,
        Disposal::RestoreToPrevious => ::png::DisposeOp::Previous,
    }
}

fn blend_op(blend: Blend) -> ::png::BlendOp {
    match blend {
        Blend::Source => ::png::BlendOp::Source,
        Blend::Over => ::png::BlendOp::Over,
    }
}

struct FrameOut {
    region: Region,
    disposal: Disposal,
    blend: Blend,
    delay_ms: u32,
    rgba: Surface,
}

/// Encode an APNG.
///
/// With screens on every frame, each screen is written as a full-canvas
/// frame with blend `Source`. Otherwise parts are written at their
/// regions. When the first written frame does not cover the canvas and
/// there is no default image, the first frame on a transparent canvas is
/// written as the default image.
pub(crate) fn encode_animation(seq: &AnimationSequence) -> Result<Vec<u8>, RasterError> {
    seq.validate()?;
    let use_screens = seq.has_screens();
    let full = Region::full(seq.width, seq.height);

    let mut frames = Vec::with_capacity(seq.frames.len());
    for (i, frame) in seq.frames.iter().enumerate() {
        let (region, blend, rgba) = match (&frame.screen, use_screens) {
            (Some(screen), true) => (full, Blend::Source, screen.to_rgba32()?),
            _ => (
                frame.region,
                frame.blend,
                seq.resolved_part(i)?.to_rgba32_keyed(frame.transparent)?,
            ),
        };
        frames.push(FrameOut {
            region,
            disposal: frame.disposal,
            blend,
            delay_ms: frame.delay_ms,
            rgba,
        });
    }

    let mut default = match &seq.default_image {
        Some(image) => Some(image.to_rgba32()?),
        None => None,
    };
    if default.is_none() && frames.first().is_some_and(|f| f.region != full) {
        let mut canvas = Surface::transparent(seq.width, seq.height)?;
        if let Some(first) = frames.first() {
            let (x, y) = (first.region.x as i32, first.region.y as i32);
            Compositor::new().copy(&mut canvas, x, y, &first.rgba, None)?;
        }
        default = Some(canvas);
    }

    let num_frames = u32::try_from(frames.len())
        .map_err(|_| RasterError::Encode("too many APNG frames".into()))?;
    let mut out = Vec::new();
    {
        let mut encoder = ::png::Encoder::new(&mut out, seq.width, seq.height);
        encoder.set_color(::png::ColorType::Rgba);
        encoder.set_depth(::png::BitDepth::Eight);
        encoder.set_animated(num_frames, seq.loop_count)?;
        if default.is_some() {
            encoder.set_sep_def_img(true)?;
        }
        let mut writer = encoder.write_header()?;
        if let Some(image) = &default {
            writer.write_image_data(image.pixels())?;
        }
        for (i, frame) in frames.iter().enumerate() {
            log::trace!("APNG write frame {i}: {:?} {:?}", frame.region, frame.blend);
            writer.set_frame_delay(u16::try_from(frame.delay_ms).unwrap_or(u16::MAX), 1000)?;
            writer.set_dispose_op(dispose_op(frame.disposal))?;
            writer.set_blend_op(blend_op(frame.blend))?;
            // Reset the offset so the new size is checked against the origin.
            writer.set_frame_position(0, 0)?;
            writer.set_frame_dimension(frame.region.width, frame.region.height)?;
            writer.set_frame_position(frame.region.x, frame.region.y)?;
            writer.write_image_data(frame.rgba.pixels())?;
        }
        writer.finish()?;
    }
    Ok(out)
}
