//! PNG and APNG reading through the `png` crate.

use alloc::vec;
use alloc::vec::Vec;
use std::io::Cursor;

use crate::anim::{AnimationFrame, AnimationSequence, Blend, Disposal};
use crate::error::RasterError;
use crate::limits::Limits;
use crate::pixel::PixelFormat;
use crate::surface::{Region, Surface};

type Reader<'a> = ::png::Reader<Cursor<&'a [u8]>>;

fn open<'a>(data: &'a [u8], limits: Option<&Limits>) -> Result<Reader<'a>, RasterError> {
    let mut decoder = ::png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(::png::Transformations::EXPAND | ::png::Transformations::STRIP_16);
    let reader = decoder.read_info()?;
    let info = reader.info();
    if let Some(limits) = limits {
        limits.check_image(info.width, info.height, 4)?;
        if let Some(actl) = info.animation_control {
            limits.check_frames(actl.num_frames as usize)?;
        }
    }
    log::debug!(
        "PNG {}x{} {:?} {:?}, animated: {}",
        info.width,
        info.height,
        info.color_type,
        info.bit_depth,
        info.animation_control.is_some()
    );
    Ok(reader)
}

/// Resolution from pHYs in dots per inch, 0 when absent or unitless.
fn dpi(reader: &Reader<'_>) -> f32 {
    match reader.info().pixel_dims {
        Some(::png::PixelDimensions {
            xppu,
            unit: ::png::Unit::Meter,
            ..
        }) => (f64::from(xppu) * 2.54 / 100.0) as f32,
        _ => 0.0,
    }
}

/// Whether the decoded PNG carries an animation control chunk.
pub(crate) fn is_animated(data: &[u8]) -> Result<bool, RasterError> {
    Ok(open(data, None)?.info().animation_control.is_some())
}

/// Read the next frame and widen it to RGB or RGBA.
///
/// Gray becomes RGB, gray+alpha becomes RGBA.
fn next_surface(
    reader: &mut Reader<'_>,
    buf: &mut [u8],
    force_alpha: bool,
) -> Result<Surface, RasterError> {
    let out = reader.next_frame(buf)?;
    let bytes = &buf[..out.buffer_size()];
    let (w, h) = (out.width, out.height);
    let has_alpha = matches!(
        out.color_type,
        ::png::ColorType::Rgba | ::png::ColorType::GrayscaleAlpha
    );
    let format = if has_alpha || force_alpha {
        PixelFormat::Rgba32
    } else {
        PixelFormat::Rgb24
    };
    let channels = out.color_type.samples();
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(w as usize * h as usize * format.bytes_per_pixel())?;
    for row in bytes.chunks_exact(out.line_size).take(h as usize) {
        for px in row[..w as usize * channels].chunks_exact(channels) {
            let (r, g, b, a) = match out.color_type {
                ::png::ColorType::Grayscale => (px[0], px[0], px[0], 255),
                ::png::ColorType::GrayscaleAlpha => (px[0], px[0], px[0], px[1]),
                ::png::ColorType::Rgb => (px[0], px[1], px[2], 255),
                ::png::ColorType::Rgba => (px[0], px[1], px[2], px[3]),
                ::png::ColorType::Indexed => {
                    return Err(RasterError::Decode("PNG palette was not expanded".into()));
                }
            };
            match format {
                PixelFormat::Rgba32 => pixels.extend_from_slice(&[r, g, b, a]),
                _ => pixels.extend_from_slice(&[r, g, b]),
            }
        }
    }
    Surface::from_pixels(w, h, format, pixels, None)
}

/// Decode the still image: the IDAT image, whether or not it is part of an
/// animation. Returns the surface and its dpi.
pub(crate) fn decode_still(
    data: &[u8],
    limits: Option<&Limits>,
) -> Result<(Surface, f32), RasterError> {
    let mut reader = open(data, limits)?;
    let dpi = dpi(&reader);
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let surface = next_surface(&mut reader, &mut buf, false)?;
    Ok((surface, dpi))
}

/// Decode every APNG frame as an RGBA part. Screens are not reconstructed.
///
/// An IDAT image with no fcTL of its own becomes `default_image`.
pub(crate) fn decode_frames(
    data: &[u8],
    limits: Option<&Limits>,
) -> Result<AnimationSequence, RasterError> {
    let mut reader = open(data, limits)?;
    let info = reader.info();
    let actl = info
        .animation_control
        .ok_or_else(|| RasterError::Decode("PNG has no acTL chunk".into()))?;
    let separate_default = info.frame_control.is_none();
    let mut seq = AnimationSequence::new(info.width, info.height);
    seq.loop_count = actl.num_plays;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    if separate_default {
        seq.default_image = Some(next_surface(&mut reader, &mut buf, true)?);
    }

    for i in 0..actl.num_frames {
        let part = next_surface(&mut reader, &mut buf, true)?;
        let fc = reader
            .info()
            .frame_control
            .ok_or_else(|| RasterError::Decode(alloc::format!("APNG frame {i} has no fcTL")))?;
        let den = if fc.delay_den == 0 { 100 } else { u32::from(fc.delay_den) };
        let delay_ms = u32::from(fc.delay_num) * 1000 / den;
        log::trace!(
            "APNG frame {i}: {}x{}+{}+{} {delay_ms} ms {:?} {:?}",
            fc.width,
            fc.height,
            fc.x_offset,
            fc.y_offset,
            fc.dispose_op,
            fc.blend_op
        );
        seq.push(AnimationFrame {
            region: Region::new(fc.x_offset, fc.y_offset, fc.width, fc.height),
            disposal: match fc.dispose_op {
                ::png::DisposeOp::None => Disposal::None,
                ::png::DisposeOp::Background => Disposal::Background,
                ::png::DisposeOp::Previous => Disposal::RestoreToPrevious,
            },
            blend: match fc.blend_op {
                ::png::BlendOp::Source => Blend::Source,
                ::png::BlendOp::Over => Blend::Over,
            },
            delay_ms,
            palette: None,
            transparent: None,
            part,
            screen: None,
        });
    }

    seq.validate()
        .map_err(|e| RasterError::Decode(alloc::format!("APNG: {e}")))?;
    Ok(seq)
}
