//! TIFF via the `tiff` crate, 8-bit gray, RGB and RGBA.

use alloc::vec::Vec;
use std::io::Cursor;

use ::tiff::decoder::{Decoder, DecodingResult};
use ::tiff::encoder::{Rational, TiffEncoder, colortype};
use ::tiff::tags::{ResolutionUnit, Tag};
use ::tiff::{ColorType, TiffError};

use crate::decode::Image;
use crate::error::RasterError;
use crate::limits::Limits;
use crate::pixel::PixelFormat;
use crate::surface::Surface;

/// TIFF resolution unit codes.
const UNIT_INCH: u32 = 2;
const UNIT_CM: u32 = 3;

fn encode_error(e: TiffError) -> RasterError {
    RasterError::Encode(alloc::format!("tiff: {e}"))
}

fn resolution(decoder: &mut Decoder<Cursor<&[u8]>>) -> Result<f32, RasterError> {
    let x = match decoder.find_tag(Tag::XResolution)? {
        Some(::tiff::decoder::ifd::Value::Rational(n, d)) if d != 0 => f64::from(n) / f64::from(d),
        _ => return Ok(0.0),
    };
    let unit = decoder
        .find_tag(Tag::ResolutionUnit)?
        .and_then(|v| v.into_u32().ok())
        .unwrap_or(UNIT_INCH);
    Ok(match unit {
        UNIT_INCH => x as f32,
        UNIT_CM => (x * 2.54) as f32,
        _ => 0.0,
    })
}

pub(crate) fn decode(data: &[u8], limits: Option<&Limits>) -> Result<Image, RasterError> {
    let mut decoder = Decoder::new(Cursor::new(data))?;
    let (width, height) = decoder.dimensions()?;
    if let Some(limits) = limits {
        limits.check_image(width, height, 4)?;
    }
    let color = decoder.colortype()?;
    let dpi = resolution(&mut decoder)?;
    log::debug!("TIFF {width}x{height} {color:?}, {dpi} dpi");

    let DecodingResult::U8(samples) = decoder.read_image()? else {
        return Err(RasterError::UnsupportedFormat(alloc::format!(
            "TIFF sample type for {color:?}"
        )));
    };
    let (format, pixels) = match color {
        ColorType::Gray(8) => (
            PixelFormat::Rgb24,
            samples.iter().flat_map(|&v| [v, v, v]).collect(),
        ),
        ColorType::GrayA(8) => (
            PixelFormat::Rgba32,
            samples
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
        ),
        ColorType::RGB(8) => (PixelFormat::Rgb24, samples),
        ColorType::RGBA(8) => (PixelFormat::Rgba32, samples),
        other => {
            return Err(RasterError::UnsupportedFormat(alloc::format!(
                "TIFF color type {other:?}"
            )));
        }
    };
    let surface = Surface::from_pixels(width, height, format, pixels, None)?;
    Ok(Image::new(surface).with_dpi(dpi))
}

/// Encode RGB or RGBA; indexed surfaces are expanded to RGB.
pub(crate) fn encode(surface: &Surface, dpi: f32) -> Result<Vec<u8>, RasterError> {
    let surface = match surface.format() {
        PixelFormat::Indexed8 => surface.to_rgb24()?,
        _ => surface.clone(),
    };
    let (w, h) = (surface.width(), surface.height());
    let res = Rational {
        n: (f64::from(dpi) * 100.0 + 0.5) as u32,
        d: 100,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).map_err(encode_error)?;
        match surface.format() {
            PixelFormat::Rgba32 => {
                let mut image = encoder.new_image::<colortype::RGBA8>(w, h).map_err(encode_error)?;
                if dpi > 0.0 {
                    image.resolution(ResolutionUnit::Inch, res);
                }
                image.write_data(surface.pixels()).map_err(encode_error)?;
            }
            _ => {
                let mut image = encoder.new_image::<colortype::RGB8>(w, h).map_err(encode_error)?;
                if dpi > 0.0 {
                    image.resolution(ResolutionUnit::Inch, res);
                }
                image.write_data(surface.pixels()).map_err(encode_error)?;
            }
        }
    }
    Ok(cursor.into_inner())
}
