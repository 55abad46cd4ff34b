//! JPEG via `zune-jpeg` (decode) and `jpeg-encoder` (encode).

use alloc::vec::Vec;

use crate::decode::Image;
use crate::error::RasterError;
use crate::limits::Limits;
use crate::pixel::PixelFormat;
use crate::surface::Surface;

/// JFIF density units.
const DENSITY_INCH: u8 = 1;
const DENSITY_CM: u8 = 2;

/// Density unit and horizontal density from the JFIF APP0 segment.
///
/// Walks marker segments from SOI up to the first scan.
fn jfif_density(data: &[u8]) -> Option<(u8, u16)> {
    if data.get(..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut pos = 2;
    loop {
        let marker = data.get(pos..pos + 2)?;
        if marker[0] != 0xFF || marker[1] == 0xDA {
            return None;
        }
        let len = usize::from(u16::from_be_bytes([*data.get(pos + 2)?, *data.get(pos + 3)?]));
        let segment = data.get(pos + 4..pos + 2 + len)?;
        if marker[1] == 0xE0 && segment.len() >= 10 && segment.starts_with(b"JFIF\0") {
            return Some((segment[7], u16::from_be_bytes([segment[8], segment[9]])));
        }
        pos += 2 + len;
    }
}

/// Decode to an RGB surface; grayscale files are widened.
pub(crate) fn decode(data: &[u8], limits: Option<&Limits>) -> Result<Image, RasterError> {
    let mut decoder = zune_jpeg::JpegDecoder::new(data);
    decoder.decode_headers()?;
    let info = decoder
        .info()
        .ok_or_else(|| RasterError::Decode("JPEG headers unavailable".into()))?;
    let (width, height) = (u32::from(info.width), u32::from(info.height));
    if let Some(limits) = limits {
        limits.check_image(width, height, 3)?;
    }

    let decoded = decoder.decode()?;
    let count = width as usize * height as usize;
    if count == 0 || decoded.len() % count != 0 {
        return Err(RasterError::Decode(alloc::format!(
            "JPEG produced {} bytes for {width}x{height}",
            decoded.len()
        )));
    }
    let pixels: Vec<u8> = match decoded.len() / count {
        1 => decoded.iter().flat_map(|&v| [v, v, v]).collect(),
        3 => decoded,
        4 => decoded.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect(),
        n => {
            return Err(RasterError::UnsupportedFormat(alloc::format!(
                "JPEG with {n} output channels"
            )));
        }
    };

    let dpi = match jfif_density(data) {
        Some((DENSITY_INCH, x)) => f32::from(x),
        Some((DENSITY_CM, x)) => f32::from(x) * 2.54,
        _ => 0.0,
    };
    log::debug!("JPEG {width}x{height}, {dpi} dpi");
    let surface = Surface::from_pixels(width, height, PixelFormat::Rgb24, pixels, None)?;
    Ok(Image::new(surface).with_dpi(dpi))
}

/// Encode as baseline or progressive JPEG. Alpha is dropped.
pub(crate) fn encode(
    surface: &Surface,
    dpi: f32,
    quality: u8,
    progressive: bool,
) -> Result<Vec<u8>, RasterError> {
    let too_large = || {
        RasterError::UnsupportedFormat(alloc::format!(
            "JPEG dimensions {}x{} exceed 65535",
            surface.width(),
            surface.height()
        ))
    };
    let width = u16::try_from(surface.width()).map_err(|_| too_large())?;
    let height = u16::try_from(surface.height()).map_err(|_| too_large())?;
    let rgb = surface.to_rgb24()?;

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality.clamp(1, 100));
    encoder.set_progressive(progressive);
    if dpi > 0.0 {
        let d = (dpi + 0.5) as u16;
        encoder.set_density(jpeg_encoder::Density::Inch { x: d, y: d });
    }
    encoder.encode(rgb.pixels(), width, height, jpeg_encoder::ColorType::Rgb)?;
    Ok(out)
}
