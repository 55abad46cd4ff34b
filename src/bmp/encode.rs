//! BMP encoder: uncompressed 8, 24 and 32-bit BMP.

use alloc::vec::Vec;

use crate::error::RasterError;
use crate::pixel::PixelFormat;
use crate::surface::Surface;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;

/// Pixels per meter for a dpi value; 0 stays 0.
pub(crate) fn dpi_to_pels_per_meter(dpi: f32) -> u32 {
    if dpi <= 0.0 {
        0
    } else {
        (f64::from(dpi) * 100.0 / 2.54 + 0.5) as u32
    }
}

/// Encode `surface` as BMP, rows bottom-up, BGR(A) channel order.
pub(crate) fn encode_bmp(surface: &Surface, dpi: f32) -> Result<Vec<u8>, RasterError> {
    let (width, height) = (surface.width(), surface.height());
    let format = surface.format();
    let bpp = format.bits_per_pixel();
    let w = width as usize;
    let row_stride = (w * usize::from(bpp)).div_ceil(32) * 4;
    let pixel_data_size = row_stride
        .checked_mul(height as usize)
        .ok_or(RasterError::DimensionsTooLarge { width, height })?;
    let table_size = if format.is_indexed() { 256 * 4 } else { 0 };
    let data_offset = FILE_HEADER_SIZE + INFO_HEADER_SIZE + table_size;
    let file_size = pixel_data_size
        .checked_add(data_offset)
        .filter(|&n| u32::try_from(n).is_ok())
        .ok_or(RasterError::DimensionsTooLarge { width, height })?;

    let mut out = Vec::new();
    out.try_reserve_exact(file_size)?;
    let ppm = dpi_to_pels_per_meter(dpi);
    write_bmp_header(
        &mut out,
        file_size,
        data_offset,
        pixel_data_size,
        width,
        height,
        bpp,
        ppm,
    );

    if let Some(palette) = surface.palette() {
        for i in 0..256 {
            let c = palette.get(i).unwrap_or_default();
            out.extend_from_slice(&[c.b, c.g, c.r, 0]);
        }
    }

    let pad_bytes = row_stride - w * format.bytes_per_pixel();
    for y in (0..height).rev() {
        let row = surface.row(y);
        match format {
            PixelFormat::Indexed8 => out.extend_from_slice(row),
            PixelFormat::Rgb24 => {
                for px in row.chunks_exact(3) {
                    out.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            PixelFormat::Rgba32 => {
                for px in row.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
        }
        out.extend(core::iter::repeat_n(0u8, pad_bytes));
    }

    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn write_bmp_header(
    out: &mut Vec<u8>,
    file_size: usize,
    data_offset: usize,
    pixel_data_size: usize,
    width: u32,
    height: u32,
    bpp: u16,
    pels_per_meter: u32,
) {
    // File header (14 bytes)
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // reserved
    out.extend_from_slice(&(data_offset as u32).to_le_bytes());

    // DIB header (BITMAPINFOHEADER, 40 bytes)
    out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes()); // positive = bottom-up
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // compression
    out.extend_from_slice(&(pixel_data_size as u32).to_le_bytes());
    out.extend_from_slice(&pels_per_meter.to_le_bytes()); // h resolution
    out.extend_from_slice(&pels_per_meter.to_le_bytes()); // v resolution
    out.extend_from_slice(&0u32.to_le_bytes()); // colors used
    out.extend_from_slice(&0u32.to_le_bytes()); // important colors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pels_per_meter_rounds() {
        assert_eq!(dpi_to_pels_per_meter(0.0), 0);
        assert_eq!(dpi_to_pels_per_meter(72.0), 2835);
        assert_eq!(dpi_to_pels_per_meter(96.0), 3780);
    }

    #[test]
    fn header_layout() {
        let s = Surface::new(3, 2, PixelFormat::Rgb24, None).unwrap();
        let bytes = encode_bmp(&s, 96.0).unwrap();
        assert_eq!(&bytes[..2], b"BM");
        // 3 px * 3 bytes = 9, padded to 12, two rows
        assert_eq!(bytes.len(), 54 + 24);
        assert_eq!(u32::from_le_bytes(bytes[10..14].try_into().unwrap()), 54);
        assert_eq!(u16::from_le_bytes(bytes[28..30].try_into().unwrap()), 24);
        assert_eq!(u32::from_le_bytes(bytes[38..42].try_into().unwrap()), 3780);
    }
}
