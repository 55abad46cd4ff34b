//! BMP decoder for uncompressed 8, 24 and 32-bit files.
//!
//! Reads BITMAPINFOHEADER and its V2 to V5 extensions, bottom-up or
//! top-down rows, and BI_BITFIELDS with the standard 32-bit masks.

use alloc::vec::Vec;

use crate::error::RasterError;
use crate::limits::Limits;
use crate::palette::{MAX_PALETTE_COLORS, Palette};
use crate::pixel::PixelFormat;
use crate::surface::{Surface, alloc_pixels};

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// The only bitfield layout accepted: 0x00RRGGBB with optional alpha.
const STANDARD_MASKS: [u32; 3] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF];

// ── Cursor for reading from &[u8] ───────────────────────────────────

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn set_position(&mut self, pos: usize) -> Result<(), RasterError> {
        if pos > self.data.len() {
            return Err(RasterError::UnexpectedEof);
        }
        self.pos = pos;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<(), RasterError> {
        let new_pos = self.pos.checked_add(n).ok_or(RasterError::UnexpectedEof)?;
        self.set_position(new_pos)
    }

    fn read_fixed_bytes<const N: usize>(&mut self) -> Result<[u8; N], RasterError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or(RasterError::UnexpectedEof)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        self.pos += N;
        Ok(buf)
    }

    fn get_u16_le_err(&mut self) -> Result<u16, RasterError> {
        Ok(u16::from_le_bytes(self.read_fixed_bytes()?))
    }

    fn get_u32_le_err(&mut self) -> Result<u32, RasterError> {
        Ok(u32::from_le_bytes(self.read_fixed_bytes()?))
    }

    fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

// ── Header ──────────────────────────────────────────────────────────

/// Parsed file and info headers.
#[derive(Debug)]
pub(crate) struct BmpHeader {
    pub width: u32,
    pub height: u32,
    pub bottom_up: bool,
    pub bpp: u16,
    pub data_offset: usize,
    pub x_pels_per_meter: u32,
    pub palette: Option<Palette>,
}

impl BmpHeader {
    /// Horizontal resolution in dots per inch, 0 when unset.
    pub fn dpi(&self) -> f32 {
        (f64::from(self.x_pels_per_meter) * 2.54 / 100.0) as f32
    }

    fn row_stride(&self) -> usize {
        (self.width as usize * usize::from(self.bpp)).div_ceil(32) * 4
    }
}

pub(crate) fn parse_bmp_header(data: &[u8]) -> Result<BmpHeader, RasterError> {
    let mut cur = Cursor::new(data);
    if cur.read_fixed_bytes::<2>()? != *b"BM" {
        return Err(RasterError::UnrecognizedFormat);
    }
    let _file_size = cur.get_u32_le_err()?;
    cur.skip(4)?; // reserved
    let data_offset = cur.get_u32_le_err()? as usize;
    let ihsize = cur.get_u32_le_err()?;
    if !matches!(ihsize, 40 | 52 | 56 | 108 | 124) {
        return Err(RasterError::UnsupportedFormat(alloc::format!(
            "BMP info header size {ihsize}"
        )));
    }

    let width = cur.get_u32_le_err()? as i32;
    let height = cur.get_u32_le_err()? as i32;
    let planes = cur.get_u16_le_err()?;
    let bpp = cur.get_u16_le_err()?;
    let compression = cur.get_u32_le_err()?;
    let _image_size = cur.get_u32_le_err()?;
    let x_pels_per_meter = cur.get_u32_le_err()?;
    let _y_pels_per_meter = cur.get_u32_le_err()?;
    let colors_used = cur.get_u32_le_err()?;
    let _important = cur.get_u32_le_err()?;

    if planes != 1 {
        return Err(RasterError::Decode(alloc::format!(
            "BMP planes field is {planes}, expected 1"
        )));
    }
    if width <= 0 || height == 0 {
        return Err(RasterError::InvalidDimensions {
            width: width.unsigned_abs(),
            height: height.unsigned_abs(),
        });
    }
    if PixelFormat::from_bits(bpp).is_none() {
        return Err(RasterError::UnsupportedFormat(alloc::format!(
            "BMP bit depth {bpp}"
        )));
    }
    match compression {
        BI_RGB => {}
        BI_BITFIELDS if bpp == 32 => {
            // V2+ headers embed the masks; a 40-byte header is followed by them.
            let masks = [cur.get_u32_le_err()?, cur.get_u32_le_err()?, cur.get_u32_le_err()?];
            if masks != STANDARD_MASKS {
                return Err(RasterError::UnsupportedFormat(alloc::format!(
                    "BMP bitfields {masks:08x?}"
                )));
            }
        }
        other => {
            return Err(RasterError::UnsupportedFormat(alloc::format!(
                "BMP compression {other}"
            )));
        }
    }

    let palette = if bpp == 8 {
        let count = match colors_used {
            0 => MAX_PALETTE_COLORS,
            n => (n as usize).min(MAX_PALETTE_COLORS),
        };
        let mut extra = 0;
        if compression == BI_BITFIELDS && ihsize == 40 {
            extra = 12;
        }
        cur.set_position(14 + ihsize as usize + extra)?;
        let available = data_offset.saturating_sub(cur.pos) / 4;
        let mut bytes = Vec::with_capacity(count.min(available) * 3);
        for _ in 0..count.min(available) {
            let [b, g, r, _] = cur.read_fixed_bytes::<4>()?;
            bytes.extend_from_slice(&[r, g, b]);
        }
        Some(Palette::from_rgb_bytes(&bytes))
    } else {
        None
    };

    let header = BmpHeader {
        width: width as u32,
        height: height.unsigned_abs(),
        bottom_up: height > 0,
        bpp,
        data_offset,
        x_pels_per_meter,
        palette,
    };
    log::debug!("BMP {header:?}");
    Ok(header)
}

// ── Pixels ──────────────────────────────────────────────────────────

/// Decode a whole file. Returns the surface and its dpi.
pub(crate) fn decode_bmp(
    data: &[u8],
    limits: Option<&Limits>,
) -> Result<(Surface, f32), RasterError> {
    let mut header = parse_bmp_header(data)?;
    let format = PixelFormat::from_bits(header.bpp).ok_or(RasterError::UnrecognizedFormat)?;
    if let Some(limits) = limits {
        limits.check_image(header.width, header.height, format.bytes_per_pixel())?;
    }

    let mut cur = Cursor::new(data);
    cur.set_position(header.data_offset)?;
    let src = cur.remaining();
    let stride = header.row_stride();
    let needed = stride
        .checked_mul(header.height as usize)
        .ok_or(RasterError::DimensionsTooLarge {
            width: header.width,
            height: header.height,
        })?;
    if src.len() < needed {
        return Err(RasterError::UnexpectedEof);
    }

    let bpp = format.bytes_per_pixel();
    let w = header.width as usize;
    let mut pixels = alloc_pixels(header.width, header.height, bpp)?;
    for (y, dst) in pixels.chunks_exact_mut(w * bpp).enumerate() {
        let src_row = if header.bottom_up {
            header.height as usize - 1 - y
        } else {
            y
        };
        let row = &src[src_row * stride..][..w * bpp];
        match format {
            PixelFormat::Indexed8 => dst.copy_from_slice(row),
            PixelFormat::Rgb24 => {
                for (d, s) in dst.chunks_exact_mut(3).zip(row.chunks_exact(3)) {
                    d.copy_from_slice(&[s[2], s[1], s[0]]);
                }
            }
            PixelFormat::Rgba32 => {
                for (d, s) in dst.chunks_exact_mut(4).zip(row.chunks_exact(4)) {
                    d.copy_from_slice(&[s[2], s[1], s[0], s[3]]);
                }
            }
        }
    }

    let dpi = header.dpi();
    let surface = match format {
        // Many writers leave the fourth byte zero; such files are RGB.
        PixelFormat::Rgba32 if pixels.chunks_exact(4).all(|p| p[3] == 0) => {
            Surface::from_pixels(header.width, header.height, format, pixels, None)?.to_rgb24()?
        }
        _ => Surface::from_pixels(
            header.width,
            header.height,
            format,
            pixels,
            header.palette.take(),
        )?,
    };
    Ok((surface, dpi))
}
