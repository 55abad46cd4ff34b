//! Owned pixel buffers.
//!
//! A [`Surface`] owns `width * height * bytes_per_pixel` bytes in one of the
//! [`PixelFormat`]s. Indexed surfaces carry their [`Palette`]. Every
//! conversion returns a new surface; cloning is a deep copy.

use alloc::vec::Vec;

use rgb::AsPixels as _;

use crate::color::{BLACK, Color8, gray_level};
use crate::error::RasterError;
use crate::palette::Palette;
use crate::pixel::PixelFormat;

/// Edge length of one checkerboard cell.
const CHECKER_CELL: u32 = 8;

/// Rectangle in surface pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The region covering a whole `width x height` surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Whether the region lies inside a `width x height` canvas.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// Allocate a zeroed pixel buffer, reporting overflow and allocation failure.
pub(crate) fn alloc_pixels(
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(bytes_per_pixel))
        .ok_or(RasterError::DimensionsTooLarge { width, height })?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| RasterError::AllocationFailure { bytes: len })?;
    pixels.resize(len, 0);
    Ok(pixels)
}

/// An owned rectangular pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
    palette: Option<Palette>,
}

impl Surface {
    /// Zero-filled surface.
    ///
    /// Indexed surfaces without a palette get 256 gray levels; a palette
    /// passed for a non-indexed format is dropped.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        palette: Option<Palette>,
    ) -> Result<Self, RasterError> {
        let pixels = alloc_pixels(width, height, format.bytes_per_pixel())?;
        let palette = match format {
            PixelFormat::Indexed8 => Some(palette.unwrap_or_else(Palette::grayscale)),
            _ => None,
        };
        Ok(Self {
            width,
            height,
            format,
            pixels,
            palette,
        })
    }

    /// Wrap an existing buffer. Its length must match exactly.
    pub fn from_pixels(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
        palette: Option<Palette>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or(RasterError::DimensionsTooLarge { width, height })?;
        if pixels.len() < expected {
            return Err(RasterError::BufferTooSmall {
                needed: expected,
                actual: pixels.len(),
            });
        }
        if pixels.len() > expected {
            return Err(RasterError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        let palette = match format {
            PixelFormat::Indexed8 => Some(palette.unwrap_or_else(Palette::grayscale)),
            _ => None,
        };
        Ok(Self {
            width,
            height,
            format,
            pixels,
            palette,
        })
    }

    /// Surface filled with one color.
    ///
    /// For [`PixelFormat::Indexed8`] the palette is the single color.
    pub fn solid(
        width: u32,
        height: u32,
        format: PixelFormat,
        color: Color8,
    ) -> Result<Self, RasterError> {
        match format {
            PixelFormat::Indexed8 => {
                let palette = Palette::from_colors(alloc::vec![color])?;
                Self::solid_indexed(width, height, palette, 0)
            }
            PixelFormat::Rgb24 => {
                let mut s = Self::new(width, height, format, None)?;
                for px in s.pixels.chunks_exact_mut(3) {
                    px.copy_from_slice(&[color.r, color.g, color.b]);
                }
                Ok(s)
            }
            PixelFormat::Rgba32 => {
                let mut s = Self::new(width, height, format, None)?;
                for px in s.pixels.chunks_exact_mut(4) {
                    px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
                }
                Ok(s)
            }
        }
    }

    /// Indexed surface with every pixel set to `index`.
    pub fn solid_indexed(
        width: u32,
        height: u32,
        palette: Palette,
        index: u8,
    ) -> Result<Self, RasterError> {
        let mut s = Self::new(width, height, PixelFormat::Indexed8, Some(palette))?;
        s.pixels.fill(index);
        Ok(s)
    }

    /// Fully transparent RGBA surface.
    pub fn transparent(width: u32, height: u32) -> Result<Self, RasterError> {
        Self::new(width, height, PixelFormat::Rgba32, None)
    }

    /// Indexed surface of zeros with a 256-level gray palette.
    pub fn new_grayscale(width: u32, height: u32) -> Result<Self, RasterError> {
        Self::new(width, height, PixelFormat::Indexed8, Some(Palette::grayscale()))
    }

    /// Opaque checkerboard of 8-pixel gray (0x88) and white cells.
    ///
    /// The top-left cell is white.
    pub fn checkerboard(width: u32, height: u32, format: PixelFormat) -> Result<Self, RasterError> {
        let palette = match format {
            PixelFormat::Indexed8 => Some(Palette::from_colors(alloc::vec![
                Color8::new(0xFF, 0xFF, 0xFF, 255),
                Color8::new(0x88, 0x88, 0x88, 255),
            ])?),
            _ => None,
        };
        let mut s = Self::new(width, height, format, palette)?;
        let bpp = format.bytes_per_pixel();
        for y in 0..height {
            let row = s.row_mut(y);
            for x in 0..width {
                let dark = ((x / CHECKER_CELL) & 1) ^ ((y / CHECKER_CELL) & 1) == 1;
                let px = &mut row[x as usize * bpp..][..bpp];
                match format {
                    PixelFormat::Indexed8 => px[0] = u8::from(dark),
                    _ => {
                        let v = if dark { 0x88 } else { 0xFF };
                        px[..3].fill(v);
                        if bpp == 4 {
                            px[3] = 0xFF;
                        }
                    }
                }
            }
        }
        Ok(s)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row (rows are tightly packed).
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Raw pixel bytes, top-down rows.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Palette of an indexed surface.
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Replace the palette of an indexed surface.
    pub fn set_palette(&mut self, palette: Palette) -> Result<(), RasterError> {
        if self.format != PixelFormat::Indexed8 {
            return Err(RasterError::UnsupportedFormat(alloc::format!(
                "{:?} surfaces have no palette",
                self.format
            )));
        }
        self.palette = Some(palette);
        Ok(())
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        &self.pixels[y as usize * stride..][..stride]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        &mut self.pixels[y as usize * stride..][..stride]
    }

    /// RGBA view of an [`PixelFormat::Rgba32`] surface.
    pub fn rgba_pixels(&self) -> Option<&[Color8]> {
        match self.format {
            PixelFormat::Rgba32 => Some(self.pixels.as_pixels()),
            _ => None,
        }
    }

    /// Color at `(x, y)`, resolving indices through the palette.
    ///
    /// Indices past the end of the palette read as opaque black.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let off = (y as usize * self.width as usize + x as usize) * bpp;
        let px = &self.pixels[off..off + bpp];
        Some(match self.format {
            PixelFormat::Indexed8 => self
                .palette
                .as_ref()
                .and_then(|p| p.get(usize::from(px[0])))
                .unwrap_or(BLACK),
            PixelFormat::Rgb24 => Color8::new(px[0], px[1], px[2], 255),
            PixelFormat::Rgba32 => Color8::new(px[0], px[1], px[2], px[3]),
        })
    }

    /// Palette index at `(x, y)` of an indexed surface.
    pub fn index(&self, x: u32, y: u32) -> Option<u8> {
        if self.format != PixelFormat::Indexed8 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Write a color at `(x, y)`. Indexed surfaces take the nearest entry.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let bpp = self.format.bytes_per_pixel();
        let off = (y as usize * self.width as usize + x as usize) * bpp;
        match self.format {
            PixelFormat::Indexed8 => {
                let index = self
                    .palette
                    .as_ref()
                    .map_or(0, |p| p.nearest_index(color));
                self.pixels[off] = index;
            }
            PixelFormat::Rgb24 => {
                self.pixels[off..off + 3].copy_from_slice(&[color.r, color.g, color.b])
            }
            PixelFormat::Rgba32 => self.pixels[off..off + 4]
                .copy_from_slice(&[color.r, color.g, color.b, color.a]),
        }
    }

    /// Whether every pixel is fully opaque. Formats without alpha always are.
    pub fn is_opaque(&self) -> bool {
        match self.format {
            PixelFormat::Rgba32 => self.pixels.chunks_exact(4).all(|px| px[3] == 0xFF),
            _ => true,
        }
    }

    /// New RGBA copy. Indexed and RGB pixels become opaque.
    pub fn to_rgba32(&self) -> Result<Surface, RasterError> {
        self.to_rgba32_keyed(None)
    }

    /// New RGBA copy where indexed pixels equal to `transparent` get alpha 0.
    ///
    /// With no key this is [`Surface::to_rgba32`]. Non-indexed sources ignore
    /// the key.
    pub fn to_rgba32_keyed(&self, transparent: Option<u8>) -> Result<Surface, RasterError> {
        let mut out = alloc_pixels(self.width, self.height, 4)?;
        match self.format {
            PixelFormat::Rgba32 => out.copy_from_slice(&self.pixels),
            PixelFormat::Rgb24 => {
                for (dst, src) in out.chunks_exact_mut(4).zip(self.pixels.chunks_exact(3)) {
                    dst.copy_from_slice(&[src[0], src[1], src[2], 0xFF]);
                }
            }
            PixelFormat::Indexed8 => {
                let lut = self.lookup_table();
                for (dst, &index) in out.chunks_exact_mut(4).zip(self.pixels.iter()) {
                    let c = lut[usize::from(index)];
                    let alpha = if Some(index) == transparent { 0 } else { 0xFF };
                    dst.copy_from_slice(&[c.r, c.g, c.b, alpha]);
                }
            }
        }
        Surface::from_pixels(self.width, self.height, PixelFormat::Rgba32, out, None)
    }

    /// New RGB copy; alpha is dropped.
    pub fn to_rgb24(&self) -> Result<Surface, RasterError> {
        let mut out = alloc_pixels(self.width, self.height, 3)?;
        match self.format {
            PixelFormat::Rgb24 => out.copy_from_slice(&self.pixels),
            PixelFormat::Rgba32 => {
                for (dst, src) in out.chunks_exact_mut(3).zip(self.pixels.chunks_exact(4)) {
                    dst.copy_from_slice(&src[..3]);
                }
            }
            PixelFormat::Indexed8 => {
                let lut = self.lookup_table();
                for (dst, &index) in out.chunks_exact_mut(3).zip(self.pixels.iter()) {
                    let c = lut[usize::from(index)];
                    dst.copy_from_slice(&[c.r, c.g, c.b]);
                }
            }
        }
        Surface::from_pixels(self.width, self.height, PixelFormat::Rgb24, out, None)
    }

    /// RGBA surfaces are copied as-is; anything else becomes RGB.
    pub fn to_rgb_or_rgba(&self) -> Result<Surface, RasterError> {
        match self.format {
            PixelFormat::Rgba32 => Ok(self.clone()),
            _ => self.to_rgb24(),
        }
    }

    /// RGBA copy with each color replaced by its gray level; alpha kept.
    pub fn to_grayscale(&self) -> Result<Surface, RasterError> {
        let mut out = self.to_rgba32()?;
        for px in out.pixels.chunks_exact_mut(4) {
            let v = gray_level(Color8::new(px[0], px[1], px[2], px[3]));
            px[..3].fill(v);
        }
        Ok(out)
    }

    /// Indexed gray-level image of this surface.
    pub fn to_grayscale8(&self) -> Result<Surface, RasterError> {
        let mut out = Surface::new_grayscale(self.width, self.height)?;
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.pixel(x, y).unwrap_or(BLACK);
                out.pixels[y as usize * self.width as usize + x as usize] = gray_level(c);
            }
        }
        Ok(out)
    }

    /// Indexed gray image of the alpha channel; 255 everywhere for sources
    /// without alpha.
    pub fn alpha_channel(&self) -> Result<Surface, RasterError> {
        let mut out = Surface::new_grayscale(self.width, self.height)?;
        match self.format {
            PixelFormat::Rgba32 => {
                for (dst, src) in out.pixels.iter_mut().zip(self.pixels.chunks_exact(4)) {
                    *dst = src[3];
                }
            }
            _ => out.pixels.fill(0xFF),
        }
        Ok(out)
    }

    /// RGBA copy whose alpha is the gray level of `alpha`.
    pub fn with_alpha_channel(&self, alpha: &Surface) -> Result<Surface, RasterError> {
        let mut out = self.to_rgba32()?;
        out.store_alpha_channel(alpha)?;
        Ok(out)
    }

    /// Set the alpha of this RGBA surface from the gray level of `alpha`.
    pub fn store_alpha_channel(&mut self, alpha: &Surface) -> Result<(), RasterError> {
        if self.format != PixelFormat::Rgba32 {
            return Err(RasterError::UnsupportedFormat(alloc::format!(
                "alpha can only be stored into Rgba32, not {:?}",
                self.format
            )));
        }
        if alpha.width != self.width || alpha.height != self.height {
            return Err(RasterError::InvalidRegion(alloc::format!(
                "alpha {}x{} does not match {}x{}",
                alpha.width,
                alpha.height,
                self.width,
                self.height
            )));
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let a = gray_level(alpha.pixel(x, y).unwrap_or(BLACK));
                let off = (y as usize * self.width as usize + x as usize) * 4;
                self.pixels[off + 3] = a;
            }
        }
        Ok(())
    }

    /// 256-entry lookup for indexed pixels; missing entries are black.
    fn lookup_table(&self) -> [Color8; 256] {
        let mut lut = [BLACK; 256];
        if let Some(palette) = &self.palette {
            for (slot, &c) in lut.iter_mut().zip(palette.colors()) {
                *slot = Color8::new(c.r, c.g, c.b, 255);
            }
        }
        lut
    }
}
