//! Geometry: stretch, box downsample, rotate, flip, and sub-images.
//!
//! Resampling runs on an `imgref::ImgVec<RGBA8>` working copy and always
//! produces a new surface.

use alloc::vec::Vec;

use imgref::{Img, ImgVec};
use rgb::{AsPixels as _, ComponentBytes as _, RGBA8};

use crate::error::RasterError;
use crate::pixel::PixelFormat;
use crate::surface::{Region, Surface, alloc_pixels};

impl Surface {
    fn to_rgba_img(&self) -> Result<ImgVec<RGBA8>, RasterError> {
        let rgba = self.to_rgba32()?;
        let buf: Vec<RGBA8> = rgba.pixels().as_pixels().to_vec();
        Ok(Img::new(buf, self.width() as usize, self.height() as usize))
    }

    fn from_rgba_img(img: &ImgVec<RGBA8>, keep_alpha: bool) -> Result<Surface, RasterError> {
        let bytes = img.buf().as_bytes().to_vec();
        let s = Surface::from_pixels(
            img.width() as u32,
            img.height() as u32,
            PixelFormat::Rgba32,
            bytes,
            None,
        )?;
        if keep_alpha { Ok(s) } else { s.to_rgb24() }
    }

    /// Bilinear resize in 8.8 fixed point.
    ///
    /// RGBA sources stay RGBA; everything else comes back as RGB.
    pub fn resized(&self, width: u32, height: u32) -> Result<Surface, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        let src = self.to_rgba_img()?;
        let (sw, sh) = (u64::from(self.width()), u64::from(self.height()));
        let wfactor = (sw << 8) / u64::from(width);
        let hfactor = (sh << 8) / u64::from(height);

        let mut out = Vec::new();
        let len = width as usize * height as usize;
        out.try_reserve_exact(len)?;
        for iy in 0..u64::from(height) {
            let y = hfactor * iy;
            let y0 = (y >> 8) as usize;
            let y1 = (y0 + 1).min(sh as usize - 1);
            let ey1 = (y & 0xFF) as u32;
            let ey0 = 0x100 - ey1;
            let row0 = &src[y0];
            let row1 = &src[y1];
            for ix in 0..u64::from(width) {
                let x = wfactor * ix;
                let x0 = (x >> 8) as usize;
                let x1 = (x0 + 1).min(sw as usize - 1);
                let ex1 = (x & 0xFF) as u32;
                let ex0 = 0x100 - ex1;
                let lerp = |c00: u8, c10: u8, c01: u8, c11: u8| -> u8 {
                    let top = (ex0 * u32::from(c00) + ex1 * u32::from(c10)) >> 8;
                    let bottom = (ex0 * u32::from(c01) + ex1 * u32::from(c11)) >> 8;
                    ((ey0 * top + ey1 * bottom) >> 8) as u8
                };
                let (c00, c10, c01, c11) = (row0[x0], row0[x1], row1[x0], row1[x1]);
                out.push(RGBA8::new(
                    lerp(c00.r, c10.r, c01.r, c11.r),
                    lerp(c00.g, c10.g, c01.g, c11.g),
                    lerp(c00.b, c10.b, c01.b, c11.b),
                    lerp(c00.a, c10.a, c01.a, c11.a),
                ));
            }
        }
        let img = Img::new(out, width as usize, height as usize);
        Self::from_rgba_img(&img, self.format().has_alpha())
    }

    /// Area-average downsample to `width x height` (RGBA out).
    ///
    /// Colors are weighted by alpha, so transparent pixels do not darken
    /// their neighbours. Targets larger than the source are clamped to the
    /// source size.
    pub fn downsampled(&self, width: u32, height: u32) -> Result<Surface, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        let width = width.min(self.width());
        let height = height.min(self.height());
        let src = self.to_rgba_img()?;
        if width == self.width() && height == self.height() {
            return Self::from_rgba_img(&src, true);
        }
        let (sw, sh) = (self.width() as usize, self.height() as usize);
        let (dw, dh) = (width as usize, height as usize);

        let mut out = Vec::new();
        out.try_reserve_exact(dw * dh)?;
        for dy in 0..dh {
            let y0 = dy * sh / dh;
            let y1 = ((dy + 1) * sh).div_ceil(dh).max(y0 + 1);
            for dx in 0..dw {
                let x0 = dx * sw / dw;
                let x1 = ((dx + 1) * sw).div_ceil(dw).max(x0 + 1);
                let (mut r, mut g, mut b, mut a) = (0u64, 0u64, 0u64, 0u64);
                for row in src.sub_image(x0, y0, x1 - x0, y1 - y0).rows() {
                    for px in row {
                        let alpha = u64::from(px.a);
                        r += u64::from(px.r) * alpha;
                        g += u64::from(px.g) * alpha;
                        b += u64::from(px.b) * alpha;
                        a += alpha;
                    }
                }
                let count = ((x1 - x0) * (y1 - y0)) as u64;
                out.push(if a == 0 {
                    RGBA8::new(0, 0, 0, 0)
                } else {
                    RGBA8::new((r / a) as u8, (g / a) as u8, (b / a) as u8, (a / count) as u8)
                });
            }
        }
        Self::from_rgba_img(&Img::new(out, dw, dh), true)
    }

    /// Rotate counter-clockwise by `angle` radians around the center.
    ///
    /// Bilinear sampling in 16.16 fixed point; uncovered pixels are
    /// transparent. With `grow` the canvas expands to hold the rotated
    /// image, otherwise it keeps the source size. Always RGBA out.
    pub fn rotated(&self, angle: f64, grow: bool) -> Result<Surface, RasterError> {
        let (cos, sin) = (angle.cos(), angle.sin());
        let (sw, sh) = (self.width() as i64, self.height() as i64);
        let (cx, cy) = if grow {
            let w = ((sw as f64 * cos).abs() + (sh as f64 * sin).abs() + 0.5) as u32;
            let h = ((sw as f64 * sin).abs() + (sh as f64 * cos).abs() + 0.5) as u32;
            (w.max(1), h.max(1))
        } else {
            (self.width(), self.height())
        };
        let src = self.to_rgba_img()?;
        let mut out = Surface::transparent(cx, cy)?;

        let px = (sw - 1) << 15;
        let py = (sh - 1) << 15;
        let qx = (i64::from(cx) - 1) << 7;
        let qy = (i64::from(cy) - 1) << 7;
        let cost = (cos * 256.0) as i64;
        let sint = (sin * 256.0) as i64;

        let dst = out.pixels_mut();
        for my in 0..i64::from(cy) {
            let dy = (my << 8) - qy;
            for mx in 0..i64::from(cx) {
                let dx = (mx << 8) - qx;
                let x = dx * cost - dy * sint + px;
                let y = dx * sint + dy * cost + py;
                let (x0, y0) = (x >> 16, y >> 16);
                if x0 < 0 || x0 >= sw || y0 < 0 || y0 >= sh {
                    continue;
                }
                let x1 = (x0 + 1).min(sw - 1) as usize;
                let y1 = (y0 + 1).min(sh - 1) as usize;
                let (x0, y0) = (x0 as usize, y0 as usize);
                let ex1 = x & 0xFFFF;
                let ex0 = 0x10000 - ex1;
                let ey1 = y & 0xFFFF;
                let ey0 = 0x10000 - ey1;
                let lerp = |c00: u8, c10: u8, c01: u8, c11: u8| -> u8 {
                    let top = (ex0 * i64::from(c00) + ex1 * i64::from(c10)) >> 16;
                    let bottom = (ex0 * i64::from(c01) + ex1 * i64::from(c11)) >> 16;
                    ((ey0 * top + ey1 * bottom) >> 16) as u8
                };
                let (c00, c10) = (src[y0][x0], src[y0][x1]);
                let (c01, c11) = (src[y1][x0], src[y1][x1]);
                let off = (my as usize * cx as usize + mx as usize) * 4;
                dst[off..off + 4].copy_from_slice(&[
                    lerp(c00.r, c10.r, c01.r, c11.r),
                    lerp(c00.g, c10.g, c01.g, c11.g),
                    lerp(c00.b, c10.b, c01.b, c11.b),
                    lerp(c00.a, c10.a, c01.a, c11.a),
                ]);
            }
        }
        Ok(out)
    }

    /// Mirror left to right. The format is kept.
    pub fn flipped_horizontal(&self) -> Result<Surface, RasterError> {
        let mut out = self.clone();
        let bpp = self.format().bytes_per_pixel();
        for y in 0..self.height() {
            let row = out.row_mut(y);
            let w = row.len() / bpp;
            for x in 0..w / 2 {
                let (left, right) = row.split_at_mut((w - x - 1) * bpp);
                left[x * bpp..(x + 1) * bpp].swap_with_slice(&mut right[..bpp]);
            }
        }
        Ok(out)
    }

    /// Mirror top to bottom. The format is kept.
    pub fn flipped_vertical(&self) -> Result<Surface, RasterError> {
        let mut out = self.clone();
        let stride = self.stride();
        let h = self.height() as usize;
        let pixels = out.pixels_mut();
        for y in 0..h / 2 {
            let (top, bottom) = pixels.split_at_mut((h - y - 1) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
        Ok(out)
    }

    /// Copy of `region`, same format and palette.
    pub fn sub_image(&self, region: Region) -> Result<Surface, RasterError> {
        if region.width == 0 || region.height == 0 {
            return Err(RasterError::InvalidDimensions {
                width: region.width,
                height: region.height,
            });
        }
        if !region.fits_within(self.width(), self.height()) {
            return Err(RasterError::InvalidRegion(alloc::format!(
                "{region:?} outside {}x{}",
                self.width(),
                self.height()
            )));
        }
        let bpp = self.format().bytes_per_pixel();
        let bytes = Img::new(
            self.pixels(),
            self.stride(),
            self.height() as usize,
        );
        let view = bytes.sub_image(
            region.x as usize * bpp,
            region.y as usize,
            region.width as usize * bpp,
            region.height as usize,
        );
        let mut out = alloc_pixels(region.width, region.height, bpp)?;
        for (dst, src) in out.chunks_exact_mut(region.width as usize * bpp).zip(view.rows()) {
            dst.copy_from_slice(src);
        }
        Surface::from_pixels(
            region.width,
            region.height,
            self.format(),
            out,
            self.palette().cloned(),
        )
    }
}
