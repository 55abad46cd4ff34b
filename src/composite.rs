//! Alpha compositing of one surface onto another.
//!
//! A [`Compositor`] owns a [`BlendBackend`] that does the per-row math.
//! Sources are promoted to RGBA (indexed ones through their transparency
//! key) and premultiplied before they reach the backend.

use rgb::AsPixels as _;

use crate::color::Color8;
use crate::error::RasterError;
use crate::pixel::PixelFormat;
use crate::surface::{Region, Surface};

/// Row blender used by [`Compositor`].
pub trait BlendBackend {
    /// Composite premultiplied `src` over `dst` scaled by the constant
    /// alpha `sca`. Both slices have the same length.
    fn blend_row(&self, dst: &mut [Color8], src: &[Color8], sca: u8);
}

/// Premultiplied SRC_OVER in integer arithmetic.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareBlend;

impl BlendBackend for SoftwareBlend {
    fn blend_row(&self, dst: &mut [Color8], src: &[Color8], sca: u8) {
        let sca = u32::from(sca);
        for (d, s) in dst.iter_mut().zip(src) {
            let scale = |c: u8| (u32::from(c) * sca / 255) as u8;
            let s = Color8::new(scale(s.r), scale(s.g), scale(s.b), scale(s.a));
            let inv = 255 - u32::from(s.a);
            let over = |sc: u8, dc: u8| (u32::from(sc) + u32::from(dc) * inv / 255).min(255) as u8;
            *d = Color8::new(over(s.r, d.r), over(s.g, d.g), over(s.b, d.b), over(s.a, d.a));
        }
    }
}

/// Overlap of a `w x h` block placed at `(x, y)` with a `dw x dh` canvas.
///
/// Returns `(src_x, src_y, dst_x, dst_y, width, height)`.
fn clip(
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    dw: u32,
    dh: u32,
) -> Option<(u32, u32, u32, u32, u32, u32)> {
    let (x, y) = (i64::from(x), i64::from(y));
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(w)).min(i64::from(dw));
    let y1 = (y + i64::from(h)).min(i64::from(dh));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((
        (x0 - x) as u32,
        (y0 - y) as u32,
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}

fn check_destination(dest: &Surface) -> Result<(), RasterError> {
    match dest.format() {
        PixelFormat::Rgba32 | PixelFormat::Rgb24 => Ok(()),
        other => Err(RasterError::UnsupportedFormat(alloc::format!(
            "cannot composite onto {other:?}"
        ))),
    }
}

/// Write `row` into `dest` at `(x, y)`. RGB destinations drop alpha.
fn store_row(dest: &mut Surface, x: u32, y: u32, row: &[Color8]) {
    let bpp = dest.format().bytes_per_pixel();
    let line = &mut dest.row_mut(y)[x as usize * bpp..][..row.len() * bpp];
    match bpp {
        4 => line.as_pixels_mut().copy_from_slice(row),
        _ => {
            for (px, c) in line.chunks_exact_mut(bpp).zip(row) {
                px.copy_from_slice(&[c.r, c.g, c.b]);
            }
        }
    }
}

/// Read `len` pixels of `dest` at `(x, y)` as RGBA. RGB reads as opaque.
fn load_row(dest: &Surface, x: u32, y: u32, len: usize) -> alloc::vec::Vec<Color8> {
    let bpp = dest.format().bytes_per_pixel();
    dest.row(y)[x as usize * bpp..][..len * bpp]
        .chunks_exact(bpp)
        .map(|px| match bpp {
            4 => Color8::new(px[0], px[1], px[2], px[3]),
            _ => Color8::new(px[0], px[1], px[2], 255),
        })
        .collect()
}

/// Source converted to RGBA, keyed for indexed data.
fn promote(src: &Surface, transparent: Option<u8>) -> Result<Surface, RasterError> {
    match src.format() {
        PixelFormat::Indexed8 => src.to_rgba32_keyed(transparent),
        PixelFormat::Rgb24 => src.to_rgba32(),
        PixelFormat::Rgba32 => Ok(src.clone()),
    }
}

/// Blits surfaces with a pluggable blend backend.
#[derive(Clone, Debug, Default)]
pub struct Compositor<B: BlendBackend = SoftwareBlend> {
    backend: B,
}

impl Compositor<SoftwareBlend> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: BlendBackend> Compositor<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Blend `src_rect` of `src` onto `dest` with its top-left at `(x, y)`.
    ///
    /// `transparent` keys indexed sources; `sca` scales the whole source.
    /// The write is clipped to `dest`.
    #[allow(clippy::too_many_arguments)]
    pub fn put(
        &self,
        dest: &mut Surface,
        x: i32,
        y: i32,
        src: &Surface,
        src_rect: Region,
        transparent: Option<u8>,
        sca: u8,
    ) -> Result<(), RasterError> {
        check_destination(dest)?;
        let mut src = if src_rect == Region::full(src.width(), src.height()) {
            promote(src, transparent)?
        } else {
            promote(&src.sub_image(src_rect)?, transparent)?
        };
        src.premultiply();

        let Some((sx, sy, dx, dy, w, h)) =
            clip(x, y, src.width(), src.height(), dest.width(), dest.height())
        else {
            return Ok(());
        };
        let pixels = src.rgba_pixels().unwrap_or_default();
        let sw = src.width() as usize;
        for row in 0..h {
            let start = (sy + row) as usize * sw + sx as usize;
            let s = &pixels[start..start + w as usize];
            let mut d = load_row(dest, dx, dy + row, w as usize);
            self.backend.blend_row(&mut d, s, sca);
            store_row(dest, dx, dy + row, &d);
        }
        Ok(())
    }

    /// Blend the whole of `src` onto `dest` at `(x, y)`.
    pub fn stamp(
        &self,
        dest: &mut Surface,
        x: i32,
        y: i32,
        src: &Surface,
        transparent: Option<u8>,
        sca: u8,
    ) -> Result<(), RasterError> {
        let rect = Region::full(src.width(), src.height());
        self.put(dest, x, y, src, rect, transparent, sca)
    }

    /// [`stamp`](Self::stamp) with `src` centered on `(x, y)`.
    pub fn stamp_center(
        &self,
        dest: &mut Surface,
        x: i32,
        y: i32,
        src: &Surface,
        transparent: Option<u8>,
        sca: u8,
    ) -> Result<(), RasterError> {
        let (cx, cy) = half(src.width(), src.height());
        self.stamp(dest, x - cx, y - cy, src, transparent, sca)
    }

    /// [`put`](Self::put) with `src_rect` centered on `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn put_center(
        &self,
        dest: &mut Surface,
        x: i32,
        y: i32,
        src: &Surface,
        src_rect: Region,
        transparent: Option<u8>,
        sca: u8,
    ) -> Result<(), RasterError> {
        let (cx, cy) = half(src_rect.width, src_rect.height);
        self.put(dest, x - cx, y - cy, src, src_rect, transparent, sca)
    }

    /// Overwrite the area under `src` with its pixels; no blending.
    pub fn copy(
        &self,
        dest: &mut Surface,
        x: i32,
        y: i32,
        src: &Surface,
        transparent: Option<u8>,
    ) -> Result<(), RasterError> {
        check_destination(dest)?;
        let src = promote(src, transparent)?;
        let Some((sx, sy, dx, dy, w, h)) =
            clip(x, y, src.width(), src.height(), dest.width(), dest.height())
        else {
            return Ok(());
        };
        let pixels = src.rgba_pixels().unwrap_or_default();
        let sw = src.width() as usize;
        for row in 0..h {
            let start = (sy + row) as usize * sw + sx as usize;
            store_row(dest, dx, dy + row, &pixels[start..start + w as usize]);
        }
        Ok(())
    }

    /// Fill `region` of `dest` with `color`, clipped; no blending.
    pub fn fill(
        &self,
        dest: &mut Surface,
        region: Region,
        color: Color8,
    ) -> Result<(), RasterError> {
        check_destination(dest)?;
        let x = i32::try_from(region.x).unwrap_or(i32::MAX);
        let y = i32::try_from(region.y).unwrap_or(i32::MAX);
        let Some((_, _, dx, dy, w, h)) =
            clip(x, y, region.width, region.height, dest.width(), dest.height())
        else {
            return Ok(());
        };
        let row = alloc::vec![color; w as usize];
        for r in 0..h {
            store_row(dest, dx, dy + r, &row);
        }
        Ok(())
    }
}

fn half(w: u32, h: u32) -> (i32, i32) {
    ((w / 2) as i32, (h / 2) as i32)
}

// ── Alpha helpers ───────────────────────────────────────────────────

impl Surface {
    /// Scale color channels by alpha in place (`c * a / 255`).
    ///
    /// No-op for formats without alpha.
    pub fn premultiply(&mut self) {
        if self.format() != PixelFormat::Rgba32 {
            return;
        }
        for px in self.pixels_mut().chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            for c in &mut px[..3] {
                *c = (u32::from(*c) * a / 255) as u8;
            }
        }
    }

    /// Set alpha to 255 inside `region` (clipped). No-op unless RGBA.
    pub fn make_opaque(&mut self, region: Region) {
        if self.format() != PixelFormat::Rgba32 {
            return;
        }
        let x0 = region.x.min(self.width()) as usize;
        let x1 = region.x.saturating_add(region.width).min(self.width()) as usize;
        let y1 = region.y.saturating_add(region.height).min(self.height());
        for y in region.y.min(self.height())..y1 {
            for px in self.row_mut(y)[x0 * 4..x1 * 4].chunks_exact_mut(4) {
                px[3] = 0xFF;
            }
        }
    }

    /// Binary transparency: any alpha other than 255 becomes 0.
    ///
    /// No-op unless RGBA.
    pub fn erase_semitransparent(&mut self) {
        if self.format() != PixelFormat::Rgba32 {
            return;
        }
        for px in self.pixels_mut().chunks_exact_mut(4) {
            if px[3] != 0xFF {
                px[3] = 0;
            }
        }
    }
}
