//! Palette extraction and error-diffusion color reduction.
//!
//! Palettes come from a short k-means run over a population of trimmed
//! colors (see [`trim_color`]). Reduction maps every pixel to its nearest
//! palette entry with Floyd–Steinberg dithering.

use alloc::borrow::Cow;
use alloc::vec::Vec;
use std::collections::HashMap;

use nanorand::{Rng as _, WyRand};

use crate::anim::AnimationSequence;
use crate::color::{BLACK, Color8, Color32, WHITE, clamp_channel, color_distance, trim_color};
use crate::error::RasterError;
use crate::palette::{MAX_PALETTE_COLORS, Palette};
use crate::pixel::PixelFormat;
use crate::surface::{Surface, alloc_pixels};

/// Largest edge sampled when building a palette from a surface.
const SAMPLE_EDGE: u32 = 256;

/// Number of assignment/update rounds. Not run to convergence.
const KMEANS_ITERATIONS: usize = 2;

/// Seed used by [`Quantizer::default`].
const DEFAULT_SEED: u64 = 0x5EED_C010_12A5_7E11;

/// `0` and anything above 256 mean "as many as a palette holds".
fn normalize_colors(num_colors: usize) -> usize {
    if num_colors == 0 || num_colors > MAX_PALETTE_COLORS {
        MAX_PALETTE_COLORS
    } else {
        num_colors
    }
}

// ── Population ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
struct Entry {
    /// Most recently seen true color for this trimmed key.
    color: Color8,
    trimmed: Color8,
    count: u64,
}

/// Unique trimmed colors with their pixel counts, in first-seen order.
#[derive(Debug, Default)]
struct Population {
    entries: Vec<Entry>,
    lookup: HashMap<[u8; 3], usize>,
}

impl Population {
    fn add(&mut self, color: Color8) {
        let trimmed = trim_color(color);
        let key = [trimmed.r, trimmed.g, trimmed.b];
        match self.lookup.get(&key) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.color = color;
                entry.count += 1;
            }
            None => {
                self.lookup.insert(key, self.entries.len());
                self.entries.push(Entry {
                    color,
                    trimmed,
                    count: 1,
                });
            }
        }
    }

    fn extend(&mut self, pixels: &[Color8]) {
        for &c in pixels {
            self.add(c);
        }
    }
}

/// Two k-means rounds over `population`, refining `centroids` in place.
///
/// Entries join the centroid closest to their trimmed color; the lowest
/// index wins ties. Centroids move to the count-weighted mean of their
/// entries' true colors, or black when nothing joined.
fn kmeans(population: &Population, centroids: &mut [Color8]) {
    let mut membership = alloc::vec![0usize; population.entries.len()];
    for _ in 0..KMEANS_ITERATIONS {
        for (slot, entry) in membership.iter_mut().zip(&population.entries) {
            let mut best = i32::MAX;
            for (j, &centroid) in centroids.iter().enumerate() {
                let d = color_distance(entry.trimmed, centroid);
                if d < best {
                    best = d;
                    *slot = j;
                }
            }
        }

        let mut sums = alloc::vec![[0u64; 3]; centroids.len()];
        let mut counts = alloc::vec![0u64; centroids.len()];
        for (&j, entry) in membership.iter().zip(&population.entries) {
            let c = entry.color;
            sums[j][0] += u64::from(c.r) * entry.count;
            sums[j][1] += u64::from(c.g) * entry.count;
            sums[j][2] += u64::from(c.b) * entry.count;
            counts[j] += entry.count;
        }
        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            *centroid = if count == 0 {
                BLACK
            } else {
                Color8::new(
                    (sum[0] / count) as u8,
                    (sum[1] / count) as u8,
                    (sum[2] / count) as u8,
                    255,
                )
            };
        }
    }
}

/// Pixels with non-zero alpha from `surface`, downsampled to at most
/// 256x256 first.
fn sample_pixels(surface: &Surface, out: &mut Vec<Color8>) -> Result<(), RasterError> {
    let small = surface.downsampled(
        surface.width().min(SAMPLE_EDGE),
        surface.height().min(SAMPLE_EDGE),
    )?;
    if let Some(pixels) = small.rgba_pixels() {
        out.try_reserve(pixels.len())?;
        out.extend(pixels.iter().copied().filter(|c| c.a != 0));
    }
    Ok(())
}

// ── Quantizer ───────────────────────────────────────────────────────

/// Seeded palette builder.
///
/// Every palette computation starts a fresh generator from `seed`, so equal
/// inputs give equal palettes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quantizer {
    pub seed: u64,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED }
    }
}

impl Quantizer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Palette of `num_colors` entries clustered from `pixels`.
    ///
    /// Zero or one pixel yields the two entries `[pixel or black, white]`.
    pub fn palette_for_pixels(&self, pixels: &[Color8], num_colors: usize) -> Palette {
        let k = normalize_colors(num_colors);
        if pixels.len() <= 1 {
            let first = pixels.first().map_or(BLACK, |c| Color8::new(c.r, c.g, c.b, 255));
            return Palette::from_colors(alloc::vec![first, WHITE]).unwrap_or_default();
        }

        let mut rng = WyRand::new_seed(self.seed);
        let mut centroids: Vec<Color8> = (0..k)
            .map(|_| {
                let c = pixels[rng.generate_range(0..pixels.len())];
                Color8::new(c.r, c.g, c.b, 255)
            })
            .collect();

        // The population is accumulated twice over the same pixels, which
        // doubles every count and leaves the clustering unchanged.
        let mut population = Population::default();
        population.extend(pixels);
        population.extend(pixels);
        log::debug!(
            "k-means: {} pixels, {} entries, k={k}",
            pixels.len(),
            population.entries.len()
        );

        kmeans(&population, &mut centroids);
        Palette::from_colors(centroids).unwrap_or_default()
    }

    /// Palette for one surface, sampled from its visible pixels.
    pub fn palette_optimized(
        &self,
        surface: &Surface,
        num_colors: usize,
    ) -> Result<Palette, RasterError> {
        let mut pixels = Vec::new();
        sample_pixels(surface, &mut pixels)?;
        Ok(self.palette_for_pixels(&pixels, num_colors))
    }

    /// One palette pooled from every frame of `sequence`.
    ///
    /// Screens are sampled where present, parts otherwise.
    pub fn palette_for_animation(
        &self,
        sequence: &AnimationSequence,
        num_colors: usize,
    ) -> Result<Palette, RasterError> {
        let mut pixels = Vec::new();
        for (i, frame) in sequence.frames.iter().enumerate() {
            let source = match &frame.screen {
                Some(screen) => Cow::Borrowed(screen),
                None => sequence.resolved_part(i)?,
            };
            let source = match source.format() {
                PixelFormat::Indexed8 => Cow::Owned(source.to_rgba32_keyed(frame.transparent)?),
                _ => source,
            };
            sample_pixels(&source, &mut pixels)?;
        }
        Ok(self.palette_for_pixels(&pixels, num_colors))
    }

    /// Quantize to an indexed surface of at most `num_colors` colors.
    pub fn to_indexed(&self, surface: &Surface, num_colors: usize) -> Result<Surface, RasterError> {
        let palette = self.palette_optimized(surface, num_colors)?;
        reduce_colors(surface, &palette, None)
    }

    /// Quantize to 255 colors plus a transparent slot.
    ///
    /// The slot is appended at the end of the palette and every pixel with
    /// alpha 0 maps to it. Returns the surface and the slot index.
    pub fn to_indexed_keyed(&self, surface: &Surface) -> Result<(Surface, u8), RasterError> {
        let mut palette = self.palette_optimized(surface, MAX_PALETTE_COLORS - 1)?;
        let key = palette.push(BLACK)?;
        let indexed = reduce_colors(surface, &palette, Some(key))?;
        Ok((indexed, key))
    }
}

// ── Reduction ───────────────────────────────────────────────────────

fn diffuse(work: &mut [Color8], i: usize, err: Color32, num: i32) {
    let px = &mut work[i];
    px.r = clamp_channel(i32::from(px.r) + err.r * num / 16);
    px.g = clamp_channel(i32::from(px.g) + err.g * num / 16);
    px.b = clamp_channel(i32::from(px.b) + err.b * num / 16);
}

/// Map `surface` onto `palette` with Floyd–Steinberg dithering.
///
/// Pixels with alpha 0 take `transparent` when one is given and spread no
/// error; every other pixel avoids that slot. The result is an indexed surface carrying `palette`.
pub fn reduce_colors(
    surface: &Surface,
    palette: &Palette,
    transparent: Option<u8>,
) -> Result<Surface, RasterError> {
    if palette.is_empty() {
        return Err(RasterError::UnsupportedFormat(
            "cannot reduce to an empty palette".into(),
        ));
    }
    let (w, h) = (surface.width() as usize, surface.height() as usize);
    let rgba = surface.to_rgba32()?;
    let mut work: Vec<Color8> = Vec::new();
    work.try_reserve_exact(w * h)?;
    work.extend(
        rgba.pixels()
            .chunks_exact(4)
            .map(|p| Color8::new(p[0], p[1], p[2], p[3])),
    );
    let mut out = alloc_pixels(surface.width(), surface.height(), 1)?;

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let c = work[i];
            if let (0, Some(key)) = (c.a, transparent) {
                out[i] = key;
                continue;
            }
            let index = palette.nearest_index_skipping(c, transparent);
            out[i] = index;
            let p = palette.get(usize::from(index)).unwrap_or(BLACK);
            let err = Color32::new(
                i32::from(c.r) - i32::from(p.r),
                i32::from(c.g) - i32::from(p.g),
                i32::from(c.b) - i32::from(p.b),
            );
            if x + 1 < w {
                diffuse(&mut work, i + 1, err, 7);
            }
            if y + 1 < h {
                if x > 0 {
                    diffuse(&mut work, i + w - 1, err, 3);
                }
                diffuse(&mut work, i + w, err, 5);
                if x + 1 < w {
                    diffuse(&mut work, i + w + 1, err, 1);
                }
            }
        }
    }
    Surface::from_pixels(
        surface.width(),
        surface.height(),
        PixelFormat::Indexed8,
        out,
        Some(palette.clone()),
    )
}

impl Surface {
    /// Quantize with the default [`Quantizer`].
    pub fn to_indexed(&self, num_colors: usize) -> Result<Surface, RasterError> {
        Quantizer::default().to_indexed(self, num_colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(pixels: &[Color8]) -> Population {
        let mut p = Population::default();
        p.extend(pixels);
        p
    }

    #[test]
    fn trimmed_colors_merge_into_one_entry() {
        let p = population(&[
            Color8::new(0x10, 0x20, 0x30, 255),
            Color8::new(0x13, 0x21, 0x37, 255),
            Color8::new(0x80, 0x20, 0x30, 255),
        ]);
        assert_eq!(p.entries.len(), 2);
        assert_eq!(p.entries[0].count, 2);
        assert_eq!(p.entries[0].color, Color8::new(0x13, 0x21, 0x37, 255));
    }

    #[test]
    fn kmeans_weights_true_colors_by_count() {
        let mut p = population(&[Color8::new(100, 0, 0, 255); 3]);
        p.add(Color8::new(104, 0, 0, 255));
        // 100 and 104 trim to 96 and 104; both join the single centroid.
        let mut centroids = [Color8::new(0, 0, 0, 255)];
        kmeans(&p, &mut centroids);
        assert_eq!(centroids[0], Color8::new(101, 0, 0, 255));
    }

    #[test]
    fn kmeans_empty_cluster_resets_to_black() {
        let p = population(&[Color8::new(200, 200, 200, 255)]);
        let mut centroids = [Color8::new(200, 200, 200, 255), Color8::new(10, 10, 10, 255)];
        kmeans(&p, &mut centroids);
        assert_eq!(centroids[1], BLACK);
    }

    #[test]
    fn kmeans_ties_go_to_lowest_index() {
        let p = population(&[Color8::new(64, 64, 64, 255)]);
        let mut centroids = [Color8::new(40, 64, 64, 255), Color8::new(88, 64, 64, 255)];
        kmeans(&p, &mut centroids);
        assert_eq!(centroids[0], Color8::new(64, 64, 64, 255));
        assert_eq!(centroids[1], BLACK);
    }

    #[test]
    fn error_diffusion_kernel() {
        // One mid-gray pixel reduced to black pushes 7/16, 3/16, 5/16 and
        // 1/16 of its error into the neighbours.
        let mut work = alloc::vec![Color8::new(0, 0, 0, 255); 6];
        let err = Color32::new(160, 160, 160);
        diffuse(&mut work, 1, err, 7);
        diffuse(&mut work, 3, err, 3);
        diffuse(&mut work, 4, err, 5);
        diffuse(&mut work, 5, err, 1);
        let total: i32 = [1, 3, 4, 5].iter().map(|&i| i32::from(work[i].r)).sum();
        assert_eq!(work[1].r, 70);
        assert_eq!(work[3].r, 30);
        assert_eq!(work[4].r, 50);
        assert_eq!(work[5].r, 10);
        assert_eq!(total, 160);
    }

    #[test]
    fn diffusion_clamps_to_channel_range() {
        let mut work = alloc::vec![Color8::new(250, 5, 128, 255); 1];
        diffuse(&mut work, 0, Color32::new(160, -160, 0), 7);
        assert_eq!(work[0], Color8::new(255, 0, 128, 255));
    }

    #[test]
    fn num_colors_is_normalized() {
        assert_eq!(normalize_colors(0), 256);
        assert_eq!(normalize_colors(300), 256);
        assert_eq!(normalize_colors(16), 16);
    }
}
