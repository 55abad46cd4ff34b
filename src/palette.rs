//! Ordered color tables for indexed surfaces.

use alloc::vec::Vec;

use crate::color::{Color8, color_distance};
use crate::error::RasterError;

/// Maximum number of entries in a palette.
pub const MAX_PALETTE_COLORS: usize = 256;

/// An ordered table of up to 256 colors. The index of a color is its key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Palette {
    colors: Vec<Color8>,
}

impl Palette {
    /// Empty palette.
    pub fn new() -> Self {
        Self { colors: Vec::new() }
    }

    /// Palette from a list of colors. Fails for more than 256 entries.
    pub fn from_colors(colors: impl Into<Vec<Color8>>) -> Result<Self, RasterError> {
        let colors = colors.into();
        if colors.len() > MAX_PALETTE_COLORS {
            return Err(RasterError::UnsupportedFormat(alloc::format!(
                "palette of {} colors exceeds {MAX_PALETTE_COLORS}",
                colors.len()
            )));
        }
        Ok(Self { colors })
    }

    /// Palette from packed `R,G,B` triples, as stored by GIF and PNG.
    ///
    /// Entries past 256 and a trailing partial triple are ignored.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Self {
        if bytes.len() % 3 != 0 || bytes.len() > MAX_PALETTE_COLORS * 3 {
            log::warn!("palette of {} bytes truncated", bytes.len());
        }
        let colors = bytes
            .chunks_exact(3)
            .take(MAX_PALETTE_COLORS)
            .map(|c| Color8::new(c[0], c[1], c[2], 255))
            .collect();
        Self { colors }
    }

    /// Packed `R,G,B` triples.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }

    /// 256 gray levels, index `i` is `(i, i, i)`.
    pub fn grayscale() -> Self {
        let colors = (0..=255u8).map(|v| Color8::new(v, v, v, 255)).collect();
        Self { colors }
    }

    /// The 216-color web-safe cube, followed by 40 grays unless `web_safe`.
    pub fn fixed(web_safe: bool) -> Self {
        let mut colors = Vec::with_capacity(MAX_PALETTE_COLORS);
        for r in (0..=0xFFu16).step_by(0x33) {
            for g in (0..=0xFFu16).step_by(0x33) {
                for b in (0..=0xFFu16).step_by(0x33) {
                    colors.push(Color8::new(r as u8, g as u8, b as u8, 255));
                }
            }
        }
        if !web_safe {
            for j in 0..40u32 {
                let v = (j * 0xFF / 40) as u8;
                colors.push(Color8::new(v, v, v, 255));
            }
        }
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color8] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<Color8> {
        self.colors.get(index).copied()
    }

    /// Append a color, returning its index.
    pub fn push(&mut self, color: Color8) -> Result<u8, RasterError> {
        if self.colors.len() >= MAX_PALETTE_COLORS {
            return Err(RasterError::UnsupportedFormat(
                "palette already holds 256 colors".into(),
            ));
        }
        self.colors.push(color);
        Ok((self.colors.len() - 1) as u8)
    }

    /// Index of the closest color by squared RGB distance.
    ///
    /// Ties resolve to the lowest index and an exact match stops the scan.
    /// An empty palette yields 0.
    pub fn nearest_index(&self, color: Color8) -> u8 {
        self.nearest_index_skipping(color, None)
    }

    /// [`Palette::nearest_index`] that never returns `skip`, so opaque
    /// pixels cannot land on a transparent slot.
    pub(crate) fn nearest_index_skipping(&self, color: Color8, skip: Option<u8>) -> u8 {
        let mut nearest = None;
        let mut best = 255 * 255 * 3 + 1;
        for (i, &entry) in self.colors.iter().enumerate() {
            if skip.is_some_and(|k| usize::from(k) == i) {
                continue;
            }
            let d = color_distance(entry, color);
            if d < best {
                nearest = Some(i);
                best = d;
                if d == 0 {
                    break;
                }
            }
        }
        nearest.or(skip.map(usize::from)).unwrap_or(0) as u8
    }

    /// Exchange two entries. Returns false, changing nothing, when either
    /// index is out of range.
    pub(crate) fn swap(&mut self, a: u8, b: u8) -> bool {
        let (a, b) = (usize::from(a), usize::from(b));
        if a.max(b) >= self.colors.len() {
            return false;
        }
        self.colors.swap(a, b);
        true
    }

    /// Drop trailing entries that repeat their predecessor's RGB value.
    ///
    /// Stops at the first differing pair, or when the duplicate sits at the
    /// `transparent` index.
    pub fn shrink(&mut self, transparent: Option<u8>) {
        let mut i = self.colors.len();
        while i > 1 {
            i -= 1;
            let (a, b) = (self.colors[i], self.colors[i - 1]);
            if (a.r, a.g, a.b) != (b.r, b.g, b.b) || transparent.map(usize::from) == Some(i) {
                break;
            }
            self.colors.truncate(i);
        }
    }
}
