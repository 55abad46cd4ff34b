/// Pixel memory layout of a [`Surface`](crate::Surface).
///
/// Rows are top-down and tightly packed; channels are in R, G, B(, A) order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 byte per pixel, an index into the surface palette.
    Indexed8,
    /// 3 channels, 8-bit RGB.
    Rgb24,
    /// 4 channels, 8-bit RGBA (straight alpha).
    Rgba32,
}

impl PixelFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Indexed8 => 1,
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
        }
    }

    /// Bits per pixel (8, 24 or 32).
    pub fn bits_per_pixel(&self) -> u16 {
        self.bytes_per_pixel() as u16 * 8
    }

    /// Whether pixels carry their own alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba32)
    }

    /// Whether pixels are palette indices.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed8)
    }

    /// Format for a bits-per-pixel value, as stored in BMP headers.
    pub(crate) fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Self::Indexed8),
            24 => Some(Self::Rgb24),
            32 => Some(Self::Rgba32),
            _ => None,
        }
    }
}
