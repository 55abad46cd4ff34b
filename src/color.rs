//! Color values and the small arithmetic shared by the quantizer and
//! compositor.

use rgb::{RGB, RGBA8};

/// 8-bit color with straight alpha.
pub type Color8 = RGBA8;

/// Wide accumulator color used while averaging clusters.
pub type Color32 = RGB<i32>;

/// Fully transparent black.
pub const TRANSPARENT: Color8 = RGBA8::new(0, 0, 0, 0);

/// Opaque black.
pub const BLACK: Color8 = RGBA8::new(0, 0, 0, 255);

/// Opaque white.
pub const WHITE: Color8 = RGBA8::new(255, 255, 255, 255);

/// Keep the top five bits of each color channel; alpha becomes 0.
///
/// Two colors with the same trimmed value are the same k-means entry.
#[inline]
pub fn trim_color(color: Color8) -> Color8 {
    RGBA8::new(color.r & 0xF8, color.g & 0xF8, color.b & 0xF8, 0)
}

/// Squared RGB distance; alpha is ignored.
#[inline]
pub fn color_distance(a: Color8, b: Color8) -> i32 {
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    dr * dr + dg * dg + db * db
}

/// Squared RGBA distance.
#[inline]
pub fn color_distance_alpha(a: Color8, b: Color8) -> i32 {
    let da = i32::from(a.a) - i32::from(b.a);
    color_distance(a, b) + da * da
}

/// Clamp an integer channel value into 0..=255.
#[inline]
pub fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Average of the three color channels, the gray level used throughout.
#[inline]
pub(crate) fn gray_level(c: Color8) -> u8 {
    ((u32::from(c.r) + u32::from(c.g) + u32::from(c.b)) / 3) as u8
}
