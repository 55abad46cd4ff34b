//! # zenraster
//!
//! Raster image toolkit: one owned bitmap type, codecs for six containers,
//! palette quantization and an animation compositor shared by GIF and APNG.
//!
//! ## Supported Formats
//!
//! - **BMP**: 8, 24 and 32 bits per pixel, read and write, with resolution
//! - **GIF**: stills and animations via the `gif` crate
//! - **PNG / APNG**: via the `png` crate, including `acTL`/`fcTL` animation
//! - **JPEG** (`jpeg` feature): `zune-jpeg` decode, `jpeg-encoder` encode
//! - **TIFF** (`tiff` feature): 8-bit gray, RGB and RGBA
//!
//! ## Animation
//!
//! An [`AnimationSequence`] holds per-frame deltas (parts). With
//! [`DecodeRequest::with_screens`] every frame also gets its composited
//! screen, built by applying blend and disposal in order. Encoding goes the
//! other way: GIF output quantizes RGBA content into palettes, APNG output
//! writes RGBA frames directly.
//!
//! ## Quantization
//!
//! [`Quantizer`] builds palettes with seeded k-means over a trimmed color
//! population; [`reduce_colors`] maps a surface onto a palette with
//! Floyd–Steinberg error diffusion.
//!
//! ## Non-Goals
//!
//! - Color management
//! - GPU or platform blitting (see [`BlendBackend`] for plugging one in)
//! - Writing multi-page TIFF
//!
//! ## Usage
//!
//! ```no_run
//! use zenraster::{DecodeRequest, Decoded, EncodeRequest};
//!
//! let data: &[u8] = &[]; // any supported container
//!
//! match DecodeRequest::new(data).with_screens(true).decode()? {
//!     Decoded::Image(image) => {
//!         let png = EncodeRequest::png()
//!             .with_dpi(image.dpi())
//!             .encode(image.surface())?;
//!         # let _ = png;
//!     }
//!     Decoded::Animation(seq) => {
//!         let gif = EncodeRequest::gif().encode_animation(&seq)?;
//!         # let _ = gif;
//!     }
//! }
//! # Ok::<(), zenraster::RasterError>(())
//! ```

#![forbid(unsafe_code)]

extern crate alloc;

mod anim;
mod color;
mod composite;
mod error;
mod format;
mod limits;
mod palette;
mod pixel;
mod quantize;
mod surface;
mod transform;

mod bmp;
mod gif;
mod png;

#[cfg(feature = "jpeg")]
mod jpeg;

#[cfg(feature = "tiff")]
mod tiff;

mod decode;
mod encode;
pub mod fs;

// Re-exports
pub use anim::convert::{apng_from_gif, gif_from_apng};
pub use anim::{AnimationFrame, AnimationSequence, Blend, Disposal, ReconstructOptions};
pub use color::{
    BLACK, Color8, Color32, TRANSPARENT, WHITE, clamp_channel, color_distance,
    color_distance_alpha, trim_color,
};
pub use composite::{BlendBackend, Compositor, SoftwareBlend};
pub use decode::{DecodeRequest, Decoded, Image};
pub use encode::EncodeRequest;
pub use error::RasterError;
pub use format::ImageType;
pub use limits::Limits;
pub use palette::{MAX_PALETTE_COLORS, Palette};
pub use pixel::PixelFormat;
pub use quantize::{Quantizer, reduce_colors};
pub use surface::{Region, Surface};
