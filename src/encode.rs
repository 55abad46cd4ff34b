use alloc::vec::Vec;

use crate::anim::AnimationSequence;
use crate::error::RasterError;
use crate::format::ImageType;
use crate::quantize::Quantizer;
use crate::surface::Surface;
use crate::{bmp, gif, png};

const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Encode request builder.
///
/// ```no_run
/// use zenraster::{EncodeRequest, PixelFormat, Surface};
///
/// let surface = Surface::checkerboard(64, 64, PixelFormat::Rgb24)?;
/// let bmp = EncodeRequest::bmp().with_dpi(96.0).encode(&surface)?;
/// let gif = EncodeRequest::gif().encode(&surface)?;
/// # Ok::<(), zenraster::RasterError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    format: ImageType,
    dpi: f32,
    quality: u8,
    progressive: bool,
    transparent: Option<u8>,
    quantizer: Quantizer,
}

impl EncodeRequest {
    pub fn new(format: ImageType) -> Self {
        Self {
            format,
            dpi: 0.0,
            quality: DEFAULT_JPEG_QUALITY,
            progressive: false,
            transparent: None,
            quantizer: Quantizer::default(),
        }
    }

    pub fn bmp() -> Self {
        Self::new(ImageType::Bmp)
    }

    pub fn gif() -> Self {
        Self::new(ImageType::Gif)
    }

    pub fn png() -> Self {
        Self::new(ImageType::Png)
    }

    pub fn apng() -> Self {
        Self::new(ImageType::Apng)
    }

    pub fn jpeg() -> Self {
        Self::new(ImageType::Jpeg)
    }

    pub fn tiff() -> Self {
        Self::new(ImageType::Tiff)
    }

    pub fn format(&self) -> ImageType {
        self.format
    }

    /// Resolution to store, in dots per inch. 0 writes none.
    /// GIF has no resolution field and ignores it.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// JPEG quality, clamped to 1..=100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Progressive JPEG.
    pub fn with_progressive(mut self, progressive: bool) -> Self {
        self.progressive = progressive;
        self
    }

    /// Palette index written as transparent for indexed GIF and PNG output.
    pub fn with_transparent(mut self, transparent: Option<u8>) -> Self {
        self.transparent = transparent;
        self
    }

    /// Quantizer used when GIF output needs a palette.
    pub fn with_quantizer(mut self, quantizer: Quantizer) -> Self {
        self.quantizer = quantizer;
        self
    }

    /// Encode a still image.
    ///
    /// For [`ImageType::Apng`] the surface is written as a single-frame
    /// animation.
    pub fn encode(&self, surface: &Surface) -> Result<Vec<u8>, RasterError> {
        log::debug!(
            "encoding {}x{} {:?} as {:?}",
            surface.width(),
            surface.height(),
            surface.format(),
            self.format
        );
        match self.format {
            ImageType::Bmp => bmp::encode(surface, self.dpi),
            ImageType::Gif => gif::encode_still(surface, self.transparent, &self.quantizer),
            ImageType::Png => png::encode(surface, self.dpi, self.transparent),
            ImageType::Apng => {
                let mut seq = AnimationSequence::new(surface.width(), surface.height());
                seq.push(
                    crate::anim::AnimationFrame::new(surface.clone())
                        .with_transparent(self.transparent),
                );
                png::encode_animation(&seq)
            }
            #[cfg(feature = "jpeg")]
            ImageType::Jpeg => {
                crate::jpeg::encode(surface, self.dpi, self.quality, self.progressive)
            }
            #[cfg(feature = "tiff")]
            ImageType::Tiff => crate::tiff::encode(surface, self.dpi),
            #[allow(unreachable_patterns)]
            other => Err(RasterError::UnsupportedFormat(alloc::format!(
                "{other:?} support not enabled"
            ))),
        }
    }

    /// Encode an animation as GIF or APNG.
    ///
    /// A PNG request writes APNG. Other formats are
    /// [`RasterError::UnsupportedFormat`].
    pub fn encode_animation(&self, seq: &AnimationSequence) -> Result<Vec<u8>, RasterError> {
        log::debug!(
            "encoding {}x{} animation, {} frames, as {:?}",
            seq.width,
            seq.height,
            seq.len(),
            self.format
        );
        match self.format {
            ImageType::Gif => gif::encode_animation(seq, &self.quantizer),
            ImageType::Png | ImageType::Apng => png::encode_animation(seq),
            other => Err(RasterError::UnsupportedFormat(alloc::format!(
                "{other:?} cannot hold an animation"
            ))),
        }
    }
}
