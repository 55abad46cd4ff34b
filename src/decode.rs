use crate::anim::{AnimationSequence, ReconstructOptions};
use crate::composite::Compositor;
use crate::error::RasterError;
use crate::format::ImageType;
use crate::limits::Limits;
use crate::surface::Surface;
use crate::{bmp, gif, png};

/// A decoded still image.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    surface: Surface,
    dpi: f32,
    transparent: Option<u8>,
}

impl Image {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            dpi: 0.0,
            transparent: None,
        }
    }

    /// Resolution in dots per inch; 0 means unknown.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Palette index that reads as fully transparent.
    pub fn with_transparent(mut self, transparent: Option<u8>) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn into_surface(self) -> Surface {
        self.surface
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    pub fn transparent(&self) -> Option<u8> {
        self.transparent
    }

    /// RGBA copy with the transparency key applied.
    pub fn to_rgba32(&self) -> Result<Surface, RasterError> {
        self.surface.to_rgba32_keyed(self.transparent)
    }
}

/// Result of [`DecodeRequest::decode`].
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    Image(Image),
    Animation(AnimationSequence),
}

impl Decoded {
    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Self::Image(image) => Some(image),
            Self::Animation(_) => None,
        }
    }

    pub fn as_animation(&self) -> Option<&AnimationSequence> {
        match self {
            Self::Image(_) => None,
            Self::Animation(seq) => Some(seq),
        }
    }

    pub fn into_animation(self) -> Option<AnimationSequence> {
        match self {
            Self::Image(_) => None,
            Self::Animation(seq) => Some(seq),
        }
    }
}

/// Decode request builder.
///
/// ```no_run
/// use zenraster::{DecodeRequest, Decoded};
///
/// let data: &[u8] = &[]; // GIF, PNG, APNG, BMP, JPEG or TIFF bytes
/// match DecodeRequest::new(data).with_screens(true).decode()? {
///     Decoded::Image(image) => {
///         println!("{}x{}", image.surface().width(), image.surface().height())
///     }
///     Decoded::Animation(seq) => println!("{} frames", seq.len()),
/// }
/// # Ok::<(), zenraster::RasterError>(())
/// ```
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    screens: bool,
    animation: bool,
    strict_restore: bool,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            limits: None,
            screens: false,
            animation: true,
            strict_restore: false,
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Composite every animation frame into its screen snapshot.
    pub fn with_screens(mut self, screens: bool) -> Self {
        self.screens = screens;
        self
    }

    /// Return animated GIF and APNG as [`Decoded::Animation`] (default).
    /// When off, only the first image is decoded.
    pub fn with_animation(mut self, animation: bool) -> Self {
        self.animation = animation;
        self
    }

    /// See [`ReconstructOptions::strict_restore`].
    pub fn with_strict_restore(mut self, strict: bool) -> Self {
        self.strict_restore = strict;
        self
    }

    /// Sniff the container and decode it.
    pub fn decode(self) -> Result<Decoded, RasterError> {
        let format = ImageType::detect(self.data).ok_or(RasterError::UnrecognizedFormat)?;
        self.decode_as(format)
    }

    /// Decode as `format` without sniffing.
    pub fn decode_as(self, format: ImageType) -> Result<Decoded, RasterError> {
        log::debug!("decoding {} bytes as {format:?}", self.data.len());
        match format {
            ImageType::Gif => {
                let seq = gif::decode_animation(self.data, self.limits)?;
                if self.animation && seq.len() > 1 {
                    self.finish_animation(seq)
                } else {
                    gif::decode_still(&seq).map(Decoded::Image)
                }
            }
            ImageType::Png | ImageType::Apng => {
                if self.animation && png::is_animated(self.data)? {
                    let seq = png::decode_animation(self.data, self.limits)?;
                    self.finish_animation(seq)
                } else {
                    png::decode(self.data, self.limits).map(Decoded::Image)
                }
            }
            ImageType::Bmp => bmp::decode(self.data, self.limits).map(Decoded::Image),
            #[cfg(feature = "jpeg")]
            ImageType::Jpeg => crate::jpeg::decode(self.data, self.limits).map(Decoded::Image),
            #[cfg(feature = "tiff")]
            ImageType::Tiff => crate::tiff::decode(self.data, self.limits).map(Decoded::Image),
            #[allow(unreachable_patterns)]
            other => Err(RasterError::UnsupportedFormat(alloc::format!(
                "{other:?} support not enabled"
            ))),
        }
    }

    fn finish_animation(&self, mut seq: AnimationSequence) -> Result<Decoded, RasterError> {
        if self.screens {
            let options = ReconstructOptions {
                strict_restore: self.strict_restore,
            };
            seq.reconstruct_screens(&Compositor::new(), &options)?;
        }
        Ok(Decoded::Animation(seq))
    }
}
