use alloc::string::String;

/// Errors from decoding, encoding, and manipulating raster images.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RasterError {
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailure { bytes: usize },

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<alloc::collections::TryReserveError> for RasterError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        RasterError::AllocationFailure { bytes: 0 }
    }
}

impl From<::gif::DecodingError> for RasterError {
    fn from(e: ::gif::DecodingError) -> Self {
        RasterError::Decode(alloc::format!("gif: {e}"))
    }
}

impl From<::gif::EncodingError> for RasterError {
    fn from(e: ::gif::EncodingError) -> Self {
        RasterError::Encode(alloc::format!("gif: {e}"))
    }
}

impl From<::png::DecodingError> for RasterError {
    fn from(e: ::png::DecodingError) -> Self {
        RasterError::Decode(alloc::format!("png: {e}"))
    }
}

impl From<::png::EncodingError> for RasterError {
    fn from(e: ::png::EncodingError) -> Self {
        RasterError::Encode(alloc::format!("png: {e}"))
    }
}

#[cfg(feature = "tiff")]
impl From<::tiff::TiffError> for RasterError {
    fn from(e: ::tiff::TiffError) -> Self {
        RasterError::Decode(alloc::format!("tiff: {e}"))
    }
}

#[cfg(feature = "jpeg")]
impl From<zune_jpeg::errors::DecodeErrors> for RasterError {
    fn from(e: zune_jpeg::errors::DecodeErrors) -> Self {
        RasterError::Decode(alloc::format!("jpeg: {e:?}"))
    }
}

#[cfg(feature = "jpeg")]
impl From<jpeg_encoder::EncodingError> for RasterError {
    fn from(e: jpeg_encoder::EncodingError) -> Self {
        RasterError::Encode(alloc::format!("jpeg: {e}"))
    }
}
