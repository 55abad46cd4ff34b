//! Image container types: file extensions, MIME types and magic bytes.

use std::path::Path;

/// A supported container.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageType {
    Jpeg,
    Gif,
    Png,
    /// Animated PNG.
    Apng,
    Tiff,
    Bmp,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

impl ImageType {
    pub const ALL: [ImageType; 6] = [
        Self::Jpeg,
        Self::Gif,
        Self::Png,
        Self::Apng,
        Self::Tiff,
        Self::Bmp,
    ];

    /// Type for a file extension, with or without the leading dot.
    /// Matching ignores ASCII case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpe" | "jpeg" | "jfif" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            "apng" => Some(Self::Apng),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" | "dib" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Type from the extension of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Type for a MIME type. Parameters after `;` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|t| t.mime().eq_ignore_ascii_case(essence))
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
            Self::Apng => "image/apng",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
        }
    }

    /// Preferred file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Apng => "apng",
            Self::Tiff => "tif",
            Self::Bmp => "bmp",
        }
    }

    /// File dialog pattern list, e.g. `*.tif;*.tiff`.
    pub fn wildcards(self) -> &'static str {
        match self {
            Self::Jpeg => "*.jpg;*.jpe;*.jpeg;*.jfif",
            Self::Gif => "*.gif",
            Self::Png => "*.png",
            Self::Apng => "*.png;*.apng",
            Self::Tiff => "*.tif;*.tiff",
            Self::Bmp => "*.bmp;*.dib",
        }
    }

    /// Sniff the container from its leading bytes.
    ///
    /// A PNG with an `acTL` chunk before its first `IDAT` is [`Self::Apng`].
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if data.starts_with(&PNG_SIGNATURE) {
            Some(if has_actl(data) { Self::Apng } else { Self::Png })
        } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if data.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }
}

/// Walk PNG chunks up to the first `IDAT`, looking for `acTL`.
fn has_actl(data: &[u8]) -> bool {
    let mut pos = PNG_SIGNATURE.len();
    while let Some(header) = pos.checked_add(8).and_then(|end| data.get(pos..end)) {
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        match &header[4..8] {
            b"acTL" => return true,
            b"IDAT" | b"IEND" => return false,
            _ => {}
        }
        // length + type + data + crc
        pos = match pos.checked_add(12).and_then(|p| p.checked_add(len)) {
            Some(p) => p,
            None => return false,
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(kind: &[u8; 4], len: u32) -> Vec<u8> {
        let mut out = len.to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.resize(out.len() + len as usize + 4, 0);
        out
    }

    fn png(chunks: &[(&[u8; 4], u32)]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        for (kind, len) in chunks {
            out.extend(chunk(kind, *len));
        }
        out
    }

    #[test]
    fn actl_before_idat_is_apng() {
        let data = png(&[(b"IHDR", 13), (b"acTL", 8), (b"IDAT", 4), (b"IEND", 0)]);
        assert_eq!(ImageType::detect(&data), Some(ImageType::Apng));
    }

    #[test]
    fn actl_after_idat_is_ignored() {
        let data = png(&[(b"IHDR", 13), (b"IDAT", 4), (b"acTL", 8), (b"IEND", 0)]);
        assert_eq!(ImageType::detect(&data), Some(ImageType::Png));
    }

    #[test]
    fn oversized_chunk_length_stops_the_walk() {
        let mut data = png(&[(b"IHDR", 13)]);
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        data.extend_from_slice(b"tEXt");
        assert_eq!(ImageType::detect(&data), Some(ImageType::Png));
    }
}
