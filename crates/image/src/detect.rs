//! Byte-signature sniffing.
//!
//! Only the leading bytes are inspected; nothing is decoded. The result
//! decides the `Content-Type` of passthrough responses, independently of
//! whatever extension the request path declares.

use crate::{ImageError, Result};

/// Sentinel returned when neither a signature nor an extension is known.
pub const UNKNOWN: &str = "unknown";

/// Shortest input worth sniffing.
const MIN_SNIFF_LEN: usize = 4;

/// Formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// WebP image
    WebP,
    /// BMP image
    Bmp,
    /// TIFF image
    Tiff,
    /// AVIF image
    Avif,
    /// HEIC/HEIF image
    Heic,
}

/// Fixed prefixes, checked in order.
const PREFIXES: &[(&[u8], ImageFormat)] = &[
    (&[0xFF, 0xD8, 0xFF], ImageFormat::Jpeg),
    (b"\x89PNG\r\n\x1a\n", ImageFormat::Png),
    (b"GIF87a", ImageFormat::Gif),
    (b"GIF89a", ImageFormat::Gif),
    (b"II*\x00", ImageFormat::Tiff),
    (b"MM\x00*", ImageFormat::Tiff),
    (b"BM", ImageFormat::Bmp),
];

impl ImageFormat {
    /// Signature name, as reported in passthrough `Content-Type` headers.
    pub fn name(&self) -> &'static str {
        self.info().0
    }

    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        self.info().1
    }

    /// File extensions commonly used for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        self.info().2
    }

    fn info(&self) -> (&'static str, &'static str, &'static [&'static str]) {
        match self {
            Self::Jpeg => ("jpeg", "image/jpeg", &["jpg", "jpeg"]),
            Self::Png => ("png", "image/png", &["png"]),
            Self::Gif => ("gif", "image/gif", &["gif"]),
            Self::WebP => ("webp", "image/webp", &["webp"]),
            Self::Bmp => ("bmp", "image/bmp", &["bmp"]),
            Self::Tiff => ("tiff", "image/tiff", &["tiff", "tif"]),
            Self::Avif => ("avif", "image/avif", &["avif"]),
            Self::Heic => ("heic", "image/heic", &["heic", "heif"]),
        }
    }
}

/// Identify the container format from its magic bytes.
///
/// Fails with [`ImageError::InvalidData`] on inputs shorter than four bytes
/// and with [`ImageError::UnknownFormat`] when nothing matches.
///
/// ```
/// use pixfront_image::{ImageFormat, detect_format};
///
/// let png_data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// assert_eq!(detect_format(&png_data).unwrap(), ImageFormat::Png);
/// ```
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < MIN_SNIFF_LEN {
        return Err(ImageError::InvalidData(format!(
            "need at least {MIN_SNIFF_LEN} bytes to sniff, got {}",
            data.len()
        )));
    }

    if let Some((_, format)) = PREFIXES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return Ok(*format);
    }

    riff_or_bmff(data).ok_or(ImageError::UnknownFormat)
}

/// Name of the sniffed format, or [`UNKNOWN`] when nothing matches.
pub fn sniff_signature(data: &[u8]) -> &'static str {
    detect_format(data).map_or(UNKNOWN, |format| format.name())
}

/// Containers whose identifying tag sits at offset 8: `RIFF....WEBP` and
/// ISO-BMFF `....ftyp<brand>`.
fn riff_or_bmff(data: &[u8]) -> Option<ImageFormat> {
    let tag = data.get(8..12)?;

    if data.starts_with(b"RIFF") && tag == b"WEBP" {
        return Some(ImageFormat::WebP);
    }

    if &data[4..8] == b"ftyp" {
        return match tag {
            b"avif" | b"avis" => Some(ImageFormat::Avif),
            b"heic" | b"heix" | b"mif1" | b"msf1" => Some(ImageFormat::Heic),
            _ => None,
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_signatures() {
        let cases: &[(&[u8], ImageFormat)] = &[
            (&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F'], ImageFormat::Jpeg),
            (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00], ImageFormat::Png),
            (b"GIF87a\x01\x00", ImageFormat::Gif),
            (b"GIF89a\x01\x00", ImageFormat::Gif),
            (b"RIFF\x24\x00\x00\x00WEBPVP8 ", ImageFormat::WebP),
            (b"BM\x36\x00\x00\x00", ImageFormat::Bmp),
            (b"II*\x00\x08\x00", ImageFormat::Tiff),
            (b"MM\x00*\x00\x08", ImageFormat::Tiff),
            (b"\x00\x00\x00\x1Cftypavif\x00\x00", ImageFormat::Avif),
            (b"\x00\x00\x00\x18ftypmif1\x00\x00", ImageFormat::Heic),
        ];

        for (data, expected) in cases {
            assert_eq!(detect_format(data).unwrap(), *expected, "{data:02X?}");
        }
    }

    #[test]
    fn test_riff_without_webp_tag() {
        assert!(matches!(
            detect_format(b"RIFF\x24\x00\x00\x00WAVEfmt "),
            Err(ImageError::UnknownFormat)
        ));
    }

    #[test]
    fn test_short_input_is_invalid() {
        assert!(matches!(detect_format(b"BM"), Err(ImageError::InvalidData(_))));
    }

    #[test]
    fn test_sniff_signature_falls_back_to_unknown() {
        assert_eq!(sniff_signature(b"GIF87a...."), "gif");
        assert_eq!(sniff_signature(b"<svg xmlns"), UNKNOWN);
        assert_eq!(sniff_signature(b""), UNKNOWN);
    }

    #[test]
    fn test_format_info() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Jpeg.extensions(), &["jpg", "jpeg"]);
        assert_eq!(ImageFormat::Tiff.name(), "tiff");
    }

    #[test]
    fn test_serialized_name_matches_signature_name() {
        for format in [ImageFormat::Jpeg, ImageFormat::WebP, ImageFormat::Heic] {
            let json = serde_json::to_value(format).unwrap();
            assert_eq!(json, format.name());
        }
        let parsed: ImageFormat = serde_json::from_str("\"webp\"").unwrap();
        assert_eq!(parsed, ImageFormat::WebP);
    }
}
