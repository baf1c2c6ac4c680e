//! Image format sniffing for decoded payloads.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Identify an image from its magic bytes. Unknown data is treated as
    /// PNG, which is what every supported model returns by default.
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => ImageFormat::Jpeg,
            [0x89, 0x50, 0x4E, 0x47, ..] => ImageFormat::Png,
            [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => ImageFormat::Webp,
            _ => {
                tracing::warn!(
                    "Unrecognized image format (first 4 bytes: {:02X?}), assuming PNG",
                    &bytes[..bytes.len().min(4)]
                );
                ImageFormat::Png
            }
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}
