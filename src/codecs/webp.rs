//! WebP: RIFF header (12) + first chunk header (8) + sub-format header.
//!
//! Three sub-formats at offset 12:
//! - VP8X (extended): flags at byte 20, canvas dimensions at 24..30 (24-bit LE, +1)
//! - VP8  (lossy): keyframe start code at 23..26, dimensions at 26..30 (LE u16, low 14 bits)
//! - VP8L (lossless): signature 0x2F at byte 20, dimensions bit-packed in bytes 21..25

use std::path::Path;

use crate::error::{Result, SniffError};
use crate::format::{FileFormat, FormatId};
use crate::image::{ColorSpace, Image};
use crate::source::ImageSource;

const MAGIC_LEN: usize = 16;
const HEADER_LEN: usize = 30;

/// WebP (lossy, lossless and extended).
#[derive(Clone, Copy, Debug, Default)]
pub struct WebpFormat;

impl FileFormat for WebpFormat {
    fn id(&self) -> FormatId {
        FormatId::WEBP
    }

    fn extensions(&self) -> &[&str] {
        &[".webp"]
    }

    fn mime_type(&self) -> &'static str {
        "image/webp"
    }

    fn magic_len(&self) -> usize {
        MAGIC_LEN
    }

    fn matches(&self, prefix: &[u8]) -> bool {
        prefix.len() >= MAGIC_LEN
            && &prefix[..4] == b"RIFF"
            && &prefix[8..12] == b"WEBP"
            && &prefix[12..15] == b"VP8"
            && matches!(prefix[15], b' ' | b'X' | b'L')
    }

    fn open(&self, source: &mut ImageSource<'_>, _filename: Option<&Path>) -> Result<Image> {
        let data = source
            .read_bytes(HEADER_LEN)
            .map_err(|e| SniffError::from_header_read(FormatId::WEBP, e))?;
        if !self.matches(data) {
            return Err(invalid("not a RIFF/WEBP container"));
        }

        let (width, height, has_alpha) = match &data[12..16] {
            b"VP8X" => {
                require(data, 30)?;
                let has_alpha = data[20] & 0x10 != 0;
                let width = u32::from_le_bytes([data[24], data[25], data[26], 0]) + 1;
                let height = u32::from_le_bytes([data[27], data[28], data[29], 0]) + 1;
                (width, height, has_alpha)
            }
            b"VP8 " => {
                require(data, 30)?;
                if data[23..26] != [0x9Du8, 0x01, 0x2A] {
                    return Err(invalid("missing VP8 keyframe start code"));
                }
                let width = u16::from_le_bytes([data[26], data[27]]) & 0x3FFF;
                let height = u16::from_le_bytes([data[28], data[29]]) & 0x3FFF;
                (width.into(), height.into(), false)
            }
            _ => {
                require(data, 25)?;
                if data[20] != 0x2F {
                    return Err(invalid("missing VP8L signature"));
                }
                let bits = u32::from_le_bytes([data[21], data[22], data[23], data[24]]);
                let width = (bits & 0x3FFF) + 1;
                let height = ((bits >> 14) & 0x3FFF) + 1;
                let has_alpha = (bits >> 28) & 1 != 0;
                (width, height, has_alpha)
            }
        };

        if width == 0 || height == 0 {
            return Err(invalid("zero dimension"));
        }

        let channels = if has_alpha { 4 } else { 3 };
        Ok(Image::new(
            FormatId::WEBP,
            ColorSpace::Rgb,
            channels,
            1,
            width,
            height,
            has_alpha,
        ))
    }
}

fn require(data: &[u8], len: usize) -> Result<()> {
    if data.len() < len {
        return Err(invalid("truncated header"));
    }
    Ok(())
}

fn invalid(detail: &'static str) -> SniffError {
    SniffError::InvalidHeader {
        format: FormatId::WEBP,
        detail,
    }
}
