//! PNG: 8-byte signature + IHDR chunk (4 len + 4 type + 13 data + 4 CRC).

use std::path::Path;

use crate::codecs::read_header;
use crate::error::{Result, SniffError};
use crate::format::{FileFormat, FormatId};
use crate::image::{ColorSpace, Image};
use crate::source::ImageSource;

/// The PNG file signature.
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const HEADER_LEN: usize = 33;

/// Portable Network Graphics.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngFormat;

impl FileFormat for PngFormat {
    fn id(&self) -> FormatId {
        FormatId::PNG
    }

    fn extensions(&self) -> &[&str] {
        &[".png"]
    }

    fn mime_type(&self) -> &'static str {
        "image/png"
    }

    fn magic_len(&self) -> usize {
        SIGNATURE.len()
    }

    fn matches(&self, prefix: &[u8]) -> bool {
        prefix == SIGNATURE
    }

    fn open(&self, source: &mut ImageSource<'_>, _filename: Option<&Path>) -> Result<Image> {
        let invalid = |detail| SniffError::InvalidHeader {
            format: FormatId::PNG,
            detail,
        };

        let data = read_header(source, FormatId::PNG, HEADER_LEN)?;
        if data[..8] != SIGNATURE {
            return Err(invalid("bad signature"));
        }
        if &data[12..16] != b"IHDR" {
            return Err(invalid("first chunk is not IHDR"));
        }

        let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        let bit_depth = data[24];
        let color_type = data[25];

        if width == 0 || height == 0 {
            return Err(invalid("zero dimension"));
        }

        let (color_space, channels, has_alpha) = match color_type {
            0 => (ColorSpace::Gray, 1, false),
            2 => (ColorSpace::Rgb, 3, false),
            // Palette entries expand to RGB.
            3 => (ColorSpace::Rgb, 3, false),
            4 => (ColorSpace::Gray, 2, true),
            6 => (ColorSpace::Rgb, 4, true),
            _ => return Err(invalid("unknown color type")),
        };
        let component_size = if bit_depth == 16 { 2 } else { 1 };

        Ok(Image::new(
            FormatId::PNG,
            color_space,
            channels,
            component_size,
            width,
            height,
            has_alpha,
        ))
    }
}
