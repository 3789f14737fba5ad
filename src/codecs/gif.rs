//! GIF: 6-byte signature + 7-byte logical screen descriptor.

use std::path::Path;

use crate::codecs::read_header;
use crate::error::{Result, SniffError};
use crate::format::{FileFormat, FormatId};
use crate::image::{ColorSpace, Image};
use crate::source::ImageSource;

const HEADER_LEN: usize = 13;

/// GIF87a / GIF89a.
#[derive(Clone, Copy, Debug, Default)]
pub struct GifFormat;

impl FileFormat for GifFormat {
    fn id(&self) -> FormatId {
        FormatId::GIF
    }

    fn extensions(&self) -> &[&str] {
        &[".gif"]
    }

    fn mime_type(&self) -> &'static str {
        "image/gif"
    }

    fn magic_len(&self) -> usize {
        4
    }

    fn matches(&self, prefix: &[u8]) -> bool {
        prefix.starts_with(b"GIF8")
    }

    fn open(&self, source: &mut ImageSource<'_>, _filename: Option<&Path>) -> Result<Image> {
        let data = read_header(source, FormatId::GIF, HEADER_LEN)?;
        if &data[..6] != b"GIF87a" && &data[..6] != b"GIF89a" {
            return Err(SniffError::InvalidHeader {
                format: FormatId::GIF,
                detail: "unknown GIF version",
            });
        }

        let width = u16::from_le_bytes([data[6], data[7]]);
        let height = u16::from_le_bytes([data[8], data[9]]);
        if width == 0 || height == 0 {
            return Err(SniffError::InvalidHeader {
                format: FormatId::GIF,
                detail: "zero dimension",
            });
        }

        // Palette entries decode to RGB; transparency comes from the GCE.
        Ok(Image::new(
            FormatId::GIF,
            ColorSpace::Rgb,
            4,
            1,
            width.into(),
            height.into(),
            true,
        ))
    }
}
