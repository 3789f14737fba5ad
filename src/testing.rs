//! Shared fixtures for unit tests.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::format::{FileFormat, FormatId};
use crate::image::{ColorSpace, Image};
use crate::source::ImageSource;

/// Format matching a fixed magic prefix. Opening yields a 1x1 RGB image.
pub(crate) struct MagicFormat {
    pub id: &'static str,
    pub extensions: &'static [&'static str],
    pub magic: &'static [u8],
}

impl MagicFormat {
    pub(crate) fn arc(
        id: &'static str,
        extensions: &'static [&'static str],
        magic: &'static [u8],
    ) -> Arc<dyn FileFormat> {
        Arc::new(MagicFormat {
            id,
            extensions,
            magic,
        })
    }
}

impl FileFormat for MagicFormat {
    fn id(&self) -> FormatId {
        FormatId::new(self.id)
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }

    fn mime_type(&self) -> &'static str {
        "image/x-test"
    }

    fn magic_len(&self) -> usize {
        self.magic.len()
    }

    fn matches(&self, prefix: &[u8]) -> bool {
        prefix == self.magic
    }

    fn open(&self, _source: &mut ImageSource<'_>, _filename: Option<&Path>) -> Result<Image> {
        Ok(Image::new(self.id(), ColorSpace::Rgb, 3, 1, 1, 1, false))
    }
}

/// Identities of a format list, for order assertions.
pub(crate) fn ids<'f>(
    formats: impl IntoIterator<Item = &'f Arc<dyn FileFormat>>,
) -> Vec<&'static str> {
    formats.into_iter().map(|f| f.id().as_str()).collect()
}

/// Minimal baseline JPEG header: SOI, APP0, SOF0 (8-bit, 3 components).
pub(crate) fn jpeg_header(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    data.extend_from_slice(b"JFIF\0");
    data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.push(3);
    for component in 1..=3u8 {
        data.extend_from_slice(&[component, 0x11, 0x00]);
    }
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}
