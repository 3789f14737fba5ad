//! Built-in format descriptors.
//!
//! Each opener parses only the container header it needs for an [`Image`]
//! (dimensions, color model, sample size). Pure byte parsing, no codec crate
//! dependencies.
//!
//! [`Image`]: crate::Image

use std::sync::Arc;

use crate::error::{Result, SniffError};
use crate::format::{FileFormat, FormatId};
use crate::source::ImageSource;

#[cfg(feature = "format-gif")]
pub mod gif;
#[cfg(feature = "format-jpeg")]
pub mod jpeg;
#[cfg(feature = "format-png")]
pub mod png;
#[cfg(feature = "format-webp")]
pub mod webp;

/// Compiled-in formats in registration order: GIF, JPEG, PNG, WebP.
#[allow(unused_mut)]
pub fn builtin_formats() -> Vec<Arc<dyn FileFormat>> {
    let mut formats: Vec<Arc<dyn FileFormat>> = Vec::new();

    #[cfg(feature = "format-gif")]
    formats.push(Arc::new(gif::GifFormat));
    #[cfg(feature = "format-jpeg")]
    formats.push(Arc::new(jpeg::JpegFormat));
    #[cfg(feature = "format-png")]
    formats.push(Arc::new(png::PngFormat));
    #[cfg(feature = "format-webp")]
    formats.push(Arc::new(webp::WebpFormat));

    formats
}

/// Read exactly `len` header bytes from the cursor.
#[allow(dead_code)]
pub(crate) fn read_header<'s>(
    source: &'s mut ImageSource<'_>,
    format: FormatId,
    len: usize,
) -> Result<&'s [u8]> {
    let bytes = source
        .read_bytes(len)
        .map_err(|e| SniffError::from_header_read(format, e))?;
    if bytes.len() < len {
        return Err(SniffError::InvalidHeader {
            format,
            detail: "truncated header",
        });
    }
    Ok(bytes)
}
