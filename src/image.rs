//! Opened image headers.

use crate::error::Result;
use crate::format::FormatId;
use crate::open::OpenRequest;
use crate::source::ImageInput;

/// Row alignment of a channel plane, in bytes.
pub const ROW_ALIGNMENT: usize = 16;

/// Color model of the decoded samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

/// Header of an opened image.
///
/// Produced by a format's opener. Pixels are not decoded; the layout fields
/// describe the planar buffer a decoder would fill: one plane per channel,
/// each row padded to [`ROW_ALIGNMENT`] bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Image {
    pub format: FormatId,
    pub color_space: ColorSpace,
    /// Channels per pixel, alpha included.
    pub pixel_channels: u8,
    /// Bytes per sample.
    pub component_size: u8,
    pub width: u32,
    pub height: u32,
    /// Bytes per plane row.
    pub row_stride: usize,
    pub has_alpha: bool,
}

impl Image {
    /// Build a header and derive its row stride.
    pub fn new(
        format: FormatId,
        color_space: ColorSpace,
        pixel_channels: u8,
        component_size: u8,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> Self {
        let row_bytes = (width as usize).saturating_mul(component_size as usize);
        Self {
            format,
            color_space,
            pixel_channels,
            component_size,
            width,
            height,
            row_stride: align_up(row_bytes, ROW_ALIGNMENT),
            has_alpha,
        }
    }

    /// Detect and open `input` against the process-wide registry.
    ///
    /// # Example
    ///
    /// ```
    /// use zensniff::{Image, SniffError};
    ///
    /// let err = Image::open(&b"plain text"[..]).unwrap_err();
    /// assert!(matches!(err, SniffError::UnknownFormat));
    /// ```
    pub fn open<'a>(input: impl Into<ImageInput<'a>>) -> Result<Image> {
        OpenRequest::new(input).open()
    }

    /// Identify the format of `input` against the process-wide registry.
    ///
    /// `Ok(None)` when nothing matches.
    pub fn detect_format<'a>(input: impl Into<ImageInput<'a>>) -> Result<Option<FormatId>> {
        OpenRequest::new(input).detect()
    }

    /// Bytes needed for one channel plane.
    pub fn plane_len(&self) -> usize {
        self.row_stride.saturating_mul(self.height as usize)
    }
}

fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment).saturating_mul(alignment)
}
