//! JPEG: walk marker segments from SOI to the first SOF.
//!
//! Structure: SOI (FF D8), then marker segments (FF xx, 2-byte length,
//! payload). Segments are consumed from the source as they are walked, so
//! large APPn blocks ahead of the frame header are read once and skipped.

use std::path::Path;

use crate::codecs::read_header;
use crate::error::{Result, SniffError};
use crate::format::{FileFormat, FormatId};
use crate::image::{ColorSpace, Image};
use crate::source::ImageSource;

const SOI: [u8; 2] = [0xFF, 0xD8];
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// JPEG / JFIF / Exif.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegFormat;

impl FileFormat for JpegFormat {
    fn id(&self) -> FormatId {
        FormatId::JPEG
    }

    fn extensions(&self) -> &[&str] {
        &[".jpg", ".jpeg", ".jpe", ".jif", ".jfif"]
    }

    fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn magic_len(&self) -> usize {
        SOI.len()
    }

    fn matches(&self, prefix: &[u8]) -> bool {
        prefix == SOI
    }

    fn open(&self, source: &mut ImageSource<'_>, _filename: Option<&Path>) -> Result<Image> {
        if read_header(source, FormatId::JPEG, 2)? != SOI {
            return Err(invalid("missing SOI marker"));
        }

        loop {
            if read_byte(source)? != 0xFF {
                return Err(invalid("lost marker sync"));
            }
            let mut marker = read_byte(source)?;
            while marker == 0xFF {
                marker = read_byte(source)?;
            }

            if is_standalone(marker) {
                continue;
            }
            if marker == SOS || marker == EOI {
                return Err(invalid("no frame header before scan data"));
            }

            let length = read_header(source, FormatId::JPEG, 2)?;
            let length = u16::from_be_bytes([length[0], length[1]]) as usize;
            if length < 2 {
                return Err(invalid("bad segment length"));
            }
            let payload = read_header(source, FormatId::JPEG, length - 2)?;

            if is_sof(marker) {
                return frame_header(payload);
            }
        }
    }
}

/// Parse an SOF payload: precision (1), height (2), width (2), components (1).
fn frame_header(payload: &[u8]) -> Result<Image> {
    if payload.len() < 6 {
        return Err(invalid("short frame header"));
    }
    let precision = payload[0];
    let height = u16::from_be_bytes([payload[1], payload[2]]);
    let width = u16::from_be_bytes([payload[3], payload[4]]);
    let components = payload[5];

    if width == 0 || height == 0 {
        return Err(invalid("zero dimension"));
    }

    let color_space = match components {
        1 => ColorSpace::Gray,
        3 => ColorSpace::Rgb,
        4 => ColorSpace::Cmyk,
        _ => return Err(invalid("unsupported component count")),
    };
    let component_size = if precision > 8 { 2 } else { 1 };

    Ok(Image::new(
        FormatId::JPEG,
        color_space,
        components,
        component_size,
        width.into(),
        height.into(),
        false,
    ))
}

fn read_byte(source: &mut ImageSource<'_>) -> Result<u8> {
    Ok(read_header(source, FormatId::JPEG, 1)?[0])
}

fn invalid(detail: &'static str) -> SniffError {
    SniffError::InvalidHeader {
        format: FormatId::JPEG,
        detail,
    }
}

/// Markers without a length field: TEM, RST0-RST7.
fn is_standalone(marker: u8) -> bool {
    marker == 0x00 || marker == 0x01 || (0xD0..=0xD7).contains(&marker)
}

/// SOF0-SOF15, excluding DHT (C4), JPG (C8) and DAC (CC).
fn is_sof(marker: u8) -> bool {
    matches!(
        marker,
        0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF
    )
}
