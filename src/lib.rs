//! # zensniff
//!
//! Image input normalization, rewindable buffered sources, and pluggable
//! magic-byte format detection.
//!
//! Inputs (paths, `file://` URIs, caller-owned readers, byte buffers) are
//! wrapped in an [`ImageSource`] that buffers everything it reads, so format
//! probes can rewind one-shot streams. Formats implement [`FileFormat`] and
//! live in a [`FormatRegistry`]; the process-wide registry starts with the
//! compiled-in formats, each behind a cargo feature:
//!
//! ```toml
//! [dependencies]
//! zensniff = { version = "0.1", default-features = false, features = ["format-jpeg", "format-png"] }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zensniff::{FormatId, Image};
//!
//! // Detect only
//! let format = Image::detect_format("photo.jpg")?;
//! assert_eq!(format, Some(FormatId::JPEG));
//!
//! // Detect and read the header
//! let image = Image::open("photo.jpg")?;
//! println!("{}x{} {:?}", image.width, image.height, image.color_space);
//! # Ok::<(), zensniff::SniffError>(())
//! ```
//!
//! Custom formats are registered at runtime:
//!
//! ```rust,ignore
//! zensniff::register_format(std::sync::Arc::new(MyFormat))?;
//! ```

#![forbid(unsafe_code)]

pub mod codecs;
pub mod config;
mod detect;
mod error;
mod format;
mod image;
mod open;
mod registry;
mod source;

#[cfg(test)]
mod testing;

pub use config::{DetectOrder, SourceConfig};
pub use detect::{detect, detect_in, detect_ordered};
pub use error::{Result, SniffError};
pub use format::{FileFormat, FormatId, extension_of};
pub use image::{ColorSpace, Image, ROW_ALIGNMENT};
pub use open::OpenRequest;
pub use registry::{
    FormatRegistry, each_format, formats_for_extension, formats_for_filename, register_format,
    registered_extensions, registered_formats, unregister_format, with_global_registry,
};
pub use source::{ImageInput, ImageSource};
