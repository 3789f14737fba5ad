//! Unified error type for source normalization, registry and open operations.

use std::borrow::Cow;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::format::FormatId;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, SniffError>;

/// Unified error type.
///
/// Source validation errors (`SourceNotFound`, `SourceIsDirectory`,
/// `SourceNotReadable`, `InvalidSourceType`) are raised while the
/// [`ImageSource`](crate::ImageSource) is constructed, before any byte is read.
/// A failed detection is not an error; only [`open`](crate::Image::open)
/// turns it into `UnknownFormat`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SniffError {
    /// The path does not exist.
    #[error("image source not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    /// The path names a directory.
    #[error("image source is a directory: {}", .path.display())]
    SourceIsDirectory { path: PathBuf },

    /// The path or stream cannot be read by this process.
    #[error("image source is not readable: {source}")]
    SourceNotReadable {
        /// Path of the source, when it has one.
        path: Option<PathBuf>,
        source: io::Error,
    },

    /// The input is neither path-like, stream-like nor a byte buffer.
    #[error("unsupported image source type: {0}")]
    InvalidSourceType(Cow<'static, str>),

    /// No registered format recognized the source.
    #[error("unrecognized image format")]
    UnknownFormat,

    /// A format descriptor failed validation on register/unregister.
    #[error("invalid file format descriptor {id:?}: {reason}")]
    RegistryType { id: String, reason: &'static str },

    /// A format recognized the magic bytes but its header is malformed.
    #[error("malformed {format} header: {detail}")]
    InvalidHeader {
        format: FormatId,
        detail: &'static str,
    },

    /// Error reported by an external decoder.
    #[error("codec error ({format}): {source}")]
    Codec {
        format: FormatId,
        source: Box<dyn core::error::Error + Send + Sync>,
    },

    /// Read failure of the underlying handle, passed through verbatim.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SniffError {
    /// Wrap a codec-specific error.
    pub fn from_codec<E>(format: FormatId, error: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        SniffError::Codec {
            format,
            source: Box::new(error),
        }
    }

    /// Map a header read failure: running out of bytes means the header is
    /// truncated, anything else is the handle's own error.
    pub(crate) fn from_header_read(format: FormatId, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            SniffError::InvalidHeader {
                format,
                detail: "truncated header",
            }
        } else {
            SniffError::Io(error)
        }
    }

    /// Whether this error was raised while validating the input, before any
    /// byte was read.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            SniffError::SourceNotFound { .. }
                | SniffError::SourceIsDirectory { .. }
                | SniffError::SourceNotReadable { .. }
                | SniffError::InvalidSourceType(_)
        )
    }
}
