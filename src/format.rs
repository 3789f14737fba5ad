//! Format descriptors: identity, extensions, MIME type, magic bytes and opener.

use core::fmt;
use std::path::Path;

use crate::error::{Result, SniffError};
use crate::image::Image;
use crate::source::ImageSource;

/// Identity of a file format.
///
/// Two descriptors with the same `FormatId` are the same format as far as the
/// registry is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatId(&'static str);

impl FormatId {
    pub const GIF: Self = FormatId("gif");
    pub const JPEG: Self = FormatId("jpeg");
    pub const PNG: Self = FormatId("png");
    pub const WEBP: Self = FormatId("webp");

    /// Create an identity from a static symbol.
    pub const fn new(name: &'static str) -> Self {
        FormatId(name)
    }

    /// The identity symbol.
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A pluggable image format.
///
/// Implementors are immutable descriptors, registered as
/// `Arc<dyn FileFormat>` in a [`FormatRegistry`](crate::FormatRegistry).
/// Detection reads [`magic_len`](Self::magic_len) bytes from the start of the
/// source and hands them to [`matches`](Self::matches); opening is delegated
/// to [`open`](Self::open).
pub trait FileFormat: Send + Sync + 'static {
    /// Unique identity.
    fn id(&self) -> FormatId;

    /// Canonical extensions, each with a leading dot, in preference order.
    fn extensions(&self) -> &[&str];

    /// MIME type string.
    fn mime_type(&self) -> &'static str;

    /// Number of leading bytes the magic predicate needs.
    fn magic_len(&self) -> usize;

    /// Magic-byte predicate. `prefix` is shorter than `magic_len` when the
    /// source ended early.
    fn matches(&self, prefix: &[u8]) -> bool;

    /// Rewind `source` and test its prefix against the magic bytes.
    ///
    /// The cursor is left after the bytes read by the probe.
    fn detect(&self, source: &mut ImageSource<'_>) -> std::io::Result<bool> {
        source.rewind();
        let prefix = source.read_bytes(self.magic_len())?;
        Ok(self.matches(prefix))
    }

    /// Decode the image header. `source` is positioned at its first byte.
    fn open(&self, source: &mut ImageSource<'_>, filename: Option<&Path>) -> Result<Image>;
}

impl fmt::Debug for dyn FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileFormat")
            .field("id", &self.id())
            .field("extensions", &self.extensions())
            .field("mime_type", &self.mime_type())
            .finish()
    }
}

/// Check that a descriptor is usable before it touches a registry.
pub(crate) fn validate(format: &dyn FileFormat) -> Result<()> {
    let id = format.id();
    let reject = |reason: &'static str| SniffError::RegistryType {
        id: id.as_str().to_owned(),
        reason,
    };

    if id.as_str().is_empty() {
        return Err(reject("empty format identity"));
    }
    for ext in format.extensions() {
        if ext.len() < 2 || !ext.starts_with('.') {
            return Err(reject("extensions must start with '.' and be non-empty"));
        }
    }
    match format.mime_type().split_once('/') {
        Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => {}
        _ => return Err(reject("MIME type must be of the form type/subtype")),
    }
    if format.magic_len() == 0 {
        return Err(reject("magic prefix length must be non-zero"));
    }
    Ok(())
}

/// Normalize a filename extension to the registry's `.ext` form.
///
/// Returns `None` for paths without an extension.
pub fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}
