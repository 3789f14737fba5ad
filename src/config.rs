//! Source buffering and detection-order configuration.
//!
//! Built-in formats are selected at compile time with the `format-gif`,
//! `format-jpeg`, `format-png` and `format-webp` cargo features. Everything
//! else is runtime configuration passed to [`ImageSource::with_config`] or
//! [`OpenRequest`](crate::OpenRequest).
//!
//! [`ImageSource::with_config`]: crate::ImageSource::with_config

/// Default initial capacity of a source buffer, in bytes.
pub const DEFAULT_INITIAL_CAPACITY: usize = 8192;

/// Buffered source configuration.
///
/// # Example
///
/// ```
/// use zensniff::{ImageSource, SourceConfig};
///
/// let config = SourceConfig::default().with_initial_capacity(64);
/// let mut source = ImageSource::with_config(&b"GIF89a"[..], &config)?;
/// assert_eq!(source.read_bytes(4)?, b"GIF8");
/// # Ok::<(), zensniff::SniffError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct SourceConfig {
    /// Bytes reserved for the replay buffer up front. The buffer still grows
    /// past this as needed.
    pub initial_capacity: usize,
}

impl SourceConfig {
    /// Set the initial buffer capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

/// Order in which candidates are probed during detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum DetectOrder {
    /// Every registered format, in registration order.
    #[default]
    Registration,
    /// Formats claiming the filename's extension first, then the rest in
    /// registration order. Without a filename this is `Registration`.
    ExtensionFirst,
}
