//! Detect-and-open request builder.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{DetectOrder, SourceConfig};
use crate::detect::detect_ordered;
use crate::error::{Result, SniffError};
use crate::format::{FileFormat, FormatId};
use crate::image::Image;
use crate::registry::{FormatRegistry, global_snapshot};
use crate::source::{ImageInput, ImageSource};

/// Image open request builder.
///
/// Without [`with_registry`](Self::with_registry) the process-wide registry
/// is used. It is copied up front, so no lock is held while the source is
/// read.
///
/// # Example
///
/// ```no_run
/// use zensniff::{DetectOrder, OpenRequest};
///
/// let image = OpenRequest::new("photo.jpg")
///     .with_detect_order(DetectOrder::ExtensionFirst)
///     .open()?;
/// println!("{} {}x{}", image.format, image.width, image.height);
/// # Ok::<(), zensniff::SniffError>(())
/// ```
pub struct OpenRequest<'a> {
    input: ImageInput<'a>,
    registry: Option<&'a FormatRegistry>,
    filename: Option<PathBuf>,
    order: DetectOrder,
    config: SourceConfig,
    format: Option<FormatId>,
}

/// A validated source and the format chosen for it.
struct Resolved<'a> {
    source: ImageSource<'a>,
    format: Option<Arc<dyn FileFormat>>,
    filename: Option<PathBuf>,
}

impl<'a> OpenRequest<'a> {
    /// Create a new open request. The format is detected from magic bytes.
    pub fn new(input: impl Into<ImageInput<'a>>) -> Self {
        Self {
            input: input.into(),
            registry: None,
            filename: None,
            order: DetectOrder::default(),
            config: SourceConfig::default(),
            format: None,
        }
    }

    /// Detect against `registry` instead of the process-wide registry.
    pub fn with_registry(mut self, registry: &'a FormatRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Filename hint passed to the opener, and used by
    /// [`DetectOrder::ExtensionFirst`]. Path inputs default to their own path.
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the candidate order.
    pub fn with_detect_order(mut self, order: DetectOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the source buffering configuration.
    pub fn with_config(mut self, config: SourceConfig) -> Self {
        self.config = config;
        self
    }

    /// Skip detection and use the registered format `format`.
    pub fn with_format(mut self, format: FormatId) -> Self {
        self.format = Some(format);
        self
    }

    /// Identify the format. `Ok(None)` when nothing matches.
    pub fn detect(self) -> Result<Option<FormatId>> {
        let Resolved { format, .. } = self.resolve()?;
        Ok(format.map(|f| f.id()))
    }

    /// Detect the format and open the image header.
    ///
    /// No match is [`SniffError::UnknownFormat`]. Opener errors are returned
    /// unchanged.
    pub fn open(self) -> Result<Image> {
        let Resolved {
            mut source,
            format,
            filename,
        } = self.resolve()?;
        let Some(format) = format else {
            tracing::debug!(source = ?source, "no registered format matched");
            return Err(SniffError::UnknownFormat);
        };

        tracing::debug!(format = %format.id(), filename = ?filename, "opening image");
        source.rewind();
        format.open(&mut source, filename.as_deref())
    }

    fn resolve(self) -> Result<Resolved<'a>> {
        let mut source = ImageSource::with_config(self.input, &self.config)?;
        let registry = match self.registry {
            Some(registry) => Cow::Borrowed(registry),
            None => Cow::Owned(global_snapshot()),
        };
        let filename = self
            .filename
            .or_else(|| source.path().map(Path::to_path_buf));

        let format = match self.format {
            Some(id) => {
                let format = registry.get(id).ok_or(SniffError::UnknownFormat)?;
                Some(Arc::clone(format))
            }
            None => detect_ordered(&mut source, &registry, self.order, filename.as_deref())?,
        };

        Ok(Resolved {
            source,
            format,
            filename,
        })
    }
}
