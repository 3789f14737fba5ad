//! Runtime format registry.
//!
//! A [`FormatRegistry`] is an ordered set of format descriptors plus an
//! ordered extension index. Registration order is detection order. The
//! process-wide instance is created on first use with the compiled-in formats
//! and lives for the rest of the process; isolated registries can be built
//! with [`FormatRegistry::new`] or [`FormatRegistry::with_builtin_formats`].

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::Result;
use crate::format::{FileFormat, FormatId, extension_of, validate};

/// Descriptors claiming one extension, in registration order.
#[derive(Clone)]
struct ExtensionBucket {
    extension: String,
    formats: Vec<Arc<dyn FileFormat>>,
}

/// Ordered set of format descriptors keyed by identity.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<Arc<dyn FileFormat>>,
    buckets: Vec<ExtensionBucket>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the compiled-in formats: GIF, JPEG, PNG, WebP.
    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::new();
        for format in crate::codecs::builtin_formats() {
            registry.insert(format);
        }
        registry
    }

    /// Add a format.
    ///
    /// Returns `Ok(false)` if a format with the same identity is already
    /// registered. Invalid descriptors fail with
    /// [`RegistryType`](crate::SniffError::RegistryType) and leave the
    /// registry unchanged.
    pub fn register(&mut self, format: Arc<dyn FileFormat>) -> Result<bool> {
        validate(format.as_ref())?;
        let id = format.id();
        let added = self.insert(format);
        if added {
            tracing::debug!(format = %id, "registered file format");
        }
        Ok(added)
    }

    /// Remove the format with `format`'s identity.
    ///
    /// Returns `Ok(false)` if it was not registered. Buckets left empty are
    /// dropped.
    pub fn unregister(&mut self, format: &dyn FileFormat) -> Result<bool> {
        validate(format)?;
        let id = format.id();
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        self.formats.remove(index);
        for bucket in &mut self.buckets {
            bucket.formats.retain(|f| f.id() != id);
        }
        self.buckets.retain(|bucket| !bucket.formats.is_empty());

        tracing::debug!(format = %id, "unregistered file format");
        Ok(true)
    }

    /// Registered formats in registration order.
    pub fn formats(&self) -> &[Arc<dyn FileFormat>] {
        &self.formats
    }

    /// Identities in registration order.
    pub fn format_ids(&self) -> Vec<FormatId> {
        self.formats.iter().map(|f| f.id()).collect()
    }

    /// Formats claiming `extension` (with its leading dot, any case), in
    /// registration order. Empty if none.
    pub fn formats_for_extension(&self, extension: &str) -> &[Arc<dyn FileFormat>] {
        self.bucket(extension)
            .map(|bucket| bucket.formats.as_slice())
            .unwrap_or(&[])
    }

    /// Formats claiming the extension of `path`. Empty if the path has none.
    pub fn formats_for_filename(&self, path: &Path) -> &[Arc<dyn FileFormat>] {
        match extension_of(path) {
            Some(extension) => self.formats_for_extension(&extension),
            None => &[],
        }
    }

    /// Known extensions, in first-registration order.
    pub fn extensions(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.extension.as_str()).collect()
    }

    /// Iterate all formats, or one extension bucket.
    pub fn iter(&self, extension: Option<&str>) -> core::slice::Iter<'_, Arc<dyn FileFormat>> {
        let formats = match extension {
            Some(extension) => self.formats_for_extension(extension),
            None => self.formats(),
        };
        formats.iter()
    }

    /// Look up a format by identity.
    pub fn get(&self, id: FormatId) -> Option<&Arc<dyn FileFormat>> {
        self.formats.iter().find(|f| f.id() == id)
    }

    pub fn contains(&self, id: FormatId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    fn position(&self, id: FormatId) -> Option<usize> {
        self.formats.iter().position(|f| f.id() == id)
    }

    fn bucket(&self, extension: &str) -> Option<&ExtensionBucket> {
        self.buckets
            .iter()
            .find(|b| b.extension.eq_ignore_ascii_case(extension))
    }

    /// Insert without validation.
    fn insert(&mut self, format: Arc<dyn FileFormat>) -> bool {
        if self.contains(format.id()) {
            return false;
        }

        for extension in format.extensions() {
            let extension = extension.to_ascii_lowercase();
            match self.buckets.iter_mut().find(|b| b.extension == extension) {
                Some(bucket) => {
                    if !bucket.formats.iter().any(|f| f.id() == format.id()) {
                        bucket.formats.push(Arc::clone(&format));
                    }
                }
                None => self.buckets.push(ExtensionBucket {
                    extension,
                    formats: vec![Arc::clone(&format)],
                }),
            }
        }
        self.formats.push(format);
        true
    }
}

impl core::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.format_ids())
            .field("extensions", &self.extensions())
            .finish()
    }
}

static GLOBAL: Lazy<Mutex<FormatRegistry>> =
    Lazy::new(|| Mutex::new(FormatRegistry::with_builtin_formats()));

/// Run `f` with exclusive access to the process-wide registry.
///
/// The lock is held for the duration of `f`; do not perform I/O in it.
pub fn with_global_registry<R>(f: impl FnOnce(&mut FormatRegistry) -> R) -> R {
    f(&mut GLOBAL.lock())
}

/// Copy of the process-wide registry, taken under the lock.
pub(crate) fn global_snapshot() -> FormatRegistry {
    GLOBAL.lock().clone()
}

/// Register a format in the process-wide registry.
pub fn register_format(format: Arc<dyn FileFormat>) -> Result<bool> {
    GLOBAL.lock().register(format)
}

/// Unregister a format from the process-wide registry.
pub fn unregister_format(format: &dyn FileFormat) -> Result<bool> {
    GLOBAL.lock().unregister(format)
}

/// Formats of the process-wide registry, in registration order.
pub fn registered_formats() -> Vec<Arc<dyn FileFormat>> {
    GLOBAL.lock().formats().to_vec()
}

/// Extensions of the process-wide registry, in first-registration order.
pub fn registered_extensions() -> Vec<String> {
    GLOBAL
        .lock()
        .extensions()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Formats of the process-wide registry claiming `extension`.
pub fn formats_for_extension(extension: &str) -> Vec<Arc<dyn FileFormat>> {
    GLOBAL.lock().formats_for_extension(extension).to_vec()
}

/// Formats of the process-wide registry claiming the extension of `path`.
pub fn formats_for_filename(path: &Path) -> Vec<Arc<dyn FileFormat>> {
    GLOBAL.lock().formats_for_filename(path).to_vec()
}

/// Visit process-wide formats, all or one extension bucket.
///
/// Iterates a snapshot, so `f` may itself use the global registry.
pub fn each_format(extension: Option<&str>, mut f: impl FnMut(&Arc<dyn FileFormat>)) {
    let snapshot = match extension {
        Some(extension) => formats_for_extension(extension),
        None => registered_formats(),
    };
    for format in &snapshot {
        f(format);
    }
}
