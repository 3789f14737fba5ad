//! Rewindable buffered reads over paths, borrowed streams and byte buffers.
//!
//! [`ImageSource`] caches every byte it pulls from the underlying handle, so
//! rewinding is just a cursor reset. Format probes can re-read the start of a
//! one-shot stream (a gzip decoder, a pipe) exactly as they would a file, and
//! the handle is never asked for the same bytes twice.

use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use crate::config::SourceConfig;
use crate::error::{Result, SniffError};
use crate::format::extension_of;

/// An input accepted by [`ImageSource::new`] and the open/detect facade.
pub enum ImageInput<'a> {
    /// Filesystem path or `file://` URI, opened lazily.
    Path(PathBuf),
    /// Caller-owned stream. It is borrowed, never closed.
    Reader(&'a mut (dyn Read + 'a)),
    /// In-memory encoded image.
    Bytes(Cow<'a, [u8]>),
}

impl<'a> ImageInput<'a> {
    /// Wrap a caller-owned reader.
    pub fn reader<R: Read + 'a>(reader: &'a mut R) -> Self {
        ImageInput::Reader(reader)
    }

    /// Normalize a dynamically typed value.
    ///
    /// Path-like values (`PathBuf`, `String`, `&'static str`, `Box<Path>`) and
    /// owned byte buffers (`Vec<u8>`) are accepted. Streams cannot be passed
    /// by value because the caller keeps ownership of them; use
    /// [`ImageInput::reader`]. Anything else is `InvalidSourceType`.
    pub fn from_value<T: Any>(value: T) -> Result<ImageInput<'static>> {
        let value: Box<dyn Any> = Box::new(value);
        let value = match value.downcast::<PathBuf>() {
            Ok(path) => return Ok(ImageInput::Path(*path)),
            Err(other) => other,
        };
        let value = match value.downcast::<String>() {
            Ok(path) => return Ok(ImageInput::Path(PathBuf::from(*path))),
            Err(other) => other,
        };
        let value = match value.downcast::<&'static str>() {
            Ok(path) => return Ok(ImageInput::Path(PathBuf::from(*path))),
            Err(other) => other,
        };
        let value = match value.downcast::<Box<Path>>() {
            Ok(path) => return Ok(ImageInput::Path(path.into_path_buf())),
            Err(other) => other,
        };
        match value.downcast::<Vec<u8>>() {
            Ok(bytes) => Ok(ImageInput::Bytes(Cow::Owned(*bytes))),
            Err(_) => Err(SniffError::InvalidSourceType(Cow::Borrowed(type_name::<T>()))),
        }
    }

    /// Path of a path input.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageInput::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl From<&str> for ImageInput<'_> {
    fn from(path: &str) -> Self {
        ImageInput::Path(PathBuf::from(path))
    }
}

impl From<String> for ImageInput<'_> {
    fn from(path: String) -> Self {
        ImageInput::Path(PathBuf::from(path))
    }
}

impl From<&Path> for ImageInput<'_> {
    fn from(path: &Path) -> Self {
        ImageInput::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageInput<'_> {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

impl From<&PathBuf> for ImageInput<'_> {
    fn from(path: &PathBuf) -> Self {
        ImageInput::Path(path.clone())
    }
}

impl<'a> From<&'a [u8]> for ImageInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ImageInput::Bytes(Cow::Borrowed(bytes))
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ImageInput<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        ImageInput::Bytes(Cow::Borrowed(bytes.as_slice()))
    }
}

impl<'a> From<&'a Vec<u8>> for ImageInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        ImageInput::Bytes(Cow::Borrowed(bytes.as_slice()))
    }
}

impl From<Vec<u8>> for ImageInput<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(Cow::Owned(bytes))
    }
}

impl<'a> From<&'a mut File> for ImageInput<'a> {
    fn from(file: &'a mut File) -> Self {
        ImageInput::Reader(file)
    }
}

impl<'a> From<&'a mut (dyn Read + 'a)> for ImageInput<'a> {
    fn from(reader: &'a mut (dyn Read + 'a)) -> Self {
        ImageInput::Reader(reader)
    }
}

/// The underlying handle of an [`ImageSource`]. Ownership is fixed at
/// construction.
enum SourceHandle<'a> {
    /// Opened by this crate on first read and closed on drop.
    File { path: PathBuf, file: Option<File> },
    Borrowed(&'a mut (dyn Read + 'a)),
    Memory(Cursor<Cow<'a, [u8]>>),
}

/// Forward reader with rewind-to-start over any [`ImageInput`].
///
/// Every byte pulled from the handle is kept in an internal buffer, starting
/// at offset 0. Reads are served from the buffer first; only the shortfall is
/// requested from the handle.
pub struct ImageSource<'a> {
    handle: SourceHandle<'a>,
    buffer: Vec<u8>,
    pos: usize,
}

impl<'a> ImageSource<'a> {
    /// Validate and wrap `input` with the default configuration.
    pub fn new(input: impl Into<ImageInput<'a>>) -> Result<Self> {
        Self::with_config(input, &SourceConfig::default())
    }

    /// Validate and wrap `input`.
    ///
    /// Paths are checked for existence, type and readability here but not
    /// opened. Streams are probed with a zero-length read.
    pub fn with_config(input: impl Into<ImageInput<'a>>, config: &SourceConfig) -> Result<Self> {
        let handle = match input.into() {
            ImageInput::Path(path) => {
                let path = resolve_path(path)?;
                check_path(&path)?;
                SourceHandle::File { path, file: None }
            }
            ImageInput::Reader(reader) => {
                check_readable(reader)?;
                SourceHandle::Borrowed(reader)
            }
            ImageInput::Bytes(bytes) => SourceHandle::Memory(Cursor::new(bytes)),
        };

        Ok(Self {
            handle,
            buffer: Vec::with_capacity(config.initial_capacity),
            pos: 0,
        })
    }

    /// Read up to `len` bytes from the cursor.
    ///
    /// Fewer bytes are returned only when the handle reaches end of stream.
    /// Handle errors are returned as-is; bytes pulled before the error stay
    /// buffered and the cursor does not move.
    pub fn read_bytes(&mut self, len: usize) -> io::Result<&[u8]> {
        let tail = self.buffer.len() - self.pos;
        if len > tail {
            let shortfall = (len - tail) as u64;
            let reader = handle_reader(&mut self.handle)?;
            reader.take(shortfall).read_to_end(&mut self.buffer)?;
        }

        let start = self.pos;
        self.pos = start.saturating_add(len).min(self.buffer.len());
        Ok(&self.buffer[start..self.pos])
    }

    /// Drain the handle and return everything from the cursor to the end.
    pub fn read_remaining(&mut self) -> io::Result<&[u8]> {
        let reader = handle_reader(&mut self.handle)?;
        reader.read_to_end(&mut self.buffer)?;

        let start = self.pos;
        self.pos = self.buffer.len();
        Ok(&self.buffer[start..])
    }

    /// Move the cursor back to the first byte. The handle is not touched.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes pulled from the handle so far.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Path of a path-backed source.
    pub fn path(&self) -> Option<&Path> {
        match &self.handle {
            SourceHandle::File { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Lower-cased `.ext` of a path-backed source.
    pub fn extension(&self) -> Option<String> {
        self.path().and_then(extension_of)
    }

    /// Whether this source owns (and will close) its handle.
    pub fn owns_handle(&self) -> bool {
        matches!(self.handle, SourceHandle::File { .. })
    }
}

impl Read for ImageSource<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let bytes = self.read_bytes(out.len())?;
        let n = bytes.len();
        out[..n].copy_from_slice(bytes);
        Ok(n)
    }
}

impl core::fmt::Debug for ImageSource<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match &self.handle {
            SourceHandle::File { file: None, .. } => "path",
            SourceHandle::File { file: Some(_), .. } => "file",
            SourceHandle::Borrowed(_) => "stream",
            SourceHandle::Memory(_) => "memory",
        };
        f.debug_struct("ImageSource")
            .field("kind", &kind)
            .field("path", &self.path())
            .field("buffered", &self.buffer.len())
            .field("pos", &self.pos)
            .finish()
    }
}

/// Reader for the handle, opening a path on first use.
fn handle_reader<'h, 'a>(handle: &'h mut SourceHandle<'a>) -> io::Result<&'h mut (dyn Read + 'a)> {
    match handle {
        SourceHandle::File { path, file } => {
            let opened = match file.take() {
                Some(opened) => opened,
                None => {
                    tracing::trace!(path = %path.display(), "opening image source");
                    File::open(path.as_path())?
                }
            };
            Ok(file.insert(opened))
        }
        SourceHandle::Borrowed(reader) => Ok(&mut **reader),
        SourceHandle::Memory(cursor) => Ok(cursor),
    }
}

/// Strip a `file://` scheme; any other URI scheme is not a path.
fn resolve_path(path: PathBuf) -> Result<PathBuf> {
    let Some(text) = path.to_str() else {
        return Ok(path);
    };
    let Some((scheme, rest)) = text.split_once("://") else {
        return Ok(path);
    };
    let is_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme {
        return Ok(path);
    }
    if scheme.eq_ignore_ascii_case("file") {
        // file://localhost/x and file:///x both name /x
        let rest = rest.strip_prefix("localhost").unwrap_or(rest);
        return Ok(PathBuf::from(rest));
    }
    Err(SniffError::InvalidSourceType(Cow::Owned(format!(
        "{scheme}:// URI"
    ))))
}

/// Existence, type and readability, in that order.
fn check_path(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SniffError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(SniffError::SourceNotReadable {
                path: Some(path.to_path_buf()),
                source: e,
            });
        }
    };

    if metadata.is_dir() {
        return Err(SniffError::SourceIsDirectory {
            path: path.to_path_buf(),
        });
    }

    // Access check only; the read handle is opened on first read.
    if let Err(e) = File::open(path) {
        return Err(SniffError::SourceNotReadable {
            path: Some(path.to_path_buf()),
            source: e,
        });
    }

    Ok(())
}

/// Zero-length read probe: rejects write-only or closed streams without
/// consuming payload. `WouldBlock` and `Interrupted` count as readable.
fn check_readable(reader: &mut (dyn Read + '_)) -> Result<()> {
    match reader.read(&mut []) {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
            Ok(())
        }
        Err(e) => Err(SniffError::SourceNotReadable {
            path: None,
            source: e,
        }),
    }
}
