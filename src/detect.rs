//! Magic-byte format detection over a buffered source.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::config::DetectOrder;
use crate::format::{FileFormat, extension_of};
use crate::registry::FormatRegistry;
use crate::source::ImageSource;

/// Probe `candidates` in order; the first match wins.
///
/// Each candidate sees the source from position 0, including formats that
/// override [`FileFormat::detect`]. The source is rewound to
/// position 0 before returning, whether a format matched or not. `Ok(None)`
/// means no candidate matched. Handle errors propagate.
pub fn detect<'f>(
    source: &mut ImageSource<'_>,
    candidates: impl IntoIterator<Item = &'f Arc<dyn FileFormat>>,
) -> io::Result<Option<Arc<dyn FileFormat>>> {
    let mut found = None;
    for format in candidates {
        source.rewind();
        let matched = format.detect(source);
        tracing::trace!(format = %format.id(), ?matched, "probed format");
        match matched {
            Ok(true) => {
                found = Some(Arc::clone(format));
                break;
            }
            Ok(false) => {}
            Err(e) => {
                source.rewind();
                return Err(e);
            }
        }
    }
    source.rewind();
    Ok(found)
}

/// Probe the formats of `registry`, or only those claiming `extension`.
pub fn detect_in(
    source: &mut ImageSource<'_>,
    registry: &FormatRegistry,
    extension: Option<&str>,
) -> io::Result<Option<Arc<dyn FileFormat>>> {
    detect(source, registry.iter(extension))
}

/// Probe the formats of `registry` in `order`, using `filename` for
/// [`DetectOrder::ExtensionFirst`].
pub fn detect_ordered(
    source: &mut ImageSource<'_>,
    registry: &FormatRegistry,
    order: DetectOrder,
    filename: Option<&Path>,
) -> io::Result<Option<Arc<dyn FileFormat>>> {
    let preferred = match (order, filename.and_then(extension_of)) {
        (DetectOrder::ExtensionFirst, Some(extension)) => registry.formats_for_extension(&extension),
        _ => &[],
    };
    let rest = registry
        .formats()
        .iter()
        .filter(|f| !preferred.iter().any(|p| p.id() == f.id()));
    detect(source, preferred.iter().chain(rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MagicFormat;

    fn registry(formats: Vec<Arc<dyn FileFormat>>) -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        for format in formats {
            registry.register(format).unwrap();
        }
        registry
    }

    /// Overrides `detect` and reads from wherever the cursor is.
    struct CursorFormat;

    impl FileFormat for CursorFormat {
        fn id(&self) -> crate::FormatId {
            crate::FormatId::new("cursor")
        }
        fn extensions(&self) -> &[&str] {
            &[".cur"]
        }
        fn mime_type(&self) -> &'static str {
            "image/x-cursor-test"
        }
        fn magic_len(&self) -> usize {
            2
        }
        fn matches(&self, prefix: &[u8]) -> bool {
            prefix == b"TB"
        }
        fn detect(&self, source: &mut ImageSource<'_>) -> io::Result<bool> {
            Ok(source.read_bytes(2)? == b"TB")
        }
        fn open(
            &self,
            _source: &mut ImageSource<'_>,
            _filename: Option<&Path>,
        ) -> crate::Result<crate::Image> {
            Err(crate::SniffError::UnknownFormat)
        }
    }

    struct BrokenReader;

    impl io::Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            Err(io::Error::new(io::ErrorKind::ConnectionAborted, "gone"))
        }
    }

    #[test]
    fn first_match_in_registration_order() {
        let registry = registry(vec![
            MagicFormat::arc("short", &[".s"], b"AB"),
            MagicFormat::arc("long", &[".l"], b"ABCD"),
        ]);
        let mut source = ImageSource::new(&b"ABCDEF"[..]).unwrap();
        let found = detect_in(&mut source, &registry, None).unwrap().unwrap();
        assert_eq!(found.id().as_str(), "short");
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn shorter_prefix_registered_first_does_not_shadow() {
        let registry = registry(vec![
            MagicFormat::arc("two", &[".two"], b"\xFF\xD8"),
            MagicFormat::arc("eight", &[".eight"], b"\x89PNG\r\n\x1a\n"),
        ]);
        let mut source = ImageSource::new(&b"\x89PNG\r\n\x1a\nIHDR"[..]).unwrap();
        let found = detect_in(&mut source, &registry, None).unwrap().unwrap();
        assert_eq!(found.id().as_str(), "eight");
    }

    #[test]
    fn overridden_detect_starts_at_zero() {
        let registry = registry(vec![
            MagicFormat::arc("long", &[".long"], b"XXXXXXXX"),
            Arc::new(CursorFormat),
        ]);
        let mut source = ImageSource::new(&b"TB-and-some-more"[..]).unwrap();
        source.read_bytes(3).unwrap();
        let found = detect_in(&mut source, &registry, None).unwrap().unwrap();
        assert_eq!(found.id().as_str(), "cursor");
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn no_match_is_none_and_rewinds() {
        let registry = registry(vec![MagicFormat::arc("test", &[".test"], b"TEST")]);
        let mut source = ImageSource::new(&b"nothing to see here"[..]).unwrap();
        source.read_bytes(5).unwrap();
        assert!(detect_in(&mut source, &registry, None).unwrap().is_none());
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn empty_candidates_match_nothing() {
        let mut source = ImageSource::new(&b"TEST"[..]).unwrap();
        let none: &[Arc<dyn FileFormat>] = &[];
        assert!(detect(&mut source, none).unwrap().is_none());
        assert!(detect_in(&mut source, &FormatRegistry::new(), None).unwrap().is_none());
    }

    #[test]
    fn source_shorter_than_magic() {
        let registry = registry(vec![MagicFormat::arc("test", &[".test"], b"TEST")]);
        let mut source = ImageSource::new(&b"TE"[..]).unwrap();
        assert!(detect_in(&mut source, &registry, None).unwrap().is_none());
    }

    #[test]
    fn extension_filter_limits_candidates() {
        let registry = registry(vec![
            MagicFormat::arc("a", &[".a"], b"AAAA"),
            MagicFormat::arc("b", &[".b"], b"BBBB"),
        ]);
        let mut source = ImageSource::new(&b"AAAA"[..]).unwrap();
        assert!(detect_in(&mut source, &registry, Some(".b")).unwrap().is_none());
        let found = detect_in(&mut source, &registry, Some(".a")).unwrap().unwrap();
        assert_eq!(found.id().as_str(), "a");
    }

    #[test]
    fn extension_first_prefers_hinted_bucket() {
        let registry = registry(vec![
            MagicFormat::arc("first", &[".one"], b"SAME"),
            MagicFormat::arc("second", &[".two"], b"SAME"),
        ]);
        let mut source = ImageSource::new(&b"SAME"[..]).unwrap();
        let hint = Path::new("picture.two");

        let by_registration =
            detect_ordered(&mut source, &registry, DetectOrder::Registration, Some(hint))
                .unwrap()
                .unwrap();
        assert_eq!(by_registration.id().as_str(), "first");

        let by_extension =
            detect_ordered(&mut source, &registry, DetectOrder::ExtensionFirst, Some(hint))
                .unwrap()
                .unwrap();
        assert_eq!(by_extension.id().as_str(), "second");
    }

    #[test]
    fn extension_first_falls_back_to_all_formats() {
        let registry = registry(vec![
            MagicFormat::arc("a", &[".a"], b"AAAA"),
            MagicFormat::arc("b", &[".b"], b"BBBB"),
        ]);
        let mut source = ImageSource::new(&b"BBBB"[..]).unwrap();
        let found = detect_ordered(
            &mut source,
            &registry,
            DetectOrder::ExtensionFirst,
            Some(Path::new("mislabeled.a")),
        )
        .unwrap()
        .unwrap();
        assert_eq!(found.id().as_str(), "b");

        let no_hint = detect_ordered(&mut source, &registry, DetectOrder::ExtensionFirst, None)
            .unwrap()
            .unwrap();
        assert_eq!(no_hint.id().as_str(), "b");
    }

    #[test]
    fn handle_errors_propagate() {
        let registry = registry(vec![MagicFormat::arc("test", &[".test"], b"TEST")]);
        let mut reader = BrokenReader;
        let mut source = ImageSource::new(crate::ImageInput::reader(&mut reader)).unwrap();
        let err = detect_in(&mut source, &registry, None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
    }

    #[cfg(all(
        feature = "format-gif",
        feature = "format-jpeg",
        feature = "format-png",
        feature = "format-webp"
    ))]
    #[test]
    fn builtin_magic_bytes() {
        let registry = FormatRegistry::with_builtin_formats();
        let cases: [(&[u8], &str); 4] = [
            (b"GIF89a\x01\x00\x01\x00", "gif"),
            (b"\xFF\xD8\xFF\xE0", "jpeg"),
            (b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR", "png"),
            (b"RIFF\x00\x00\x00\x00WEBPVP8L\x00\x00", "webp"),
        ];
        for (data, expected) in cases {
            let mut source = ImageSource::new(data).unwrap();
            let found = detect_in(&mut source, &registry, None).unwrap().unwrap();
            assert_eq!(found.id().as_str(), expected);
        }
    }
}
