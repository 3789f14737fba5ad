#![no_main]

use libfuzzer_sys::fuzz_target;
use zensniff::{FormatRegistry, OpenRequest};

fuzz_target!(|data: &[u8]| {
    let registry = FormatRegistry::with_builtin_formats();

    let detected = OpenRequest::new(data).with_registry(&registry).detect();
    let opened = OpenRequest::new(data).with_registry(&registry).open();

    // Opening never succeeds where detection found nothing.
    if let Ok(None) = detected {
        assert!(opened.is_err());
    }
    if let Ok(image) = opened {
        assert!(image.row_stride % zensniff::ROW_ALIGNMENT == 0);
        assert!(image.row_stride >= image.width as usize * image.component_size as usize);
    }
});
