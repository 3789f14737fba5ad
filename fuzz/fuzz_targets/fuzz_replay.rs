#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zensniff::{ImageInput, ImageSource};

#[derive(Arbitrary, Debug)]
enum Op {
    Read(u16),
    Remaining,
    Rewind,
}

#[derive(Arbitrary, Debug)]
struct Input {
    data: Vec<u8>,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let mut reader = input.data.as_slice();
    let Ok(mut source) = ImageSource::new(ImageInput::reader(&mut reader)) else {
        return;
    };

    let mut cursor = 0usize;
    for op in input.ops.iter().take(64) {
        match *op {
            Op::Read(len) => {
                let bytes = source.read_bytes(len as usize).unwrap();
                let end = (cursor + len as usize).min(input.data.len());
                assert_eq!(bytes, &input.data[cursor..end]);
                cursor = end;
            }
            Op::Remaining => {
                let bytes = source.read_remaining().unwrap();
                assert_eq!(bytes, &input.data[cursor..]);
                cursor = input.data.len();
            }
            Op::Rewind => {
                source.rewind();
                cursor = 0;
            }
        }
        assert_eq!(source.position(), cursor);
        assert!(source.buffered_len() <= input.data.len());
    }
});
