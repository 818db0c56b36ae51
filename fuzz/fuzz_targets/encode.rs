//! If we panic!, we lose.
//!
//! ```not_rust
//! cargo +nightly fuzz run encode
//! ```

#![no_main]

use atframe::{codec::command::Command, encode::Encoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let buf = &mut [0_u8; 64];

    let mut codec = Command::new();

    match codec.encode(data, buf) {
        Ok(size) => {
            assert_eq!(size, data.len() + 2);
            assert_eq!(&buf[..data.len()], data);
            assert_eq!(&buf[data.len()..size], b"\r\n");
        }
        Err(_) => assert!(data.len() + 2 > buf.len()),
    }
});
