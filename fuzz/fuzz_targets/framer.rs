//! If we panic!, we lose.
//!
//! ```not_rust
//! cargo +nightly fuzz run framer
//! ```

#![no_main]

use atframe::{AtMaster, LineMode, ResponseKind, status::NoStatus};
use libfuzzer_sys::fuzz_target;

const CAP: usize = 64;

fuzz_target!(|data: &[u8]| {
    let Some((&control, bytes)) = data.split_first() else {
        return;
    };

    let master = AtMaster::<'_, NoStatus, CAP>::new(b"OK", b"ERROR", NoStatus);
    master.set_init_prefix(b"RDY");
    master.set_custom_prefix(b"+C");

    match control % 3 {
        0 => {}
        1 => master.set_line_mode(LineMode::Lf),
        _ => master.set_length_mode(usize::from(control >> 2) + 1),
    }

    let mut dest = [0_u8; CAP + 1];
    let mut framed = 0_u32;

    for (i, &byte) in bytes.iter().enumerate() {
        master.on_byte(byte);

        assert!(master.buffered() <= CAP);

        // Drain every few bytes to interleave producer and consumer.
        if i % 7 == 0 {
            while master.has_data() {
                let pending = master.pending();
                let kind = master.process(Some(&mut dest));

                assert_ne!(kind, ResponseKind::None);
                assert_eq!(master.pending(), pending - 1);

                framed += 1;
            }
        }
    }

    while master.process(None) != ResponseKind::None {
        framed += 1;
    }

    assert_eq!(master.pending(), 0);

    if master.dropped() == 0 && control % 3 == 1 {
        let line_feeds = bytes.iter().filter(|&&byte| byte == b'\n').count();

        assert_eq!(framed as usize, line_feeds);
    }
});
