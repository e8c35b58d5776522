#![no_main]

use condor_core::isolate::Isolate;
use condor_core::parser::{ParserFlags, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let flags = ParserFlags {
        allow_natives: data.first().is_some_and(|b| b & 1 == 1),
        ..ParserFlags::default()
    };

    let mut iso = Isolate::new();
    match parse(&mut iso, source, flags) {
        Ok(root) => {
            assert!(iso.scope(root).is_some(), "parse must return a live root");
        }
        Err(_) => {
            // A failed parse must hand back everything it allocated.
            assert_eq!(iso.live_nodes(), 0, "failed parse leaked nodes");
            assert_eq!(iso.live_scopes(), 0, "failed parse leaked scopes");
        }
    }
});

