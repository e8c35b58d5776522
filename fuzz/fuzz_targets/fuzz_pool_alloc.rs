#![no_main]

use condor_core::gc::pool::SizeClass;
use condor_core::isolate::{Isolate, IsolateConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Each pair of bytes is one request: the high bit of byte[0] frees the
    // oldest live block, otherwise the pair encodes a size up to 32 KiB.
    let mut iso = Isolate::with_config(IsolateConfig {
        small: 1 << 10,
        medium: 4 << 10,
        large: 16 << 10,
        extra_large: 64 << 10,
        ..IsolateConfig::default()
    });
    let mut live = std::collections::VecDeque::new();

    for pair in data.chunks_exact(2) {
        if pair[0] & 0x80 != 0 {
            if let Some((handle, size)) = live.pop_front() {
                iso.free(handle, size).expect("free of a live block");
            }
            continue;
        }
        let size = (((pair[0] as usize) << 8) | pair[1] as usize).max(1);
        if let Ok(handle) = iso.allocate(size) {
            assert!(iso.block(handle).is_some_and(|b| b.len() == size));
            live.push_back((handle, size));
        }
        for class in SizeClass::ALL {
            let pool = iso.pool(class);
            assert!(pool.used() <= pool.capacity(), "{class} pool over capacity");
        }
    }

    while let Some((handle, size)) = live.pop_front() {
        iso.free(handle, size).expect("free of a live block");
    }
    for class in [SizeClass::Small, SizeClass::Medium, SizeClass::Large, SizeClass::ExtraLarge] {
        assert_eq!(iso.pool(class).used(), 0, "{class} pool not empty after freeing everything");
    }
});
