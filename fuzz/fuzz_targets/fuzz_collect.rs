#![no_main]

use condor_core::gc::trace::TraceOptions;
use condor_core::isolate::Isolate;
use condor_core::parser::{ParserFlags, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let mut iso = Isolate::new();
    let Ok(root) = parse(&mut iso, source, ParserFlags::default()) else {
        return;
    };

    // Rooted through the context: nothing may be freed.
    let nodes = iso.live_nodes();
    let stats = iso.collect(root, TraceOptions::FULL);
    assert_eq!(stats.objects_freed(), 0, "collect freed a rooted tree");
    assert_eq!(iso.live_nodes(), nodes);

    // Unrooted: a full collection reclaims the whole tree.
    iso.context_mut().expect("context exists after parse").unregister_root(root);
    iso.collect(root, TraceOptions::FULL);
    assert!(iso.scope(root).is_none(), "unrooted root survived collection");
});
