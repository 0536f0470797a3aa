#![no_main]

use libfuzzer_sys::fuzz_target;
use markup::split_skeleton;

// The splitter only ever sees renderer-produced markup in production, but it
// must never panic or mis-slice on arbitrary input.
fuzz_target!(|data: &[u8]| {
    let Ok(html) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(skeleton) = split_skeleton(html) {
        let pre_len = skeleton.head.len()
            + skeleton.deferred_scripts.map_or(0, str::len)
            + skeleton.tail.len();
        assert!(pre_len <= html.len());
        assert!(skeleton.post_body.len() <= html.len());
    }
});
