#![no_main]

use libfuzzer_sys::fuzz_target;
use markup::deferred_placeholder_order;

fuzz_target!(|data: &[u8]| {
    let Ok(head) = std::str::from_utf8(data) else {
        return;
    };
    let order = deferred_placeholder_order(head);
    // First-occurrence dedup: no id may come back twice.
    for (i, id) in order.iter().enumerate() {
        assert!(!order[i + 1..].contains(id));
    }
});
