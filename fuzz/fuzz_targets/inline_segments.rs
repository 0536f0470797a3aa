#![no_main]

use libfuzzer_sys::fuzz_target;
use markup::{Segment, split_inline_segments};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    // Use a slice of the input itself as a marker so matches actually occur.
    let marker_len = (input.len() / 4).max(1);
    let Some(marker) = input.get(..marker_len) else {
        return;
    };
    if marker.is_empty() {
        return;
    }
    let segments = split_inline_segments(input, &[marker]);
    // Segments must reassemble the input byte for byte.
    let reassembled: String = segments
        .iter()
        .map(|s| match s {
            Segment::Markup(m) => *m,
            Segment::Placeholder(p) => *p,
        })
        .collect();
    assert_eq!(reassembled, input);
});
