//! Deferred-placeholder delivery order.
//!
//! The order in which deferred placeholders stream to the client is decided
//! once, from the first occurrence of each id's embed marker in the head
//! markup. Map iteration order over the declared placeholders never matters.

use memchr::memmem;

use crate::{PLACEHOLDER_MARKER_PREFIX, PLACEHOLDER_MARKER_SUFFIX};

/// Scans `head` for embed markers and returns placeholder ids in document
/// order.
///
/// Contract:
/// - A given id appears at most once, at the position of its first marker.
/// - A truncated marker (prefix without the closing `"></div>`) ends the
///   scan; everything before it is still returned.
/// - Ids are returned as found. Filtering against the declared placeholder
///   map is the sender's job.
pub fn deferred_placeholder_order(head: &str) -> Vec<String> {
    let prefix = memmem::Finder::new(PLACEHOLDER_MARKER_PREFIX.as_bytes());
    let suffix = memmem::Finder::new(PLACEHOLDER_MARKER_SUFFIX.as_bytes());
    let bytes = head.as_bytes();

    let mut order: Vec<String> = Vec::new();
    let mut pos = 0;
    while let Some(rel) = prefix.find(&bytes[pos..]) {
        let id_start = pos + rel + PLACEHOLDER_MARKER_PREFIX.len();
        let Some(id_len) = suffix.find(&bytes[id_start..]) else {
            log::warn!(
                target: "markup.order",
                "truncated placeholder marker at byte {}; ignoring the rest of head",
                pos + rel
            );
            break;
        };
        let id = &head[id_start..id_start + id_len];
        if !order.iter().any(|seen| seen == id) {
            order.push(id.to_string());
        }
        pos = id_start + id_len + PLACEHOLDER_MARKER_SUFFIX.len();
    }
    order
}
