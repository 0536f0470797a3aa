//! Delimiter-preserving split of head markup around inline placeholders.
//!
//! Inline placeholders sit in the skeleton as literal marker strings unique
//! to each placeholder. Streaming substitutes them in place, so the split
//! must keep the markers as their own segments and drop nothing else.

use memchr::memmem;

/// One piece of the head markup, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain markup between placeholders; streamed verbatim.
    Markup(&'a str),
    /// An inline placeholder's marker string, exactly as declared.
    Placeholder(&'a str),
}

/// Splits `html` into plain-markup and placeholder segments.
///
/// Contract:
/// - Segments concatenate back to `html` byte for byte.
/// - Empty markup runs between adjacent markers are dropped.
/// - At equal offsets the longest marker wins, so a marker that is a prefix
///   of another cannot shadow it.
/// - With no `markers`, the whole input is one markup segment (or nothing,
///   when `html` is empty).
pub fn split_inline_segments<'a>(html: &'a str, markers: &[&str]) -> Vec<Segment<'a>> {
    let finders: Vec<(memmem::Finder<'_>, usize)> = markers
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| (memmem::Finder::new(m.as_bytes()), m.len()))
        .collect();

    let bytes = html.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let mut next: Option<(usize, usize)> = None; // (offset, marker len)
        for (finder, len) in &finders {
            let Some(rel) = finder.find(&bytes[pos..]) else {
                continue;
            };
            let offset = pos + rel;
            let better = match next {
                None => true,
                Some((best_offset, best_len)) => {
                    offset < best_offset || (offset == best_offset && *len > best_len)
                }
            };
            if better {
                next = Some((offset, *len));
            }
        }
        let Some((offset, len)) = next else {
            segments.push(Segment::Markup(&html[pos..]));
            break;
        };
        if offset > pos {
            segments.push(Segment::Markup(&html[pos..offset]));
        }
        segments.push(Segment::Placeholder(&html[offset..offset + len]));
        pos = offset + len;
    }
    segments
}
