//! Minimal entity handling for placeholder ids.
//!
//! Placeholder ids arrive HTML-entity-encoded because the upstream renderer
//! embeds them in attribute values. Client-side `querySelector` decodes
//! entities in attribute selectors, so the replace command must carry the
//! decoded form; the `<script>` wrapper attribute needs the opposite
//! direction.

/// Decode a minimal, explicitly limited subset of HTML entities.
///
/// Contract:
/// - Named entities decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`.
/// - Decimal entities (`&#123;`) decoded when well-formed,
///   semicolon-terminated, and a valid Unicode scalar.
/// - Anything else passes through unchanged.
///
/// Intentionally not HTML5-spec-complete; ids only ever carry the encodings
/// the upstream attribute escaper produces.
pub fn decode_entities(s: &str) -> String {
    const NAMED: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
    ];
    const MAX_DEC_DIGITS: usize = 7; // 1114111

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    'outer: while i < bytes.len() {
        if bytes[i] != b'&' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'&' {
                i += 1;
            }
            out.push_str(&s[start..i]);
            continue;
        }
        for (name, ch) in NAMED {
            if s[i..].starts_with(name) {
                out.push(ch);
                i += name.len();
                continue 'outer;
            }
        }
        if s[i..].starts_with("&#") {
            let digits_start = i + 2;
            let mut j = digits_start;
            while j < bytes.len()
                && bytes[j].is_ascii_digit()
                && j - digits_start < MAX_DEC_DIGITS
            {
                j += 1;
            }
            if j > digits_start && bytes.get(j) == Some(&b';') {
                let decoded = s[digits_start..j]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32);
                if let Some(ch) = decoded {
                    out.push(ch);
                    i = j + 1;
                    continue;
                }
            }
        }
        out.push('&');
        i += 1;
    }
    out
}

/// Escape a string for embedding in a double-quoted HTML attribute value.
pub fn escape_attribute(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
