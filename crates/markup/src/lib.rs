//! Trusted-marker text machinery for progressive HTML delivery.
//!
//! The upstream renderer is the only producer of the markup handled here, and
//! it guarantees that marker strings never collide with user content (loader
//! markers carry random tokens for exactly that reason). Everything in this
//! crate is therefore plain substring work over well-known markers, not HTML
//! parsing.

pub mod entities;
pub mod order;
pub mod segments;

use memchr::memmem;

pub use crate::entities::{decode_entities, escape_attribute};
pub use crate::order::deferred_placeholder_order;
pub use crate::segments::{Segment, split_inline_segments};

/// Literal closing body tag; the cut point between pre-body and post-body.
pub const BODY_CLOSE: &str = "</body>";

/// Marker pair bracketing the deferred-scripts region inside the pre-body
/// markup. The upstream renderer emits it twice: once before and once after
/// the markup that loads non-critical scripts.
pub const DEFERRED_SCRIPTS_MARKER: &str = "<trickle-deferred-scripts-marker>";

/// Embed marker wrapping a deferred placeholder's id, as the upstream
/// renderer leaves it in the skeleton.
pub const PLACEHOLDER_MARKER_PREFIX: &str = "<div data-trickle-placeholder-id=\"";
pub const PLACEHOLDER_MARKER_SUFFIX: &str = "\"></div>";

/// Builds the embed marker for a deferred placeholder id.
pub fn deferred_placeholder_marker(id: &str) -> String {
    format!("{PLACEHOLDER_MARKER_PREFIX}{id}{PLACEHOLDER_MARKER_SUFFIX}")
}

/// Loader marker standing in for the stylesheets an inline replacement needs.
pub fn styles_loader_marker(token: &str) -> String {
    format!("<trickle-inline-styles-loader token=\"{token}\">")
}

/// Loader marker standing in for the header scripts an inline replacement needs.
pub fn scripts_loader_marker(token: &str) -> String {
    format!("<trickle-inline-scripts-loader token=\"{token}\">")
}

/// The document cut into its delivery regions. Slices borrow from the input;
/// marker bytes belong to no region and are never sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton<'a> {
    /// Everything before the deferred-scripts region (or the whole pre-body
    /// when the document has none).
    pub head: &'a str,
    /// The markup between the two deferred-scripts marker occurrences.
    pub deferred_scripts: Option<&'a str>,
    /// Everything between the deferred-scripts region and `</body>`.
    pub tail: &'a str,
    /// Everything after `</body>`.
    pub post_body: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonError {
    /// No `</body>` in the document; the response framing cannot be decided.
    MissingBodyClose,
    /// A deferred-scripts marker without its closing twin.
    UnpairedDeferredScriptsMarker,
}

impl std::fmt::Display for SkeletonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkeletonError::MissingBodyClose => write!(f, "markup has no closing </body> tag"),
            SkeletonError::UnpairedDeferredScriptsMarker => {
                write!(f, "deferred-scripts marker occurs without its closing twin")
            }
        }
    }
}

impl std::error::Error for SkeletonError {}

/// Cuts the full generated document into delivery regions.
///
/// Contract:
/// - Fails if `</body>` is absent. Callers must run this before writing any
///   byte of the response: once the first chunk is flushed the framing can no
///   longer change, so a malformed skeleton has to surface as an ordinary
///   error response instead.
/// - The deferred-scripts marker is optional but must occur in a pair. Extra
///   occurrences beyond the first pair are left in `tail` untouched.
/// - Splits on the first `</body>`; the upstream renderer emits exactly one.
pub fn split_skeleton(html: &str) -> Result<Skeleton<'_>, SkeletonError> {
    let body_close = memmem::find(html.as_bytes(), BODY_CLOSE.as_bytes())
        .ok_or(SkeletonError::MissingBodyClose)?;
    let pre_body = &html[..body_close];
    let post_body = &html[body_close + BODY_CLOSE.len()..];

    let marker = DEFERRED_SCRIPTS_MARKER.as_bytes();
    let Some(open) = memmem::find(pre_body.as_bytes(), marker) else {
        return Ok(Skeleton {
            head: pre_body,
            deferred_scripts: None,
            tail: "",
            post_body,
        });
    };
    let after_open = open + DEFERRED_SCRIPTS_MARKER.len();
    let close = memmem::find(pre_body[after_open..].as_bytes(), marker)
        .ok_or(SkeletonError::UnpairedDeferredScriptsMarker)?;
    let close = after_open + close;

    Ok(Skeleton {
        head: &pre_body[..open],
        deferred_scripts: Some(&pre_body[after_open..close]),
        tail: &pre_body[close + DEFERRED_SCRIPTS_MARKER.len()..],
        post_body,
    })
}
