//! Inline (no-JS) placeholder substitution.
//!
//! Streams the head and tail regions, replacing each inline placeholder in
//! the textual position its marker occupies. Every replacement is preceded
//! by the markup that loads its critical stylesheets and header scripts, so
//! a fragment never renders before its assets — the same blocking-load
//! guarantee a non-progressive response would have given.

use std::collections::BTreeMap;
use std::io::Write;

use assets::AttachedAssets;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use markup::{Segment, Skeleton, split_inline_segments};
use rand::RngCore;

use crate::collab::{
    AttachmentProcessor, CollaboratorError, Descriptor, PlaceholderRender, process_with_fallback,
};
use crate::error::DeliveryError;
use crate::writer::{ChunkKind, ChunkWriter};

/// Unguessable token for a synthetic loader marker. Random so user content
/// can never collide with marker syntax.
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Minimal, clearly marked stand-in for a placeholder whose render failed.
pub(crate) fn render_error_fragment(id: &str) -> String {
    format!(
        "<span data-trickle-render-error=\"{}\"></span>",
        markup::escape_attribute(id)
    )
}

/// Streams everything up to (but excluding) `</body>`.
///
/// With no inline placeholders the pre-body goes out as one chunk. Otherwise
/// head and tail are walked segment by segment, each plain fragment and each
/// replacement flushed on its own, and the deferred-scripts region goes out
/// last — regenerated when inline rendering grew the cumulative asset state,
/// verbatim when it did not.
pub(crate) fn send_pre_body<W, R, P>(
    skeleton: &Skeleton<'_>,
    inline_placeholders: &BTreeMap<String, Descriptor>,
    renderer: &mut R,
    processor: &mut P,
    cumulative: &mut AttachedAssets,
    writer: &mut ChunkWriter<W>,
) -> Result<(), DeliveryError>
where
    W: Write,
    R: PlaceholderRender,
    P: AttachmentProcessor,
{
    let original_deferred = skeleton.deferred_scripts.unwrap_or("");

    if inline_placeholders.is_empty() {
        let pre_body = format!("{}{}{}", skeleton.head, original_deferred, skeleton.tail);
        return writer.send(ChunkKind::Skeleton, &pre_body);
    }

    let markers: Vec<&str> = inline_placeholders.keys().map(String::as_str).collect();
    let initial = cumulative.clone();

    // The deferred-scripts region streams after the tail, so inline markers
    // in either region substitute in one pass.
    for region in [skeleton.head, skeleton.tail] {
        for segment in split_inline_segments(region, &markers) {
            match segment {
                Segment::Markup(fragment) => writer.send(ChunkKind::Skeleton, fragment)?,
                Segment::Placeholder(marker) => match inline_placeholders.get(marker) {
                    Some(descriptor) => {
                        let chunk =
                            inline_replacement(marker, descriptor, renderer, processor, cumulative);
                        writer.send(ChunkKind::InlineReplacement, &chunk)?;
                    }
                    // Unreachable: the split only yields markers taken from
                    // the map keys. Stream the marker verbatim if it ever
                    // happens anyway.
                    None => writer.send(ChunkKind::Skeleton, marker)?,
                },
            }
        }
    }

    // Deferred scripts were computed against the original asset set. If any
    // inline placeholder attached new libraries or settings, the region must
    // be recomputed or the client will never load them.
    if *cumulative == initial {
        writer.send(ChunkKind::DeferredScriptBlock, original_deferred)
    } else {
        let delta = process_with_fallback(
            processor,
            cumulative,
            &AttachedAssets::default(),
            "deferred-scripts region",
        );
        log::debug!(
            target: "delivery.inline",
            "inline placeholders grew the asset state; deferred-scripts region regenerated"
        );
        writer.send(ChunkKind::DeferredScriptBlock, &delta.scripts_bottom)
    }
}

/// Renders one inline placeholder and builds its replacement chunk:
/// `[stylesheet loaders][header-script loaders][rendered markup]`.
fn inline_replacement<R, P>(
    marker: &str,
    descriptor: &Descriptor,
    renderer: &mut R,
    processor: &mut P,
    cumulative: &mut AttachedAssets,
) -> String
where
    R: PlaceholderRender,
    P: AttachmentProcessor,
{
    let fragment = match renderer.render_placeholder(marker, descriptor) {
        Ok(fragment) => fragment,
        Err(err) => return degraded_inline(marker, &err),
    };

    // Loader markers wrap the rendered markup first; the attachment delta
    // then takes their place. Keeping the marker step explicit keeps the
    // trusted-marker boundary in one shape everywhere.
    let token = random_token();
    let styles_marker = markup::styles_loader_marker(&token);
    let scripts_marker = markup::scripts_loader_marker(&token);
    let wrapped = format!("{styles_marker}{scripts_marker}{}", fragment.markup);

    let delta = process_with_fallback(processor, &fragment.attachments, cumulative, marker);
    cumulative.merge_from(&delta.loaded);

    wrapped
        .replacen(&styles_marker, &delta.styles, 1)
        .replacen(&scripts_marker, &delta.scripts, 1)
}

fn degraded_inline(marker: &str, err: &CollaboratorError) -> String {
    log::error!(
        target: "delivery.inline",
        "render of inline placeholder {marker:?} failed ({err}); substituting error fragment"
    );
    render_error_fragment(marker)
}
