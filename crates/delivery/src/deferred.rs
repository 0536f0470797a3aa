//! Deferred (JS) placeholder sending.
//!
//! After the whole skeleton is on the wire, each remaining placeholder goes
//! out as one self-contained `<script type="application/json">` data block
//! the client-side runtime executes: a replace command for the placeholder's
//! DOM node plus load commands for any assets new to this response. A start
//! signal precedes the first block and a stop signal follows the last —
//! emitted only when there is at least one block.

use std::collections::BTreeMap;
use std::io::Write;

use assets::AttachedAssets;
use serde::Serialize;

use crate::collab::{
    AttachmentProcessor, Descriptor, PlaceholderRender, SettingsMap, process_with_fallback,
};
use crate::error::DeliveryError;
use crate::inline::render_error_fragment;
use crate::writer::{ChunkKind, ChunkWriter};

/// One instruction for the client-side runtime.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Command<'a> {
    /// Replace the placeholder's DOM node with rendered markup.
    Replace { selector: String, markup: &'a str },
    /// Load assets the markup depends on, before it is inserted.
    LoadAssets {
        styles: &'a str,
        scripts: &'a str,
        scripts_bottom: &'a str,
        settings: &'a SettingsMap,
    },
}

fn signal(event: &str) -> String {
    format!("<script type=\"application/json\" data-trickle-event=\"{event}\"></script>\n")
}

/// `querySelector` decodes HTML entities in attribute selectors, so the
/// selector must carry the decoded id even though the markers in the
/// skeleton carry the encoded form.
fn replace_selector(id: &str) -> String {
    format!(
        "[data-trickle-placeholder-id=\"{}\"]",
        markup::decode_entities(id)
    )
}

/// Streams the deferred placeholders in marker order, bracketed by signals.
///
/// Ids in `order` with no declared placeholder are skipped (the upstream
/// renderer may have pruned one after embedding its marker). Declared
/// placeholders whose marker never occurred in the head have no DOM node to
/// replace and are skipped too.
pub(crate) fn send_deferred_placeholders<W, R, P>(
    placeholders: &BTreeMap<String, Descriptor>,
    order: &[String],
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
    if placeholders.is_empty() {
        return Ok(());
    }

    writer.send(ChunkKind::Signal, &format!("\n{}", signal("start")))?;

    for id in order {
        let Some(descriptor) = placeholders.get(id) else {
            log::debug!(
                target: "delivery.deferred",
                "marker order names undeclared placeholder {id:?}; skipping"
            );
            continue;
        };
        let block = replacement_block(id, descriptor, renderer, processor, cumulative)?;
        writer.send(ChunkKind::DeferredReplacement, &block)?;
    }

    writer.send(ChunkKind::Signal, &signal("stop"))
}

/// Builds one placeholder's data block, updating the cumulative asset state
/// with whatever the block's load commands deliver.
fn replacement_block<R, P>(
    id: &str,
    descriptor: &Descriptor,
    renderer: &mut R,
    processor: &mut P,
    cumulative: &mut AttachedAssets,
) -> Result<String, DeliveryError>
where
    R: PlaceholderRender,
    P: AttachmentProcessor,
{
    let (fragment_markup, requirements) = match renderer.render_placeholder(id, descriptor) {
        Ok(fragment) => (fragment.markup, fragment.attachments),
        Err(err) => {
            log::error!(
                target: "delivery.deferred",
                "render of deferred placeholder {id:?} failed ({err}); substituting error fragment"
            );
            (render_error_fragment(id), AttachedAssets::default())
        }
    };

    let delta = process_with_fallback(processor, &requirements, cumulative, id);
    cumulative.merge_from(&delta.loaded);

    let mut commands = vec![Command::Replace {
        selector: replace_selector(id),
        markup: &fragment_markup,
    }];
    let has_assets = !delta.styles.is_empty()
        || !delta.scripts.is_empty()
        || !delta.scripts_bottom.is_empty()
        || !delta.loaded.settings().is_empty();
    if has_assets {
        // Asset loading comes first on the client; order in the block is the
        // execution order.
        commands.insert(
            0,
            Command::LoadAssets {
                styles: &delta.styles,
                scripts: &delta.scripts,
                scripts_bottom: &delta.scripts_bottom,
                settings: delta.loaded.settings(),
            },
        );
    }
    let payload = serde_json::to_string(&commands)?;

    Ok(format!(
        "<script type=\"application/json\" data-trickle-replacement-for-placeholder-with-id=\"{id}\">\n{payload}\n</script>\n"
    ))
}
