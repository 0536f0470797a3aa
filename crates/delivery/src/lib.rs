//! Progressive HTML delivery engine.
//!
//! Sends a fully generated HTML document over one connection in ordered,
//! individually flushed chunks, substituting placeholders as they become
//! ready instead of blocking the whole response on the slowest fragment.
//! Two strategies interleave: inline (no-JS) placeholders substitute in
//! place while the skeleton streams; deferred (JS) placeholders follow the
//! skeleton as script-tag data blocks a client-side runtime executes.
//!
//! Chunks are write-once and flush-forward. Earlier bytes are never revised
//! once sent, which is why a malformed skeleton must be caught before the
//! first write and why mid-stream collaborator failures degrade a single
//! fragment instead of failing the response.

pub mod collab;
mod deferred;
mod error;
mod inline;
mod writer;

use std::io::Write;

use assets::AttachedAssets;
use markup::{BODY_CLOSE, deferred_placeholder_order, split_skeleton};

pub use crate::collab::{
    AssetDelta, AttachmentProcessor, CollaboratorError, Descriptor, LibrarySet, PlaceholderRender,
    RenderedFragment, Session, SettingsMap,
};
pub use crate::error::DeliveryError;
pub use crate::writer::{ChunkKind, ChunkWriter};

/// A generated HTML document with its declared attachments, as handed over
/// by the upstream render pipeline. Read-only input to the engine.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The full markup, trusted markers included.
    pub html: String,
    /// Asset libraries the markup already loads; the baseline the client is
    /// assumed to have once the skeleton arrives.
    pub libraries: LibrarySet,
    /// Client settings already carried by the markup.
    pub settings: SettingsMap,
    /// Inline placeholders, keyed by the literal marker string each one
    /// occupies in the skeleton.
    pub inline_placeholders: std::collections::BTreeMap<String, Descriptor>,
    /// Deferred placeholders, keyed by placeholder id. Emission order comes
    /// from marker positions in the head, never from this map's order.
    pub deferred_placeholders: std::collections::BTreeMap<String, Descriptor>,
}

/// The delivery pipeline for one response.
///
/// Everything stateful lives in collaborators or in the per-send cumulative
/// asset record; a `Delivery` can send any number of documents in sequence.
pub struct Delivery<'a, R, P, S> {
    renderer: &'a mut R,
    attachments: &'a mut P,
    session: &'a mut S,
}

impl<'a, R, P, S> Delivery<'a, R, P, S>
where
    R: PlaceholderRender,
    P: AttachmentProcessor,
    S: Session,
{
    pub fn new(renderer: &'a mut R, attachments: &'a mut P, session: &'a mut S) -> Self {
        Self {
            renderer,
            attachments,
            session,
        }
    }

    /// Streams `document` to `out` per the chunked wire contract:
    ///
    /// 1. head and tail markup with inline replacements, in document order;
    /// 2. the deferred-scripts region, regenerated if inline rendering
    ///    attached new assets;
    /// 3. when deferred placeholders exist: a start signal, one data block
    ///    per placeholder in marker order, a stop signal;
    /// 4. `</body>` and everything after it.
    ///
    /// Fails before the first write on a malformed skeleton; aborts without
    /// compensating writes when the transport drops.
    pub fn send<W: Write>(&mut self, document: &Document, out: W) -> Result<(), DeliveryError> {
        let skeleton = split_skeleton(&document.html)?;
        let order = deferred_placeholder_order(skeleton.head);
        let mut cumulative =
            AttachedAssets::new(document.libraries.iter().cloned(), document.settings.clone());
        let mut writer = ChunkWriter::new(out);

        log::debug!(
            target: "delivery",
            "sending document: {} inline, {} deferred ({} ordered), {} baseline libraries",
            document.inline_placeholders.len(),
            document.deferred_placeholders.len(),
            order.len(),
            document.libraries.len()
        );

        // Placeholder content may be session-backed. The session stays open
        // only for the inline span: deferred placeholders need no write
        // access, and a held-open session would serialize every other
        // request from the same client behind this response.
        self.session.open();
        let inline_sent = inline::send_pre_body(
            &skeleton,
            &document.inline_placeholders,
            self.renderer,
            self.attachments,
            &mut cumulative,
            &mut writer,
        );
        self.session.persist();
        inline_sent?;

        deferred::send_deferred_placeholders(
            &document.deferred_placeholders,
            &order,
            self.renderer,
            self.attachments,
            &mut cumulative,
            &mut writer,
        )?;

        let tail = format!("{BODY_CLOSE}{}", skeleton.post_body);
        writer.send(ChunkKind::Tail, &tail)
    }
}
