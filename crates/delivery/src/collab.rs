//! Collaborator seams.
//!
//! The engine owns ordering and bookkeeping only. Rendering a placeholder,
//! computing asset-load markup, and session storage all live behind these
//! traits; production wiring and test fakes plug in the same way.

use std::collections::{BTreeMap, BTreeSet};

use assets::AttachedAssets;
use serde_json::Value;

/// Opaque render descriptor handed through from the upstream render pipeline.
/// The engine never inspects it.
pub type Descriptor = Value;

/// A placeholder rendered by the external collaborator: its markup plus the
/// asset libraries and settings that markup needs on the client.
#[derive(Debug, Clone, Default)]
pub struct RenderedFragment {
    pub markup: String,
    pub attachments: AttachedAssets,
}

/// Markup and bookkeeping for loading exactly the assets in a requirement
/// set that the client does not already have.
#[derive(Debug, Clone, Default)]
pub struct AssetDelta {
    /// Markup loading new stylesheets; goes in front of the fragment markup.
    pub styles: String,
    /// Markup loading new header scripts; also in front of the fragment.
    pub scripts: String,
    /// Markup loading new non-critical scripts; belongs in the
    /// deferred-scripts region.
    pub scripts_bottom: String,
    /// Libraries and settings the delta markup delivers; fold into the
    /// cumulative record once the markup is on the wire.
    pub loaded: AttachedAssets,
}

/// Failure inside a collaborator. Opaque to the engine; it only decides
/// whether to degrade or abort.
#[derive(Debug, Clone)]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CollaboratorError {}

/// Renders one placeholder, and just that placeholder.
///
/// Must be idempotent for a given id within one response, and must not
/// mutate shared state except through the returned attachments. May block
/// (cache lookups, I/O); the engine waits synchronously.
pub trait PlaceholderRender {
    fn render_placeholder(
        &mut self,
        id: &str,
        descriptor: &Descriptor,
    ) -> Result<RenderedFragment, CollaboratorError>;
}

/// Computes the minimal markup that loads the libraries and settings in
/// `requirements` not already present in `already_loaded`.
pub trait AttachmentProcessor {
    fn process_attachments(
        &mut self,
        requirements: &AttachedAssets,
        already_loaded: &AttachedAssets,
    ) -> Result<AssetDelta, CollaboratorError>;
}

/// Session storage behind the per-user placeholders. Held open only for the
/// inline-rendering span, not the whole response.
pub trait Session {
    fn open(&mut self);
    fn persist(&mut self);
}

/// Runs the attachment processor, degrading instead of failing the response.
///
/// First failure: retry once against an empty baseline, i.e. resend the full
/// non-deltaed set for this fragment. Second failure: give up on load markup
/// for this fragment but report `requirements` as loaded anyway, so the same
/// libraries are not retried on every later placeholder.
pub(crate) fn process_with_fallback<P: AttachmentProcessor>(
    processor: &mut P,
    requirements: &AttachedAssets,
    already_loaded: &AttachedAssets,
    context: &str,
) -> AssetDelta {
    match processor.process_attachments(requirements, already_loaded) {
        Ok(delta) => delta,
        Err(err) => {
            log::warn!(
                target: "delivery.attachments",
                "attachment delta for {context} failed ({err}); resending the full set"
            );
            match processor.process_attachments(requirements, &AttachedAssets::default()) {
                Ok(delta) => delta,
                Err(err) => {
                    log::error!(
                        target: "delivery.attachments",
                        "full-set attachment processing for {context} failed ({err}); \
                         continuing without load markup"
                    );
                    AssetDelta {
                        loaded: requirements.clone(),
                        ..AssetDelta::default()
                    }
                }
            }
        }
    }
}

/// Settings map alias used across the wire payloads.
pub type SettingsMap = BTreeMap<String, Value>;
/// Library set alias used across the wire payloads.
pub type LibrarySet = BTreeSet<String>;
