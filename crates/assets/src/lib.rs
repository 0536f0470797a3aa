//! Attached-asset bookkeeping for one streamed response.
//!
//! A chunked response must never resend an asset library or drop a client
//! setting a later chunk depends on, so every chunk's attachments fold into
//! one cumulative record scoped to the response. The record only grows:
//! libraries are never removed and settings are never dropped, only merged.
//!
//! Not thread-safe, deliberately. One response is served by one sequential
//! pipeline that exclusively owns its `AttachedAssets` value.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// Asset libraries plus client settings attached to some markup.
///
/// Doubles as the per-placeholder requirement set and as the cumulative
/// already-delivered record; the two only differ in how long they live.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachedAssets {
    libraries: BTreeSet<String>,
    settings: BTreeMap<String, Value>,
}

impl AttachedAssets {
    pub fn new(
        libraries: impl IntoIterator<Item = String>,
        settings: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let mut assets = Self::default();
        assets.merge(libraries, settings);
        assets
    }

    /// The library identifiers delivered (or required) so far.
    pub fn libraries(&self) -> &BTreeSet<String> {
        &self.libraries
    }

    /// The client settings delivered (or required) so far.
    pub fn settings(&self) -> &BTreeMap<String, Value> {
        &self.settings
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty() && self.settings.is_empty()
    }

    /// Folds new libraries and settings in. Idempotent: merging the same
    /// inputs twice changes nothing.
    ///
    /// Settings merge key-wise. When both the present and the incoming value
    /// are JSON objects they merge recursively (union of keys, incoming wins
    /// on scalar conflicts); otherwise the incoming value replaces the old
    /// one. A key, once set, never disappears.
    pub fn merge(
        &mut self,
        libraries: impl IntoIterator<Item = String>,
        settings: impl IntoIterator<Item = (String, Value)>,
    ) {
        for library in libraries {
            if self.libraries.insert(library.clone()) {
                log::trace!(target: "assets", "library now cumulative: {library}");
            }
        }
        for (key, incoming) in settings {
            match self.settings.get_mut(&key) {
                Some(present) => merge_setting(present, incoming),
                None => {
                    self.settings.insert(key, incoming);
                }
            }
        }
    }

    /// Folds another asset record in. Same semantics as [`merge`](Self::merge).
    pub fn merge_from(&mut self, other: &AttachedAssets) {
        self.merge(
            other.libraries.iter().cloned(),
            other.settings.iter().map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    /// Libraries in `self` not present in `already_loaded`.
    pub fn libraries_not_in<'a>(
        &'a self,
        already_loaded: &AttachedAssets,
    ) -> impl Iterator<Item = &'a str> {
        self.libraries
            .iter()
            .filter(|l| !already_loaded.libraries.contains(*l))
            .map(String::as_str)
    }
}

fn merge_setting(present: &mut Value, incoming: Value) {
    match (present, incoming) {
        (Value::Object(present), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match present.get_mut(&key) {
                    Some(slot) => merge_setting(slot, value),
                    None => {
                        present.insert(key, value);
                    }
                }
            }
        }
        (present, incoming) => *present = incoming,
    }
}
