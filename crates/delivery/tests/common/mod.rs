//! Shared fakes for delivery integration tests: scripted collaborators, an
//! event log for interleaving assertions, and a flush-recording writer.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::rc::Rc;

use assets::AttachedAssets;
use delivery::{
    AssetDelta, AttachmentProcessor, CollaboratorError, Descriptor, Document, PlaceholderRender,
    RenderedFragment, Session,
};
use serde_json::{Value, json};

pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Scripted placeholder renderer. Fragments are keyed by placeholder id (or
/// inline marker string); unknown and explicitly failing ids return errors.
pub struct FakeRender {
    pub fragments: BTreeMap<String, RenderedFragment>,
    pub failing: Vec<String>,
    pub log: EventLog,
}

impl FakeRender {
    pub fn new(log: EventLog) -> Self {
        Self {
            fragments: BTreeMap::new(),
            failing: Vec::new(),
            log,
        }
    }

    pub fn fragment(
        mut self,
        id: &str,
        markup: &str,
        libraries: &[&str],
        settings: &[(&str, Value)],
    ) -> Self {
        self.fragments.insert(
            id.to_string(),
            RenderedFragment {
                markup: markup.to_string(),
                attachments: AttachedAssets::new(
                    libraries.iter().map(|l| l.to_string()),
                    settings.iter().map(|(k, v)| (k.to_string(), v.clone())),
                ),
            },
        );
        self
    }

    pub fn fails_on(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }
}

impl PlaceholderRender for FakeRender {
    fn render_placeholder(
        &mut self,
        id: &str,
        _descriptor: &Descriptor,
    ) -> Result<RenderedFragment, CollaboratorError> {
        self.log.borrow_mut().push(format!("render {id}"));
        if self.failing.iter().any(|f| f == id) {
            return Err(CollaboratorError::new("scripted render failure"));
        }
        self.fragments
            .get(id)
            .cloned()
            .ok_or_else(|| CollaboratorError::new(format!("no scripted fragment for {id}")))
    }
}

/// Deterministic attachment processor: one `<link>` per new stylesheet-ish
/// library, one `<script>` per new header script, one deferred `<script>`
/// per new library in the bottom region. Reports everything in the
/// requirements as loaded.
pub struct FakeAssetPipeline {
    pub fail_next: usize,
    pub calls: Vec<(Vec<String>, Vec<String>)>, // (required, already loaded)
}

impl FakeAssetPipeline {
    pub fn new() -> Self {
        Self {
            fail_next: 0,
            calls: Vec::new(),
        }
    }
}

pub fn style_load_markup(library: &str) -> String {
    format!("<link rel=\"stylesheet\" href=\"/lib/{library}.css\">")
}

pub fn script_load_markup(library: &str) -> String {
    format!("<script src=\"/lib/{library}.js\"></script>")
}

pub fn bottom_script_load_markup(library: &str) -> String {
    format!("<script defer src=\"/lib/{library}.bottom.js\"></script>")
}

impl AttachmentProcessor for FakeAssetPipeline {
    fn process_attachments(
        &mut self,
        requirements: &AttachedAssets,
        already_loaded: &AttachedAssets,
    ) -> Result<AssetDelta, CollaboratorError> {
        self.calls.push((
            requirements.libraries().iter().cloned().collect(),
            already_loaded.libraries().iter().cloned().collect(),
        ));
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(CollaboratorError::new("scripted attachment failure"));
        }
        let mut delta = AssetDelta::default();
        for library in requirements.libraries_not_in(already_loaded) {
            delta.styles.push_str(&style_load_markup(library));
            delta.scripts.push_str(&script_load_markup(library));
            delta.scripts_bottom.push_str(&bottom_script_load_markup(library));
        }
        delta.loaded = requirements.clone();
        Ok(delta)
    }
}

pub struct FakeSession {
    pub log: EventLog,
}

impl FakeSession {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Session for FakeSession {
    fn open(&mut self) {
        self.log.borrow_mut().push("session open".to_string());
    }

    fn persist(&mut self) {
        self.log.borrow_mut().push("session persist".to_string());
    }
}

/// `io::Write` that captures one string per flushed logical chunk, and can
/// simulate a client disconnect after a set number of chunks.
pub struct RecordingWriter {
    pending: Vec<u8>,
    pub chunks: Vec<String>,
    pub fail_after_chunks: Option<usize>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            chunks: Vec::new(),
            fail_after_chunks: None,
        }
    }

    pub fn failing_after(chunks: usize) -> Self {
        Self {
            fail_after_chunks: Some(chunks),
            ..Self::new()
        }
    }

    pub fn output(&self) -> String {
        self.chunks.concat()
    }
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(limit) = self.fail_after_chunks {
            if self.chunks.len() >= limit {
                return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
            }
        }
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            let chunk = String::from_utf8(std::mem::take(&mut self.pending))
                .expect("chunks are valid UTF-8");
            self.chunks.push(chunk);
        }
        Ok(())
    }
}

/// A document whose maps carry the given inline markers and deferred ids,
/// each with a throwaway descriptor.
pub fn document(html: &str, inline_markers: &[&str], deferred_ids: &[&str]) -> Document {
    Document {
        html: html.to_string(),
        inline_placeholders: inline_markers
            .iter()
            .map(|m| (m.to_string(), json!({"marker": m})))
            .collect(),
        deferred_placeholders: deferred_ids
            .iter()
            .map(|id| (id.to_string(), json!({"id": id})))
            .collect(),
        ..Document::default()
    }
}

/// Extracts the JSON payloads of all deferred replacement blocks in `output`
/// as `(placeholder id, commands)` pairs, in emission order.
pub fn replacement_blocks(output: &str) -> Vec<(String, Value)> {
    const OPEN: &str = "data-trickle-replacement-for-placeholder-with-id=\"";
    let mut blocks = Vec::new();
    let mut rest = output;
    while let Some(at) = rest.find(OPEN) {
        rest = &rest[at + OPEN.len()..];
        let id_end = rest.find('"').expect("unterminated id attribute");
        let id = rest[..id_end].to_string();
        let body_start = rest.find('>').expect("unterminated script tag") + 1;
        let body_end = rest.find("</script>").expect("unterminated script block");
        let payload: Value =
            serde_json::from_str(rest[body_start..body_end].trim()).expect("payload is JSON");
        blocks.push((id, payload));
        rest = &rest[body_end..];
    }
    blocks
}
