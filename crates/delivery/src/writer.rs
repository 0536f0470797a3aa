//! The single choke point between the engine and the transport.
//!
//! Chunks are write-once and flush-forward: every logical unit is flushed as
//! it is emitted, nothing is buffered past its own send, and an emitted chunk
//! is never revisited. A slow placeholder can therefore never delay markup
//! that already resolved.

use std::io::Write;

use crate::error::DeliveryError;

/// What a chunk carries; trace-logged with every send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Plain skeleton markup between substitutions.
    Skeleton,
    /// An inline (no-JS) placeholder's replacement, loaders included.
    InlineReplacement,
    /// The deferred-scripts region, original or regenerated.
    DeferredScriptBlock,
    /// A start or stop signal line bracketing the deferred replacements.
    Signal,
    /// One deferred (JS) placeholder's self-contained data block.
    DeferredReplacement,
    /// `</body>` plus everything after it.
    Tail,
}

impl ChunkKind {
    pub fn label(self) -> &'static str {
        match self {
            ChunkKind::Skeleton => "skeleton",
            ChunkKind::InlineReplacement => "inline-replacement",
            ChunkKind::DeferredScriptBlock => "deferred-script-block",
            ChunkKind::Signal => "signal",
            ChunkKind::DeferredReplacement => "deferred-replacement",
            ChunkKind::Tail => "tail",
        }
    }
}

pub struct ChunkWriter<W: Write> {
    out: W,
    sent: u64,
}

impl<W: Write> ChunkWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, sent: 0 }
    }

    /// Writes one logical chunk and flushes it. Empty chunks (an empty head
    /// region, an unchanged empty deferred-scripts region) are skipped whole,
    /// flush included.
    pub fn send(&mut self, kind: ChunkKind, chunk: &str) -> Result<(), DeliveryError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.out.write_all(chunk.as_bytes())?;
        self.out.flush()?;
        log::trace!(
            target: "delivery.writer",
            "chunk #{} {}: {} bytes",
            self.sent,
            kind.label(),
            chunk.len()
        );
        self.sent += 1;
        Ok(())
    }
}
