//! # Simulated Streaming
//!
//! Splits a finished article into chunks and paces their emission so a
//! client sees "live" generation over a chunked HTTP response.
//!
//! Two interchangeable policies:
//!
//! - [`words::word_chunks`] - one token per chunk, whitespace runs
//!   preserved, concatenation reproduces the source byte-for-byte.
//! - [`clusters::cluster_chunks`] - sentence-aware random grouping
//!   with "thinking" pauses; reconstruction collapses whitespace.
//!
//! Chunks are always emitted strictly in left-to-right source order.

pub mod clusters;
pub mod emit;
pub mod words;

pub use clusters::cluster_chunks;
pub use emit::emit;
pub use words::word_chunks;

use std::time::Duration;

/// A contiguous slice of an article paired with the pause that follows
/// its emission. Ephemeral: lives only for one streaming response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub delay: Duration,
}

impl Chunk {
    pub fn new(text: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            text: text.into(),
            delay: Duration::from_millis(delay_ms),
        }
    }
}
