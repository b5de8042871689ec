//! # Chunk Emission
//!
//! Turns a chunk plan into a lazy, ordered, finite stream of strings
//! with cooperative pauses between them.

use futures::stream::{self, Stream};

use super::Chunk;

/// Emit a plan as an async stream.
///
/// Each chunk's text is yielded immediately; its delay is slept before
/// the next chunk is produced. Sleeps are cooperative - they suspend
/// only the current request, never other connections. The stream is
/// non-restartable and never retries: a dropped consumer simply stops
/// pulling.
pub fn emit(chunks: Vec<Chunk>) -> impl Stream<Item = String> {
    stream::unfold(
        (chunks.into_iter(), None::<std::time::Duration>),
        |(mut rest, pending)| async move {
            if let Some(delay) = pending {
                tokio::time::sleep(delay).await;
            }
            let chunk = rest.next()?;
            Some((chunk.text, (rest, Some(chunk.delay))))
        },
    )
}
