//! # Word-Mode Chunking
//!
//! One token per chunk. Whitespace runs are their own tokens, so
//! concatenating every chunk reproduces the source text exactly.

use super::Chunk;

const BASE_DELAY_MS: u64 = 50;
const LONG_TOKEN_DELAY_MS: u64 = 50;
const SENTENCE_END_DELAY_MS: u64 = 100;

/// Plan word-mode emission of `text`.
///
/// Delays: 50ms base, +50ms for tokens longer than ten characters,
/// +100ms when the token ends a sentence.
pub fn word_chunks(text: &str) -> Vec<Chunk> {
    tokenize(text)
        .into_iter()
        .map(|token| {
            let mut delay = BASE_DELAY_MS;
            if token.chars().count() > 10 {
                delay += LONG_TOKEN_DELAY_MS;
            }
            if matches!(token.chars().last(), Some('.' | '!' | '?')) {
                delay += SENTENCE_END_DELAY_MS;
            }
            Chunk::new(token, delay)
        })
        .collect()
}

/// Split into alternating runs of non-whitespace and whitespace,
/// both kept, so reassembly by concatenation is lossless.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_whitespace = None;

    for c in text.chars() {
        let ws = c.is_whitespace();
        if in_whitespace != Some(ws) && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        in_whitespace = Some(ws);
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
