//! # Sentence-Cluster Chunking
//!
//! Sentence-aware grouping with randomized pacing. Short sentences go
//! out whole; longer ones are split into random word groups, and each
//! sentence boundary gets a breathing pause (occasionally a longer
//! "thinking" one).
//!
//! Unlike word mode this is not byte-exact: splitting whitespace is
//! consumed, and chunks re-join words with single spaces. Accepted
//! approximation, do not "fix" without revisiting the callers.

use rand::Rng;

use super::Chunk;

const SHORT_SENTENCE_WORDS: usize = 5;
const MEDIUM_SENTENCE_WORDS: usize = 15;

/// Split after any of `. ! ?` followed by whitespace. Terminators stay
/// on the preceding sentence; the splitting whitespace is consumed.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_terminator = false;

    for (idx, c) in text.char_indices() {
        if prev_terminator && c.is_whitespace() {
            sentences.push(&text[start..idx]);
            start = idx + c.len_utf8();
            // Swallow the rest of the whitespace run.
            prev_terminator = false;
            continue;
        }
        if c.is_whitespace() && start == idx {
            start = idx + c.len_utf8();
            continue;
        }
        prev_terminator = matches!(c, '.' | '!' | '?');
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

/// Plan sentence-cluster emission of `text`.
///
/// Per sentence, by word count: <=5 words emit whole (100ms);
/// 6..=15 words split into 1-3 equal-ish groups (50-200ms each);
/// longer sentences peel random groups of 3-12 words (50-150ms,
/// +100ms when the group carries a terminator). Each sentence adds a
/// 100-300ms pause, and with 10% probability an extra 500-1000ms one.
pub fn cluster_chunks<R: Rng>(text: &str, rng: &mut R) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut first = true;

    for sentence in split_sentences(text) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let start = chunks.len();
        if words.len() <= SHORT_SENTENCE_WORDS {
            chunks.push(Chunk::new(words.join(" "), 100));
        } else if words.len() <= MEDIUM_SENTENCE_WORDS {
            let groups = rng.gen_range(1..=3usize);
            let size = words.len().div_ceil(groups);
            for group in words.chunks(size) {
                chunks.push(Chunk::new(group.join(" "), rng.gen_range(50..=200)));
            }
        } else {
            let mut rest = words.as_slice();
            while !rest.is_empty() {
                let take = rng.gen_range(3..=12usize).min(rest.len());
                let (group, tail) = rest.split_at(take);
                rest = tail;
                let mut delay = rng.gen_range(50..=150);
                if group.iter().any(|w| w.contains(['.', '!', '?'])) {
                    delay += 100;
                }
                chunks.push(Chunk::new(group.join(" "), delay));
            }
        }

        // Every chunk after the very first carries its separating space,
        // so concatenation reconstructs single-spaced text exactly.
        for chunk in &mut chunks[start..] {
            if first {
                first = false;
            } else {
                chunk.text.insert(0, ' ');
            }
        }

        if let Some(last) = chunks.last_mut() {
            last.delay += std::time::Duration::from_millis(rng.gen_range(100..=300));
            if rng.gen_bool(0.1) {
                last.delay += std::time::Duration::from_millis(rng.gen_range(500..=1000));
            }
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_split_keeps_terminators() {
        let sentences = split_sentences("One two. Three four! Five?");
        assert_eq!(sentences, vec!["One two.", "Three four!", "Five?"]);
    }

    #[test]
    fn test_split_consumes_whitespace_runs() {
        let sentences = split_sentences("A.  B.\n\nC.");
        assert_eq!(sentences, vec!["A.", "B.", "C."]);
    }

    #[test]
    fn test_abbreviation_mid_word_does_not_split() {
        // No whitespace after the periods inside the token.
        let sentences = split_sentences("See e.g.the docs. Done.");
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn test_short_sentences_one_chunk_each_in_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let chunks = cluster_chunks("A. B. C.", &mut rng);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A.", " B.", " C."]);
    }

    #[test]
    fn test_reconstruction_up_to_collapsed_whitespace() {
        let text = "The quick brown fox jumps over the lazy dog near the river bank today. Short one.";
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rebuilt: String = cluster_chunks(text, &mut rng)
                .iter()
                .map(|c| c.text.as_str())
                .collect();
            assert_eq!(rebuilt, text, "seed {seed}");
        }
    }

    #[test]
    fn test_medium_sentence_groups_within_bounds() {
        let text = "one two three four five six seven eight nine ten.";
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chunks = cluster_chunks(text, &mut rng);
            assert!((1..=3).contains(&chunks.len()), "seed {seed}: {chunks:?}");
        }
    }

    #[test]
    fn test_long_sentence_groups_between_3_and_12_words() {
        let words: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
        let text = format!("{}.", words.join(" "));
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chunks = cluster_chunks(&text, &mut rng);
            for (i, chunk) in chunks.iter().enumerate() {
                let count = chunk.text.split_whitespace().count();
                let is_last = i + 1 == chunks.len();
                assert!(
                    count <= 12 && (count >= 3 || is_last),
                    "seed {seed} chunk {i}: {count} words"
                );
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(cluster_chunks("", &mut rng).is_empty());
        assert!(cluster_chunks("   \n ", &mut rng).is_empty());
    }
}
