//! Token-bounded text chunking for the memory log
//!
//! Splits free text into chunks that each fit a token budget without
//! breaking mid-sentence where avoidable. Sentences are delimited by the
//! literal `". "` (a heuristic, not a linguistic parser), so a period with
//! no trailing space does not split there.

use crate::tokens::TokenCounter;

/// Split `text` into chunks of at most `max_tokens` tokens each.
///
/// Sentences accumulate into the current chunk until adding the next one
/// would exceed the budget, at which point the chunk is closed (sentences
/// joined with `". "` plus a trailing `"."`) and a new one starts. A single
/// sentence whose own token count exceeds the budget is word-packed into
/// sub-chunks first, each appended as a pseudo-sentence. Token counts are
/// taken on the sentence prefixed with one space, matching the boundary
/// behavior of BPE-style tokenizers; each appended unit also charges one
/// separator token.
///
/// Empty input yields no chunks.
#[must_use]
pub fn split_into_chunks(
    text: &str,
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut chunk: Vec<String> = Vec::new();
    let mut tokens_so_far = 0usize;

    for sentence in text.split(". ") {
        let tokens = counter.count(&format!(" {sentence}"));

        // A sentence that cannot fit in any chunk is packed word by word
        if tokens > max_tokens {
            for fragment in split_long_sentence(sentence, max_tokens, counter) {
                let fragment_tokens = counter.count(&format!(" {fragment}"));
                if tokens_so_far + fragment_tokens > max_tokens && !chunk.is_empty() {
                    chunks.push(close_chunk(&chunk));
                    chunk.clear();
                    tokens_so_far = 0;
                }
                tokens_so_far += fragment_tokens + 1;
                chunk.push(fragment);
            }
            continue;
        }

        if tokens_so_far + tokens > max_tokens && !chunk.is_empty() {
            chunks.push(close_chunk(&chunk));
            chunk.clear();
            tokens_so_far = 0;
        }

        chunk.push(sentence.to_string());
        tokens_so_far += tokens + 1;
    }

    if !chunk.is_empty() {
        chunks.push(close_chunk(&chunk));
    }

    chunks
}

/// Join accumulated sentences back into one stored chunk
fn close_chunk(sentences: &[String]) -> String {
    format!("{}.", sentences.join(". "))
}

/// Greedily pack the words of an oversized sentence into fragments that
/// each fit the token budget
fn split_long_sentence(
    sentence: &str,
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0usize;

    for word in sentence.split_whitespace() {
        let word_tokens = counter.count(&format!(" {word}"));
        if current_tokens + word_tokens > max_tokens && !current.is_empty() {
            fragments.push(current.join(" "));
            current.clear();
            current_tokens = 0;
        }
        current.push(word);
        current_tokens += word_tokens;
    }

    if !current.is_empty() {
        fragments.push(current.join(" "));
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic counter for tests: one token per whitespace word
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(split_into_chunks("", 500, &WordCounter).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_into_chunks("one two three", 10, &WordCounter);
        assert_eq!(chunks, vec!["one two three."]);
    }

    #[test]
    fn test_chunks_respect_token_budget() {
        let text = "alpha beta gamma. delta epsilon zeta. eta theta iota. kappa lambda mu";
        let max_tokens = 4;
        let chunks = split_into_chunks(text, max_tokens, &WordCounter);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                WordCounter.count(chunk) <= max_tokens,
                "chunk over budget: {chunk}"
            );
        }
    }

    #[test]
    fn test_no_sentence_dropped_or_duplicated() {
        let text = "first sentence here. second sentence here. third sentence here. fourth sentence here";
        let chunks = split_into_chunks(text, 5, &WordCounter);

        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.trim_end_matches('.').split(". "))
            .map(ToString::to_string)
            .collect();
        let original: Vec<&str> = text.split(". ").collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_exact_budget_sentence_fits_alone() {
        // Four words with a four-token budget: never sub-split
        let chunks = split_into_chunks("one two three four", 4, &WordCounter);
        assert_eq!(chunks, vec!["one two three four."]);
    }

    #[test]
    fn test_oversized_sentence_is_word_packed() {
        let text = "a b c d e f g h i j";
        let chunks = split_into_chunks(text, 3, &WordCounter);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // Each stored fragment stays within the budget
            for fragment in chunk.trim_end_matches('.').split(". ") {
                assert!(WordCounter.count(fragment) <= 3, "fragment over budget: {fragment}");
            }
        }

        // Every word survives, in order
        let words: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.split_whitespace())
            .map(|w| w.trim_end_matches('.'))
            .collect();
        assert_eq!(words, text.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn test_periods_without_trailing_space_do_not_split() {
        let chunks = split_into_chunks("version 1.2.3 released", 10, &WordCounter);
        assert_eq!(chunks, vec!["version 1.2.3 released."]);
    }

    #[test]
    fn test_long_sentence_word_packing() {
        let fragments = split_long_sentence("a b c d e", 2, &WordCounter);
        assert_eq!(fragments, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_single_word_over_budget_lands_alone() {
        // A word the counter prices above the budget cannot be split further
        struct ByteCounter;
        impl TokenCounter for ByteCounter {
            fn count(&self, text: &str) -> usize {
                text.len()
            }
        }

        let fragments = split_long_sentence("supercalifragilistic a", 5, &ByteCounter);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], "supercalifragilistic");
    }
}
