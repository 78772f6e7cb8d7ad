//! Sentence-boundary text chunking for document ingestion.
//!
//! Splitting is deliberately coarse: a sentence ends at a run of `.`, `!`
//! or `?` followed by whitespace. Abbreviations and quoted punctuation are
//! not handled - the goal is retrieval-sized segments, not linguistic
//! accuracy. A single sentence longer than the chunk size is emitted as
//! one oversized chunk rather than split mid-sentence.

/// Chunks shorter than this (after trimming) carry too little signal to
/// be worth embedding and are discarded.
pub const MIN_CHUNK_LEN: usize = 50;

/// Default target chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap hint in characters (one word of overlap per 10 chars).
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits document text into overlapping, bounded-size chunks.
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl TextChunker {
    /// Create a chunker with a target chunk size and overlap hint, both
    /// in characters.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `text` into overlapping chunks of roughly `chunk_size`
    /// characters, never breaking inside a sentence.
    ///
    /// Sentences are accumulated greedily; when appending the next
    /// sentence would overflow a non-empty buffer, the buffer is emitted
    /// and the next one is seeded with the last `chunk_overlap / 10`
    /// words (minimum 1) of the emitted chunk. Chunks whose trimmed
    /// length is at most [`MIN_CHUNK_LEN`] are dropped.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in split_sentences(text) {
            // Length the buffer would have with this sentence appended.
            let appended_len = if current.is_empty() {
                sentence.len()
            } else {
                current.len() + 1 + sentence.len()
            };

            if appended_len > self.chunk_size && !current.is_empty() {
                let closed = current.trim().to_string();
                current = format!("{} {}", self.overlap_tail(&closed), sentence);
                chunks.push(closed);
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(sentence);
            }
        }

        let last = current.trim();
        if !last.is_empty() {
            chunks.push(last.to_string());
        }

        chunks.retain(|c| c.len() > MIN_CHUNK_LEN);
        chunks
    }

    /// Last `chunk_overlap / 10` whitespace-delimited words of a closed
    /// chunk, used to seed the next buffer.
    fn overlap_tail(&self, closed: &str) -> String {
        let overlap_words = std::cmp::max(1, self.chunk_overlap / 10);
        let words: Vec<&str> = closed.split_whitespace().collect();
        words[words.len().saturating_sub(overlap_words)..].join(" ")
    }
}

/// Split on runs of sentence-terminal punctuation followed by whitespace.
///
/// The delimiter (punctuation plus trailing whitespace) is consumed, so a
/// trailing sentence with no whitespace after its final period keeps it.
fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            let punct_start = i;
            while i < bytes.len() && matches!(bytes[i], b'.' | b'!' | b'?') {
                i += 1;
            }
            if i < bytes.len() && bytes[i].is_ascii_whitespace() {
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                sentences.push(&text[start..punct_start]);
                start = i;
            }
        } else {
            i += 1;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sentence(word: &str, words: usize) -> String {
        let mut s = vec![word; words].join(" ");
        s.push('.');
        s
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t  ")]
    fn empty_input_yields_no_chunks(#[case] input: &str) {
        assert!(TextChunker::default().chunk(input).is_empty());
    }

    #[test]
    fn short_text_is_filtered_out() {
        // 49 chars trimmed - below the minimum viable chunk length.
        let text = "This sentence is quite short and gets dropped.";
        assert!(text.len() <= MIN_CHUNK_LEN);
        assert!(TextChunker::default().chunk(text).is_empty());
    }

    #[test]
    fn single_fitting_text_is_one_chunk() {
        let text = "The quick brown fox jumps over the lazy dog near the river. \
                    It then naps in the afternoon sun for several hours.";
        let chunks = TextChunker::default().chunk(text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn sentence_splitting_consumes_terminal_punctuation() {
        let parts = split_sentences("One fish. Two fish! Red fish?  Blue fish.");
        assert_eq!(parts, vec!["One fish", "Two fish", "Red fish", "Blue fish."]);
    }

    #[test]
    fn punctuation_runs_are_a_single_boundary() {
        let parts = split_sentences("Wait... what?! Never mind.");
        assert_eq!(parts, vec!["Wait", "what", "Never mind."]);
    }

    #[test]
    fn overflow_closes_chunk_and_seeds_overlap() {
        // Three ~400-char sentences with chunk_size 1000: the third
        // sentence overflows, so we get two chunks and the second starts
        // with the 20-word overlap tail of the first.
        let s1 = sentence("alpha", 67);
        let s2 = sentence("bravo", 67);
        let s3 = sentence("delta", 67);
        let text = format!("{} {} {}", s1, s2, s3);

        let chunks = TextChunker::new(1000, 200).chunk(&text);
        assert_eq!(chunks.len(), 2);

        let tail: Vec<&str> = chunks[1].split_whitespace().take(20).collect();
        assert!(tail.iter().all(|w| *w == "bravo" || *w == "bravo."));
        assert!(chunks[1].contains("delta"));
    }

    #[test]
    fn overlap_tail_is_at_least_one_word() {
        let s1 = sentence("first", 30);
        let s2 = sentence("second", 30);
        let text = format!("{} {}", s1, s2);

        // overlap 5 -> floor(5/10) = 0, clamped to 1 word.
        let chunks = TextChunker::new(100, 5).chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with("first second"));
    }

    #[test]
    fn oversized_sentence_is_never_split() {
        let giant = sentence("word", 300);
        let chunks = TextChunker::new(100, 20).chunk(&giant);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].len() > 100);
    }

    #[test]
    fn no_emitted_chunk_is_below_minimum_length() {
        let text = format!(
            "{} {} Tiny one. {}",
            sentence("gamma", 40),
            sentence("kappa", 40),
            sentence("omega", 40)
        );
        for chunk in TextChunker::new(200, 40).chunk(&text) {
            assert!(chunk.trim().len() > MIN_CHUNK_LEN);
        }
    }

    #[test]
    fn no_sentence_is_dropped() {
        let sentences = [
            sentence("red", 25),
            sentence("green", 25),
            sentence("blue", 25),
            sentence("cyan", 25),
        ];
        let text = sentences.join(" ");
        let chunks = TextChunker::new(160, 20).chunk(&text);
        let joined = chunks.join(" ");

        for word in ["red", "green", "blue", "cyan"] {
            assert!(joined.contains(word), "missing sentence word {word}");
        }
    }

    #[test]
    fn chunk_order_follows_source_order() {
        let text = format!("{} {}", sentence("earlier", 40), sentence("later", 40));
        let chunks = TextChunker::new(250, 20).chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("earlier"));
        assert!(chunks[1].contains("later"));
    }
}
