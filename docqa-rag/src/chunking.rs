//! Boundary-aware document chunking.
//!
//! This module provides the [`Chunker`] trait and [`BoundaryChunker`], which
//! splits text into overlapping segments and prefers to end each segment just
//! after a sentence terminator or line break.

use crate::config::RagConfig;
use crate::document::{Document, Segment};

/// Maximum number of characters searched backward for a segment boundary.
pub const LOOKBACK_WINDOW: usize = 100;

/// A strategy for splitting documents into segments.
///
/// Implementations must be deterministic: the same document always yields
/// the same segments.
pub trait Chunker: Send + Sync {
    /// Split a document into ordered segments.
    ///
    /// Returns an empty `Vec` if no segment survives the noise filter.
    fn chunk(&self, document: &Document) -> Vec<Segment>;
}

/// Splits text into overlapping segments of at most `chunk_size` characters.
///
/// When a segment would end mid-text, the chunker looks back up to
/// `min(LOOKBACK_WINDOW, chunk_size)` characters for the last `.`, `!`, `?`
/// or newline and ends the segment just after it. The next segment starts
/// `chunk_overlap` characters before the previous end. Segments whose trimmed
/// length is below `min_segment_length` are dropped.
///
/// All lengths and offsets count characters, not bytes.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::BoundaryChunker;
///
/// let chunker = BoundaryChunker::new(1000, 200, 50);
/// let segments = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_segment_length: usize,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per segment
    /// * `chunk_overlap` - number of characters shared by consecutive segments
    /// * `min_segment_length` - trimmed length below which a segment is noise
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_segment_length: usize) -> Self {
        Self { chunk_size, chunk_overlap, min_segment_length }
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.min_segment_length)
    }
}

fn is_boundary(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Compute `[start, end)` character spans before noise filtering.
fn split_spans(chars: &[char], chunk_size: usize, chunk_overlap: usize) -> Vec<(usize, usize)> {
    let len = chars.len();
    let mut spans = Vec::new();
    if chunk_size == 0 {
        return spans;
    }

    let window = LOOKBACK_WINDOW.min(chunk_size);
    let mut cursor = 0;

    while cursor < len {
        let mut end = (cursor + chunk_size).min(len);
        if end < len {
            let floor = end.saturating_sub(window).max(cursor);
            if let Some(i) = (floor..end).rev().find(|&i| is_boundary(chars[i])) {
                end = i + 1;
            }
        }

        spans.push((cursor, end));
        if end == len {
            break;
        }

        // Always make progress, even when the overlap swallows the whole segment.
        let next = end.saturating_sub(chunk_overlap);
        cursor = if next > cursor { next } else { cursor + 1 };
    }

    spans
}

impl Chunker for BoundaryChunker {
    fn chunk(&self, document: &Document) -> Vec<Segment> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();

        split_spans(&chars, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .map(|(start, end)| (start, end, chars[start..end].iter().collect::<String>()))
            .filter(|(_, _, text)| text.trim().chars().count() >= self.min_segment_length)
            .enumerate()
            .map(|(sequence, (start, end, text))| Segment {
                document_id: document.id.clone(),
                sequence,
                start,
                end,
                text,
                source: document.source.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("doc", text)
    }

    /// Text of exactly `len` characters with no sentence terminators.
    fn unpunctuated(len: usize) -> String {
        "lorem ipsum dolor sit amet ".chars().cycle().take(len).collect()
    }

    #[test]
    fn splits_long_text_into_three_overlapping_segments() {
        let text = unpunctuated(2500);
        let segments = BoundaryChunker::new(1000, 200, 50).chunk(&doc(&text));

        assert_eq!(segments.len(), 3);
        let lengths: Vec<usize> = segments.iter().map(Segment::char_len).collect();
        assert_eq!(lengths, vec![1000, 1000, 900]);
        assert_eq!(segments[1].start, segments[0].end - 200);
        assert_eq!(segments[2].end, 2500);
        assert_eq!(segments.iter().map(|s| s.sequence).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn ends_segment_after_last_terminator_in_window() {
        let mut text = unpunctuated(950);
        text.push_str("Done. Next! ");
        text.push_str(&unpunctuated(300));
        let segments = BoundaryChunker::new(1000, 0, 0).chunk(&doc(&text));

        // "Next!" ends at character 961; the '!' is the last terminator before 1000.
        assert_eq!(segments[0].end, 961);
        assert!(segments[0].text.ends_with("Next!"));
        assert_eq!(segments[1].start, 961);
    }

    #[test]
    fn ignores_terminators_outside_window() {
        let mut text = String::from("Intro.");
        text.push_str(&unpunctuated(1500));
        let segments = BoundaryChunker::new(1000, 0, 0).chunk(&doc(&text));
        assert_eq!(segments[0].end, 1000);
    }

    #[test]
    fn newline_counts_as_boundary() {
        let text = format!("{}\n{}", unpunctuated(40), unpunctuated(40));
        let segments = BoundaryChunker::new(50, 0, 0).chunk(&doc(&text));
        assert_eq!(segments[0].end, 41);
        assert!(segments[0].text.ends_with('\n'));
    }

    #[test]
    fn short_text_yields_single_segment() {
        let text = unpunctuated(120);
        let segments = BoundaryChunker::new(1000, 200, 50).chunk(&doc(&text));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, text);
    }

    #[test]
    fn text_below_minimum_yields_nothing() {
        let segments = BoundaryChunker::new(1000, 200, 50).chunk(&doc("too short"));
        assert!(segments.is_empty());
    }

    #[test]
    fn whitespace_does_not_count_toward_minimum() {
        let text = format!("{}abc{}", " ".repeat(30), "\n".repeat(30));
        let segments = BoundaryChunker::new(1000, 0, 10).chunk(&doc(&text));
        assert!(segments.is_empty());
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text: String = "çé日本語".chars().cycle().take(30).collect();
        let segments = BoundaryChunker::new(10, 2, 0).chunk(&doc(&text));
        for segment in &segments {
            assert!(segment.char_len() <= 10);
            let expected: String =
                text.chars().skip(segment.start).take(segment.char_len()).collect();
            assert_eq!(segment.text, expected);
        }
        assert_eq!(segments.last().unwrap().end, 30);
    }

    #[test]
    fn terminator_near_cursor_still_advances() {
        // The early '.' shrinks the first segments below the overlap, which
        // would otherwise move the cursor backward.
        let text = format!("a.{}", "b".repeat(30));
        let segments = BoundaryChunker::new(10, 8, 0).chunk(&doc(&text));

        assert_eq!((segments[0].start, segments[0].end), (0, 2));
        assert_eq!((segments[1].start, segments[1].end), (1, 2));
        assert_eq!(segments[2].start, 2);
        assert!(segments.windows(2).all(|w| w[1].start > w[0].start));
        assert_eq!(segments.last().unwrap().end, 32);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = format!("{} One. Two? {}", unpunctuated(700), unpunctuated(900));
        let chunker = BoundaryChunker::new(300, 60, 20);
        assert_eq!(chunker.chunk(&doc(&text)), chunker.chunk(&doc(&text)));
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(BoundaryChunker::new(100, 10, 0).chunk(&doc("")).is_empty());
    }

    #[test]
    fn segments_inherit_document_source() {
        let document = doc(&unpunctuated(250)).with_source("notes.md");
        let segments = BoundaryChunker::new(100, 20, 0).chunk(&document);
        assert!(segments.len() > 1);
        assert!(segments.iter().all(|s| s.source.as_deref() == Some("notes.md")));

        let plain = BoundaryChunker::new(100, 20, 0).chunk(&doc("no source here"));
        assert_eq!(plain[0].source, None);
    }
}
