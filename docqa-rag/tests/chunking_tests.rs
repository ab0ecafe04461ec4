//! Property tests for boundary-aware chunking.

use docqa_rag::chunking::{BoundaryChunker, Chunker};
use docqa_rag::document::Document;
use proptest::prelude::*;

fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..150).prop_flat_map(|size| (Just(size), 0..size))
}

/// With no noise filter, segments cover the text in order with bounded size.
mod prop_segments_cover_text {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn spans_are_contiguous_and_bounded(
            text in "[a-zé .!?\n]{1,600}",
            (size, overlap) in arb_params(),
        ) {
            let chars: Vec<char> = text.chars().collect();
            let document = Document::new("doc", text.clone());
            let segments = BoundaryChunker::new(size, overlap, 0).chunk(&document);

            prop_assert!(!segments.is_empty());
            prop_assert_eq!(segments[0].start, 0);
            prop_assert_eq!(segments.last().unwrap().end, chars.len());

            for (i, segment) in segments.iter().enumerate() {
                prop_assert_eq!(segment.sequence, i);
                prop_assert!(segment.start < segment.end);
                prop_assert!(segment.char_len() <= size);
                let expected: String = chars[segment.start..segment.end].iter().collect();
                prop_assert_eq!(&segment.text, &expected);
            }

            for pair in segments.windows(2) {
                prop_assert!(pair[1].start > pair[0].start, "no progress: {:?}", pair);
                prop_assert!(pair[1].start <= pair[0].end, "gap between segments: {:?}", pair);
            }
        }

        #[test]
        fn chunking_is_deterministic(
            text in "[a-z .!?\n]{0,400}",
            (size, overlap) in arb_params(),
            min in 0usize..20,
        ) {
            let chunker = BoundaryChunker::new(size, overlap, min);
            let document = Document::new("doc", text);
            prop_assert_eq!(chunker.chunk(&document), chunker.chunk(&document));
        }

        #[test]
        fn short_segments_are_filtered(
            text in "[a-z .!?\n]{0,400}",
            (size, overlap) in arb_params(),
            min in 1usize..40,
        ) {
            let document = Document::new("doc", text);
            for segment in BoundaryChunker::new(size, overlap, min).chunk(&document) {
                prop_assert!(segment.text.trim().chars().count() >= min);
            }
        }
    }
}

#[test]
fn default_sized_document_splits_on_sentences() {
    let sentence = "The quick brown fox jumps over the lazy dog. ";
    let text = sentence.repeat(60);
    let document = Document::new("fox.txt", text.clone());
    let segments = BoundaryChunker::new(1000, 200, 50).chunk(&document);

    assert!(segments.len() > 1);
    for segment in &segments[..segments.len() - 1] {
        assert!(segment.text.ends_with('.'), "segment did not end on a sentence: {segment:?}");
    }
    assert_eq!(segments.last().unwrap().end, text.chars().count());
}
