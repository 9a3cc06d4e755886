//! Tests for boundary-aware sliding-window chunking.

use groundqa_rag::{Chunker, Document, RagConfig, RagError, SlidingWindowChunker, split};
use proptest::prelude::*;

fn chars_of(text: &str) -> Vec<char> {
    text.chars().collect()
}

#[test]
fn short_document_yields_single_whole_chunk() {
    let text = "Refunds within 30 days. Digital products non-refundable.";
    let doc = Document::new("policy", text).with_metadata("source", "policy");

    let chunks = split(&doc, 500, 50).unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, text);
    assert_eq!(chunks[0].start, 0);
    assert_eq!(chunks[0].end, text.chars().count());
    assert_eq!(chunks[0].id, "policy_0");
    assert_eq!(chunks[0].metadata.get("source").map(String::as_str), Some("policy"));
}

#[test]
fn document_exactly_chunk_size_yields_single_chunk() {
    let doc = Document::new("d", "abcdefghij");
    let chunks = split(&doc, 10, 3).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "abcdefghij");
}

#[test]
fn empty_document_yields_no_chunks() {
    let chunks = split(&Document::new("empty", ""), 100, 10).unwrap();
    assert!(chunks.is_empty());
}

#[test]
fn rejects_zero_chunk_size() {
    let err = SlidingWindowChunker::new(0, 0).unwrap_err();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}

#[test]
fn rejects_overlap_not_smaller_than_chunk_size() {
    let err = split(&Document::new("d", "text"), 10, 10).unwrap_err();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}

#[test]
fn hard_cut_without_boundaries() {
    let doc = Document::new("d", "abcdefghijklmnopqrstuvwxyz");
    let chunks = split(&doc, 10, 2).unwrap();

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["abcdefghij", "ijklmnopqr", "qrstuvwxyz"]);
    assert_eq!(chunks[1].start, 8);
    assert_eq!(chunks[2].start, 16);
}

#[test]
fn prefers_sentence_end_within_lookback() {
    let doc = Document::new("d", "Alpha beta gamma. Delta epsilon zeta.");
    let chunker = SlidingWindowChunker::new(25, 0).unwrap().with_lookback(10);

    let chunks = chunker.chunk(&doc).unwrap();

    assert_eq!(chunks[0].text, "Alpha beta gamma. ");
    assert_eq!(chunks[1].start, 18);
    assert_eq!(chunks.last().unwrap().end, doc.text.chars().count());
}

#[test]
fn prefers_paragraph_break_over_sentence_end() {
    let doc = Document::new("d", "One. Two three.\n\nFour five six seven eight.");
    let chunker = SlidingWindowChunker::new(22, 0).unwrap().with_lookback(20);

    let chunks = chunker.chunk(&doc).unwrap();

    assert_eq!(chunks[0].text, "One. Two three.\n\n");
}

#[test]
fn falls_back_to_word_boundary() {
    let doc = Document::new("d", "lorem ipsum dolor sit amet consectetur");
    let chunker = SlidingWindowChunker::new(15, 0).unwrap().with_lookback(8);

    let chunks = chunker.chunk(&doc).unwrap();

    assert_eq!(chunks[0].text, "lorem ipsum ");
    for chunk in &chunks[..chunks.len() - 1] {
        assert!(chunk.text.ends_with(' '), "chunk {:?} cut mid-word", chunk.text);
    }
}

#[test]
fn zero_lookback_always_cuts_hard() {
    let doc = Document::new("d", "Alpha beta gamma. Delta epsilon zeta.");
    let chunker = SlidingWindowChunker::new(25, 5).unwrap().with_lookback(0);

    let chunks = chunker.chunk(&doc).unwrap();

    assert_eq!(chunks[0].char_len(), 25);
    assert_eq!(chunks[1].start, 20);
}

#[test]
fn multibyte_text_is_split_on_characters() {
    let doc = Document::new("d", "héllo wörld ünïcode ñandú");
    let chunks = split(&doc, 6, 2).unwrap();

    let chars = chars_of(&doc.text);
    for chunk in &chunks {
        let expected: String = chars[chunk.start..chunk.end].iter().collect();
        assert_eq!(chunk.text, expected);
        assert!(chunk.char_len() <= 6);
    }
    assert_eq!(chunks.last().unwrap().end, chars.len());
}

#[test]
fn from_config_uses_configured_lookback() {
    let config =
        RagConfig::builder().chunk_size(25).chunk_overlap(0).boundary_lookback(0).build().unwrap();
    let chunker = SlidingWindowChunker::from_config(&config).unwrap();

    let document = Document::new("d", "Alpha beta gamma. Delta epsilon zeta.");
    let chunks = chunker.chunk(&document).unwrap();

    assert_eq!(chunks[0].char_len(), 25);
}

#[test]
fn chunking_is_deterministic() {
    let doc = Document::new(
        "d",
        "Refund Policy:\nCustomers may request a refund within 30 days of purchase.\n\n\
         Refunds will be processed within 7 business days after approval.",
    );
    let first = split(&doc, 40, 8).unwrap();
    let second = split(&doc, 40, 8).unwrap();
    assert_eq!(first, second);
}

fn arb_window() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size, 0usize..30))
}

/// **Property: chunking coverage**
/// *For any* document and valid window, chunks cover the whole text without
/// gaps, respect the size bound, and consecutive chunks overlap by exactly the
/// configured amount.
mod prop_chunk_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_cover_text_with_exact_overlap(
            text in "[a-zé .!?\n]{0,300}",
            (chunk_size, overlap, lookback) in arb_window(),
        ) {
            let doc = Document::new("doc", text.clone());
            let chunker = SlidingWindowChunker::new(chunk_size, overlap)
                .unwrap()
                .with_lookback(lookback);
            let chunks = chunker.chunk(&doc).unwrap();
            let chars = chars_of(&text);

            if chars.is_empty() {
                prop_assert!(chunks.is_empty());
                return Ok(());
            }

            prop_assert_eq!(chunks[0].start, 0);
            prop_assert_eq!(chunks.last().unwrap().end, chars.len());

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert!(chunk.end > chunk.start);
                prop_assert!(chunk.end - chunk.start <= chunk_size);
                let expected: String = chars[chunk.start..chunk.end].iter().collect();
                prop_assert_eq!(&chunk.text, &expected);
            }

            for pair in chunks.windows(2) {
                prop_assert_eq!(pair[0].end - pair[1].start, overlap);
            }
        }

        #[test]
        fn chunking_twice_is_identical(
            text in "[a-z .\n]{0,200}",
            (chunk_size, overlap, lookback) in arb_window(),
        ) {
            let doc = Document::new("doc", text);
            let chunker = SlidingWindowChunker::new(chunk_size, overlap)
                .unwrap()
                .with_lookback(lookback);
            prop_assert_eq!(chunker.chunk(&doc).unwrap(), chunker.chunk(&doc).unwrap());
        }
    }
}
