use groundrag_core::types::{Chunk, SourceKind};
use groundrag_text::KeywordIndex;

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk {
            id: Chunk::chunk_id(i, 0),
            doc_id: i,
            source: format!("doc_{i}"),
            chunk_index: 0,
            offset: 0,
            text: t.to_string(),
        })
        .collect()
}

#[test]
fn only_overlapping_chunk_is_returned() {
    let corpus = chunks(&["Company policy about remote work", "Benefits information and details"]);
    let index = KeywordIndex::new(&corpus);

    let hits = index.search("remote work policy", 5);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].position, 0);
    assert_eq!(hits[0].source, SourceKind::Keyword);
    // All three query tokens occur in the chunk.
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn partial_overlap_scores_fraction_of_query_tokens() {
    let corpus = chunks(&["remote office", "work from home policy", "nothing here"]);
    let hits = KeywordIndex::new(&corpus).search("remote work policy", 5);

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].position, 1);
    assert!((hits[0].score - 2.0 / 3.0).abs() < 1e-6);
    assert_eq!(hits[1].position, 0);
    assert!((hits[1].score - 1.0 / 3.0).abs() < 1e-6);
}

#[test]
fn ties_keep_chunk_order_and_truncate_to_top_k() {
    let corpus = chunks(&["alpha one", "beta", "alpha two", "alpha three"]);
    let index = KeywordIndex::new(&corpus);

    let hits = index.search("ALPHA", 2);
    let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
    assert_eq!(positions, vec![0, 2]);
}

#[test]
fn zero_top_k_and_blank_query_are_empty() {
    let index = KeywordIndex::new(&chunks(&["alpha"]));
    assert!(index.search("alpha", 0).is_empty());
    assert!(index.search("   ", 3).is_empty());
    assert!(KeywordIndex::new(&[]).search("alpha", 3).is_empty());
}

#[test]
fn search_is_deterministic() {
    let corpus = chunks(&["a b c", "b c d", "c d e", "a e"]);
    let index = KeywordIndex::new(&corpus);
    let first = index.search("a c e", 10);
    for _ in 0..5 {
        assert_eq!(index.search("a c e", 10), first);
    }
}
