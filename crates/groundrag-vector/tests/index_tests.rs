use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use groundrag_core::traits::EmbeddingGateway;
use groundrag_core::types::Chunk;
use groundrag_core::{Error, Result};
use groundrag_embed::HashEmbedder;
use groundrag_vector::{similarity, BuildOptions, VectorIndex};
use tempfile::TempDir;

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk {
            id: Chunk::chunk_id(0, i),
            doc_id: 0,
            source: "/tmp/doc0.txt".to_string(),
            chunk_index: i,
            offset: i * 10,
            text: t.to_string(),
        })
        .collect()
}

/// Embeds a text as `[len, first byte]`, counting batches.
struct TinyEmbedder {
    calls: AtomicUsize,
}

impl EmbeddingGateway for TinyEmbedder {
    fn embedder_id(&self) -> &str { "tiny" }
    fn dim(&self) -> Option<usize> { Some(2) }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| vec![t.len() as f32, f32::from(t.as_bytes().first().copied().unwrap_or(0))]).collect())
    }
}

enum Broken {
    Empty,
    Short,
    Ragged,
    Failing,
}

impl EmbeddingGateway for Broken {
    fn embedder_id(&self) -> &str { "broken" }
    fn dim(&self) -> Option<usize> { None }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Broken::Empty => Ok(Vec::new()),
            Broken::Short => Ok(vec![vec![1.0]; texts.len().saturating_sub(1)]),
            Broken::Ragged => Ok(texts.iter().enumerate().map(|(i, _)| vec![0.0; i + 1]).collect()),
            Broken::Failing => Err(Error::Gateway("connection refused".into())),
        }
    }
}

#[test]
fn build_embeds_in_batches_and_keeps_lockstep() {
    let corpus = chunks(&["a", "bb", "ccc", "dddd", "eeeee"]);
    let gateway = TinyEmbedder { calls: AtomicUsize::new(0) };
    let index = VectorIndex::build(&corpus, &gateway, &BuildOptions { batch_size: 2, show_progress: false }).expect("build");

    assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    assert_eq!(index.len(), 5);
    assert_eq!(index.dimension(), 2);
    assert_eq!(index.chunks(), corpus.as_slice());
    assert_eq!(index.embedding(3), Some(&[4.0, f32::from(b'd')][..]));
}

#[test]
fn search_orders_by_ascending_distance() {
    let corpus = chunks(&["x", "y", "z"]);
    let index = VectorIndex::from_parts(corpus, vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![1.0, 0.0]]).expect("index");

    let hits = index.search(&[0.0, 0.0], 10).expect("search");

    let positions: Vec<usize> = hits.iter().map(|h| h.0).collect();
    assert_eq!(positions, vec![0, 2, 1]);
    assert!((hits[2].1 - 5.0).abs() < 1e-6);
    assert_eq!(similarity(hits[0].1), 1.0);
    assert!((similarity(hits[2].1) - 1.0 / 6.0).abs() < 1e-6);
}

#[test]
fn search_returns_at_most_k_and_breaks_ties_by_position() {
    let corpus = chunks(&["a", "b", "c", "d"]);
    let index = VectorIndex::from_parts(corpus, vec![vec![1.0], vec![-1.0], vec![1.0], vec![5.0]]).expect("index");

    let hits = index.search(&[0.0], 3).expect("search");

    let positions: Vec<usize> = hits.iter().map(|h| h.0).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert!(index.search(&[0.0], 0).expect("search").is_empty());
}

#[test]
fn empty_index_searches_to_nothing() {
    let index = VectorIndex::from_parts(Vec::new(), Vec::new()).expect("index");
    assert!(index.is_empty());
    assert!(index.search(&[1.0, 2.0, 3.0], 5).expect("search").is_empty());
}

#[test]
fn query_dimension_mismatch_is_an_error() {
    let index = VectorIndex::from_parts(chunks(&["a"]), vec![vec![1.0, 2.0]]).expect("index");
    assert!(matches!(index.search(&[1.0], 1), Err(Error::IndexUnavailable(_))));
}

#[test]
fn build_fails_without_usable_embeddings() {
    let corpus = chunks(&["a", "b", "c"]);
    let options = BuildOptions::default();
    assert!(matches!(VectorIndex::build(&[], &HashEmbedder::new(4), &options), Err(Error::IndexUnavailable(_))));
    for gateway in [Broken::Empty, Broken::Short, Broken::Ragged, Broken::Failing] {
        assert!(matches!(VectorIndex::build(&corpus, &gateway, &options), Err(Error::IndexUnavailable(_))));
    }
}

#[test]
fn snapshot_round_trip_preserves_search() {
    let corpus = chunks(&["remote work policy", "benefits and details", "holiday calendar", "expense policy"]);
    let embedder = HashEmbedder::new(64);
    let index = VectorIndex::build(&corpus, &embedder, &BuildOptions::default()).expect("build");
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("index.json");

    index.save(&path).expect("save");
    let reloaded = VectorIndex::load(&path).expect("load");

    assert_eq!(reloaded, index);
    for query in ["remote policy", "calendar", "unrelated words"] {
        let q = embedder.embed_text(query);
        assert_eq!(reloaded.search(&q, 3).expect("search"), index.search(&q, 3).expect("search"));
    }
    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
    assert_eq!(leftovers.len(), 1, "temp file was renamed into place");
}

#[test]
fn missing_or_corrupt_snapshot_is_recoverable() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.json");
    assert!(matches!(VectorIndex::load(&path), Err(Error::IndexUnavailable(_))));

    fs::write(&path, b"{ not json").unwrap();
    assert!(matches!(VectorIndex::load(&path), Err(Error::IndexUnavailable(_))));

    let index = VectorIndex::from_parts(chunks(&["a", "b"]), vec![vec![1.0, 2.0], vec![3.0, 4.0]]).expect("index");
    let mut snapshot: serde_json::Value = serde_json::from_slice(&index.serialize().expect("serialize")).unwrap();
    snapshot["chunks"][1]["text"] = serde_json::json!("tampered");
    fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
    assert!(matches!(VectorIndex::load(&path), Err(Error::IndexUnavailable(_))));

    snapshot["format"] = serde_json::json!("something-else");
    assert!(VectorIndex::deserialize(&serde_json::to_vec(&snapshot).unwrap()).is_err());
}

#[test]
fn non_finite_embeddings_rank_last() {
    let index = VectorIndex::from_parts(chunks(&["a", "b", "c"]), vec![vec![f32::NAN, 0.0], vec![1.0, 0.0], vec![f32::INFINITY, 0.0]]).expect("index");

    let hits = index.search(&[0.0, 0.0], 3).expect("search");

    assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![1, 0, 2]);
    assert_eq!(hits[0].1, 1.0);
    assert!(hits[1..].iter().all(|h| h.1 == f32::INFINITY));
}

#[test]
fn discard_removes_a_saved_snapshot() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("index.json");
    let index = VectorIndex::from_parts(chunks(&["a"]), vec![vec![1.0, 2.0]]).expect("index");
    index.save(&path).expect("save");

    assert!(VectorIndex::discard(&path).expect("discard"));
    assert!(!path.exists());
    assert!(!VectorIndex::discard(&path).expect("nothing to discard"));
    assert!(matches!(VectorIndex::load(&path), Err(Error::IndexUnavailable(_))));
}
