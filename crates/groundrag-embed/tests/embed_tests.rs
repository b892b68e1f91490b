use groundrag_core::config::{EmbeddingProvider, EmbeddingSettings};
use groundrag_core::traits::EmbeddingGateway;
use groundrag_embed::{get_default_embedder, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(256);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 256, "embedding dim is 256");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_tokens_are_closer_than_disjoint_ones() {
    let embedder = HashEmbedder::new(512);
    let q = embedder.embed_text("remote work policy");
    let near = embedder.embed_text("Company policy about remote work");
    let far = embedder.embed_text("Benefits information and details");
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn empty_batch_and_empty_text() {
    let embedder = HashEmbedder::new(8);
    assert!(embedder.embed_batch(&[]).expect("embed").is_empty());
    let blank = embedder.embed_text("   ");
    assert_eq!(blank.len(), 8);
    assert!(blank.iter().all(|x| *x == 0.0));
}

#[test]
fn provider_none_disables_embeddings() {
    let settings = EmbeddingSettings { provider: EmbeddingProvider::None, ..EmbeddingSettings::default() };
    if std::env::var("APP_USE_FAKE_EMBEDDINGS").is_err() {
        assert!(get_default_embedder(&settings).expect("factory").is_none());
    }
    let hashed = EmbeddingSettings { dimension: 32, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&hashed).expect("factory").expect("hash embedder");
    assert_eq!(embedder.dim(), Some(32));
    assert_eq!(embedder.embedder_id(), "hash:d32");
}
