//! Context retrieval integration tests
//!
//! Exercises `ContextBuilder` against a real store with scripted embedding
//! vectors: ranking order, budget fitting, cache refill, and degradation.

use std::sync::Arc;

use sibyl::{ContextBuilder, MemoryStore, TokenCounter};

mod common;

use common::{FixedCounter, VectorEmbedder, WordCounter};

fn store_with(dir: &tempfile::TempDir, chunks: &[&str]) -> MemoryStore {
    let mut store = MemoryStore::load(dir.path().join("memory_log.csv")).unwrap();
    store.append_chunks(chunks.iter().map(ToString::to_string));
    store
}

#[tokio::test]
async fn test_empty_store_makes_no_capability_calls() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_with(&dir, &[]);

    let embedder = VectorEmbedder::uniform();
    let single_calls = Arc::clone(&embedder.single_calls);
    let batch_sizes = Arc::clone(&embedder.batch_sizes);

    let counter: Arc<dyn TokenCounter + Send + Sync> = Arc::new(WordCounter);
    let builder = ContextBuilder::new(Arc::new(embedder), counter, 1800);

    let context = builder.build("anything at all", &mut store).await;

    assert_eq!(context, "");
    assert_eq!(single_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(batch_sizes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_records_ranked_by_distance_not_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    // Insertion order C, A, B; the question vector is closest to B, then A
    let mut store = store_with(&dir, &["C", "A", "B"]);

    let embedder = VectorEmbedder::new(&[
        ("C", vec![0.0, 1.0]),
        ("A", vec![0.7, 0.7]),
        ("B", vec![1.0, 0.0]),
        ("which one?", vec![1.0, 0.0]),
    ]);

    let counter: Arc<dyn TokenCounter + Send + Sync> = Arc::new(WordCounter);
    let builder = ContextBuilder::new(Arc::new(embedder), counter, 1800);

    let context = builder.build("which one?", &mut store).await;
    assert_eq!(context, "B\n\n###\n\nA\n\n###\n\nC");
}

#[tokio::test]
async fn test_context_respects_token_budget() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_with(&dir, &["one", "two", "three", "four", "five"]);

    // Five records priced at 500 tokens each: 3 * 504 = 1512 fits in 1800,
    // a fourth would reach 2016 and is excluded
    let counter: Arc<dyn TokenCounter + Send + Sync> = Arc::new(FixedCounter(500));
    let builder = ContextBuilder::new(Arc::new(VectorEmbedder::uniform()), counter, 1800);

    let context = builder.build("question", &mut store).await;
    let selected: Vec<&str> = context.split("\n\n###\n\n").collect();
    assert_eq!(selected.len(), 3);
}

#[tokio::test]
async fn test_embedding_failure_degrades_to_empty_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_with(&dir, &["remembered thing"]);

    let counter: Arc<dyn TokenCounter + Send + Sync> = Arc::new(WordCounter);
    let builder = ContextBuilder::new(Arc::new(VectorEmbedder::failing()), counter, 1800);

    let context = builder.build("question", &mut store).await;
    assert_eq!(context, "");
}

#[tokio::test]
async fn test_annotation_fill_is_batched_and_all_or_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_with(&dir, &["first", "second", "third"]);

    let embedder = VectorEmbedder::uniform();
    let batch_sizes = Arc::clone(&embedder.batch_sizes);

    let counter: Arc<dyn TokenCounter + Send + Sync> = Arc::new(WordCounter);
    let builder = ContextBuilder::new(Arc::new(embedder), counter, 1800);

    // First build annotates every record in one batch
    builder.build("question", &mut store).await;
    assert_eq!(batch_sizes.lock().unwrap().as_slice(), [3]);

    // A second build with a warm cache does not re-annotate
    builder.build("question", &mut store).await;
    assert_eq!(batch_sizes.lock().unwrap().as_slice(), [3]);

    // One new record invalidates the cache for the whole store
    store.append_chunks(vec!["fourth".to_string()]);
    builder.build("question", &mut store).await;
    assert_eq!(batch_sizes.lock().unwrap().as_slice(), [3, 4]);
}
