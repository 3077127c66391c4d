//! Semantic context retrieval over the memory log
//!
//! Ranks stored chunks by cosine distance to the question embedding and
//! assembles the longest prefix of ranked chunks that fits a token budget.
//! Any capability failure degrades to an empty context: the session answers
//! without memory rather than aborting.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::llm::Embedder;
use crate::memory::{MemoryRecord, MemoryStore};
use crate::tokens::TokenCounter;
use crate::CapabilityResult;

/// Separator between selected memory chunks in the assembled context
const CONTEXT_SEPARATOR: &str = "\n\n###\n\n";

/// Per-record token overhead for separator/formatting when budgeting
const RECORD_OVERHEAD_TOKENS: usize = 4;

/// Assembles a bounded context window for a question from the memory store
pub struct ContextBuilder {
    embedder: Arc<dyn Embedder + Send + Sync>,
    counter: Arc<dyn TokenCounter + Send + Sync>,
    max_context_tokens: usize,
}

impl ContextBuilder {
    /// Create a context builder with the given token budget
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder + Send + Sync>,
        counter: Arc<dyn TokenCounter + Send + Sync>,
        max_context_tokens: usize,
    ) -> Self {
        Self {
            embedder,
            counter,
            max_context_tokens,
        }
    }

    /// Build the context string for `question`
    ///
    /// Returns an empty string when the store is empty or when the embedding
    /// capability fails; the empty store case makes no capability calls at
    /// all.
    pub async fn build(&self, question: &str, store: &mut MemoryStore) -> String {
        if store.is_empty() {
            return String::new();
        }

        // Any record missing its annotations triggers a recompute of every
        // record: all-or-nothing cache fill, one batch request.
        if store.needs_annotations() {
            if let Err(e) = self.annotate_all(store).await {
                tracing::warn!(error = %e, "memory annotation failed, answering without context");
                return String::new();
            }
        }

        let question_embedding = match self.embedder.embed(question).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(error = %e, "question embedding failed, answering without context");
                return String::new();
            }
        };

        let context =
            select_within_budget(store.records(), &question_embedding, self.max_context_tokens);

        tracing::debug!(
            records = store.len(),
            context_chars = context.len(),
            "context assembled"
        );

        context
    }

    /// Recompute embeddings and token counts for every record
    async fn annotate_all(&self, store: &mut MemoryStore) -> CapabilityResult<()> {
        let texts: Vec<String> = store.records().iter().map(|r| r.text.clone()).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        tracing::debug!(records = refs.len(), "annotating memory records");
        let embeddings = self.embedder.embed_batch(&refs).await?;
        let token_counts: Vec<usize> = texts.iter().map(|t| self.counter.count(t)).collect();

        store.set_annotations(embeddings, token_counts);
        Ok(())
    }
}

/// Cosine distance `1 - dot(a,b) / (|a||b|)`; lower = more similar
///
/// Mismatched lengths and zero-magnitude vectors score as maximally
/// distant (1.0).
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 1.0;
    }

    1.0 - dot / denom
}

/// Rank records by distance to the question and take the longest prefix
/// that fits the token budget
///
/// The sort is stable, so equally distant records keep insertion order. The
/// record that would push the running total over the budget is excluded
/// outright, never truncated.
fn select_within_budget(
    records: &[MemoryRecord],
    question_embedding: &[f32],
    max_tokens: usize,
) -> String {
    let mut ranked: Vec<(&MemoryRecord, f32)> = records
        .iter()
        .map(|record| {
            let distance = record
                .embedding
                .as_deref()
                .map_or(1.0, |embedding| cosine_distance(question_embedding, embedding));
            (record, distance)
        })
        .collect();

    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut selected: Vec<&str> = Vec::new();
    let mut total_tokens = 0usize;

    for (record, _) in ranked {
        total_tokens += record.token_count.unwrap_or(0) + RECORD_OVERHEAD_TOKENS;
        if total_tokens > max_tokens {
            break;
        }
        selected.push(record.text.as_str());
    }

    selected.join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, embedding: Vec<f32>, token_count: usize) -> MemoryRecord {
        MemoryRecord {
            text: text.to_string(),
            embedding: Some(embedding),
            token_count: Some(token_count),
        }
    }

    #[test]
    fn test_cosine_distance_identical() {
        let a = vec![1.0, 0.0, 0.0];
        assert!(cosine_distance(&a, &a).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cosine_distance_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cosine_distance_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cosine_distance_mismatched_lengths() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cosine_distance_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_selection_orders_by_distance_not_insertion() {
        // Insertion order C, A, B; distance order is B, A, C
        let records = vec![
            record("C", vec![0.0, 1.0], 10),
            record("A", vec![0.5, 0.5], 10),
            record("B", vec![1.0, 0.0], 10),
        ];
        let question = vec![1.0, 0.0];

        let context = select_within_budget(&records, &question, 1000);
        assert_eq!(context, "B\n\n###\n\nA\n\n###\n\nC");
    }

    #[test]
    fn test_selection_stops_before_budget_overflow() {
        // Five records at 500 tokens each: 3 fit in 1800 (3*504 = 1512),
        // the 4th would reach 2016 and is excluded whole
        let records: Vec<MemoryRecord> = (0..5)
            .map(|i| record(&format!("chunk{i}"), vec![1.0, 0.0], 500))
            .collect();
        let question = vec![1.0, 0.0];

        let context = select_within_budget(&records, &question, 1800);
        let selected: Vec<&str> = context.split("\n\n###\n\n").collect();
        assert_eq!(selected, vec!["chunk0", "chunk1", "chunk2"]);
    }

    #[test]
    fn test_selection_ties_keep_insertion_order() {
        let records = vec![
            record("first", vec![1.0, 0.0], 5),
            record("second", vec![1.0, 0.0], 5),
            record("third", vec![1.0, 0.0], 5),
        ];
        let question = vec![1.0, 0.0];

        let context = select_within_budget(&records, &question, 1000);
        assert_eq!(context, "first\n\n###\n\nsecond\n\n###\n\nthird");
    }

    #[test]
    fn test_selection_empty_when_first_record_overflows() {
        let records = vec![record("huge", vec![1.0, 0.0], 5000)];
        let question = vec![1.0, 0.0];

        assert_eq!(select_within_budget(&records, &question, 1800), "");
    }
}
