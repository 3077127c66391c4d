//! LLM capability clients: text embedding and prompt completion
//!
//! The traits are the seams the context builder and answer generator
//! consume; the reqwest-backed clients speak the OpenAI and Azure OpenAI
//! wire formats.

mod completion;
mod embedder;

use async_trait::async_trait;

use crate::error::CapabilityResult;

pub use completion::CompletionClient;
pub use embedder::EmbeddingClient;

/// Produces embedding vectors for text
#[async_trait]
pub trait Embedder {
    /// Embed a single text
    async fn embed(&self, text: &str) -> CapabilityResult<Vec<f32>>;

    /// Embed multiple texts, preserving input order
    async fn embed_batch(&self, texts: &[&str]) -> CapabilityResult<Vec<Vec<f32>>>;
}

/// Generates a completion for a prompt
#[async_trait]
pub trait CompletionModel {
    /// Complete `prompt`, capping the response at `max_tokens`
    async fn complete(&self, prompt: &str, max_tokens: u32) -> CapabilityResult<String>;
}
