//! Answer generation: prompt assembly and completion invocation

use std::sync::Arc;

use crate::llm::CompletionModel;

/// Generates answers to questions, optionally grounded in memory context
///
/// Completion failures are contained here: the caller receives an empty
/// string as the "no answer produced" sentinel and decides how to degrade.
pub struct AnswerGenerator {
    model: Arc<dyn CompletionModel + Send + Sync>,
    prompt_guide: String,
    max_tokens: u32,
}

impl AnswerGenerator {
    /// Create an answer generator
    #[must_use]
    pub fn new(
        model: Arc<dyn CompletionModel + Send + Sync>,
        prompt_guide: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            model,
            prompt_guide: prompt_guide.into(),
            max_tokens,
        }
    }

    /// Answer `question`, incorporating `context` when non-empty
    ///
    /// Returns the trimmed answer, or an empty string if the completion
    /// capability fails.
    pub async fn answer(&self, question: &str, context: &str) -> String {
        let prompt = build_prompt(&self.prompt_guide, context, question);

        match self.model.complete(&prompt, self.max_tokens).await {
            Ok(text) => {
                let answer = text.trim().to_string();
                tracing::info!(answer_chars = answer.len(), "answer generated");
                answer
            }
            Err(e) => {
                tracing::warn!(error = %e, "completion failed, no answer produced");
                String::new()
            }
        }
    }
}

/// Assemble the completion prompt
///
/// The context clause is only prepended when there is context to
/// incorporate.
fn build_prompt(guide: &str, context: &str, question: &str) -> String {
    let context_clause = if context.is_empty() {
        String::new()
    } else {
        format!(" When answering, incorporate the context below.\n\nContext: {context}")
    };

    format!("{guide}{context_clause}\n\n---\n\nQuestion: {question}\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_prompt("Answer well.", "", "What is Rust?");
        assert_eq!(
            prompt,
            "Answer well.\n\n---\n\nQuestion: What is Rust?\nAnswer:"
        );
    }

    #[test]
    fn test_prompt_with_context() {
        let prompt = build_prompt("Answer well.", "Rust is a language.", "What is Rust?");
        assert_eq!(
            prompt,
            "Answer well. When answering, incorporate the context below.\n\n\
             Context: Rust is a language.\n\n---\n\nQuestion: What is Rust?\nAnswer:"
        );
    }
}
