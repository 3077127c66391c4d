//! Session orchestration
//!
//! Drives one interaction cycle: listen → retrieve context → generate
//! answer → speak → persist. Capability failures are contained per cycle
//! and degrade the result; only persistence failures abort the process.

use std::sync::Arc;

use crate::answer::AnswerGenerator;
use crate::context::ContextBuilder;
use crate::memory::{MemoryStore, split_into_chunks};
use crate::tokens::TokenCounter;
use crate::voice::{Synthesizer, Transcriber};
use crate::{Error, Result};

/// How one interaction cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Question answered, spoken, and persisted
    Completed,
    /// No speech recognized; memory untouched
    NoSpeech,
    /// No answer produced; nothing spoken, memory untouched
    NoAnswer,
}

/// One assistant session owning the memory store for the process lifetime
pub struct Session {
    input: Option<Box<dyn Transcriber>>,
    output: Option<Box<dyn Synthesizer>>,
    context: ContextBuilder,
    answerer: AnswerGenerator,
    counter: Arc<dyn TokenCounter + Send + Sync>,
    store: MemoryStore,
    chunk_max_tokens: usize,
}

impl Session {
    /// Create a text-only session (no voice I/O attached)
    #[must_use]
    pub fn new(
        context: ContextBuilder,
        answerer: AnswerGenerator,
        counter: Arc<dyn TokenCounter + Send + Sync>,
        store: MemoryStore,
        chunk_max_tokens: usize,
    ) -> Self {
        Self {
            input: None,
            output: None,
            context,
            answerer,
            counter,
            store,
            chunk_max_tokens,
        }
    }

    /// Attach voice input and output
    #[must_use]
    pub fn with_voice(
        mut self,
        input: Box<dyn Transcriber>,
        output: Box<dyn Synthesizer>,
    ) -> Self {
        self.input = Some(input);
        self.output = Some(output);
        self
    }

    /// The memory store owned by this session
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Run interaction cycles until ctrl-c
    ///
    /// # Errors
    ///
    /// Returns error if voice I/O is not attached or persistence fails
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("session started, press ctrl-c to stop");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
                outcome = self.run_cycle() => {
                    match outcome? {
                        CycleOutcome::Completed => {}
                        CycleOutcome::NoSpeech => tracing::debug!("cycle ended without speech"),
                        CycleOutcome::NoAnswer => tracing::debug!("cycle ended without an answer"),
                    }
                }
            }
        }
    }

    /// Run one listen → retrieve → generate → speak → persist cycle
    ///
    /// # Errors
    ///
    /// Returns error if voice I/O is not attached or persistence fails;
    /// capability failures end the cycle with a degraded outcome instead.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        // Listening
        let question = {
            let input = self
                .input
                .as_mut()
                .ok_or_else(|| Error::Config("voice input not attached".to_string()))?;

            match input.capture().await {
                Ok(Some(text)) if !text.trim().is_empty() => text,
                Ok(_) => {
                    tracing::info!("no speech recognized");
                    return Ok(CycleOutcome::NoSpeech);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "speech capture failed");
                    return Ok(CycleOutcome::NoSpeech);
                }
            }
        };

        tracing::info!(question = %question, "question received");

        // ContextRetrieval + Generating
        let answer = self.resolve(&question).await;
        if answer.is_empty() {
            tracing::warn!("no answer produced, cycle aborted");
            return Ok(CycleOutcome::NoAnswer);
        }

        // Speaking: a playback failure does not block persisting
        if let Some(output) = self.output.as_mut() {
            if let Err(e) = output.speak(&answer).await {
                tracing::warn!(error = %e, "speech synthesis failed");
            }
        }

        // Persisting
        self.persist(&question, &answer)?;
        Ok(CycleOutcome::Completed)
    }

    /// Answer a text question directly, updating memory on success
    ///
    /// Returns an empty string when no answer could be produced; nothing is
    /// persisted in that case.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let answer = self.resolve(question).await;
        if answer.is_empty() {
            return Ok(String::new());
        }

        self.persist(question, &answer)?;
        Ok(answer)
    }

    /// Retrieve context and generate an answer
    async fn resolve(&mut self, question: &str) -> String {
        let context = self.context.build(question, &mut self.store).await;
        self.answerer.answer(question, &context).await
    }

    /// Chunk the rendered Q&A pair into memory and rewrite the log
    fn persist(&mut self, question: &str, answer: &str) -> Result<()> {
        let entry = render_entry(self.store.len() + 1, question, answer);
        let chunks = split_into_chunks(&entry, self.chunk_max_tokens, self.counter.as_ref());
        let appended = chunks.len();

        self.store.append_chunks(chunks);
        self.store.save()?;

        tracing::info!(
            chunks = appended,
            records = self.store.len(),
            "memory log updated"
        );
        Ok(())
    }
}

/// Render one Q&A pair for storage
///
/// Question marks become periods so the stored text splits cleanly at
/// sentence boundaries on the next chunking pass.
fn render_entry(index: usize, question: &str, answer: &str) -> String {
    format!(
        "Question {index}: {}. Answer: {answer}",
        question.replace('?', ".")
    )
}
