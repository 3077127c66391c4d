//! Shared test utilities: scripted capability implementations

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sibyl::llm::{CompletionModel, Embedder};
use sibyl::voice::{Synthesizer, Transcriber};
use sibyl::{CapabilityError, CapabilityResult, TokenCounter};

/// Token counter that prices one token per whitespace word
#[allow(dead_code)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Token counter that prices every text at a fixed count
#[allow(dead_code)]
pub struct FixedCounter(pub usize);

impl TokenCounter for FixedCounter {
    fn count(&self, _text: &str) -> usize {
        self.0
    }
}

/// Transcriber that replays a script of capture results
#[allow(dead_code)]
pub struct ScriptedTranscriber {
    script: VecDeque<CapabilityResult<Option<String>>>,
}

#[allow(dead_code)]
impl ScriptedTranscriber {
    pub fn saying(texts: &[&str]) -> Self {
        Self {
            script: texts
                .iter()
                .map(|t| Ok(Some((*t).to_string())))
                .collect(),
        }
    }

    pub fn silent() -> Self {
        Self {
            script: VecDeque::from([Ok(None)]),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: VecDeque::from([Err(CapabilityError::Network("mic offline".to_string()))]),
        }
    }
}

#[async_trait(?Send)]
impl Transcriber for ScriptedTranscriber {
    async fn capture(&mut self) -> CapabilityResult<Option<String>> {
        self.script.pop_front().unwrap_or(Ok(None))
    }
}

/// Synthesizer that records everything it is asked to speak
#[allow(dead_code)]
pub struct RecordingSynthesizer {
    pub spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

#[allow(dead_code)]
impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    pub fn spoken_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.spoken)
    }
}

#[async_trait(?Send)]
impl Synthesizer for RecordingSynthesizer {
    async fn speak(&mut self, text: &str) -> CapabilityResult<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(CapabilityError::Audio("speaker offline".to_string()));
        }
        Ok(())
    }
}

/// Embedder that maps known texts to fixed vectors and counts its calls
#[allow(dead_code)]
pub struct VectorEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    pub single_calls: Arc<AtomicUsize>,
    pub batch_sizes: Arc<Mutex<Vec<usize>>>,
    fail: bool,
}

#[allow(dead_code)]
impl VectorEmbedder {
    pub fn new(pairs: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: pairs
                .iter()
                .map(|(text, v)| ((*text).to_string(), v.clone()))
                .collect(),
            fallback: vec![0.0, 0.0],
            single_calls: Arc::new(AtomicUsize::new(0)),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn uniform() -> Self {
        Self::new(&[])
    }

    pub fn failing() -> Self {
        let mut embedder = Self::new(&[]);
        embedder.fail = true;
        embedder
    }

    pub fn total_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst) + self.batch_sizes.lock().unwrap().len()
    }

    fn lookup(&self, text: &str) -> Vec<f32> {
        self.vectors.get(text).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Embedder for VectorEmbedder {
    async fn embed(&self, text: &str) -> CapabilityResult<Vec<f32>> {
        if self.fail {
            return Err(CapabilityError::Network("embedding offline".to_string()));
        }
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lookup(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> CapabilityResult<Vec<Vec<f32>>> {
        if self.fail {
            return Err(CapabilityError::Network("embedding offline".to_string()));
        }
        self.batch_sizes.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| self.lookup(t)).collect())
    }
}

/// Completion model that returns a canned answer, or fails
#[allow(dead_code)]
pub struct CannedCompletion {
    reply: Option<String>,
}

#[allow(dead_code)]
impl CannedCompletion {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl CompletionModel for CannedCompletion {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> CapabilityResult<String> {
        self.reply.clone().ok_or_else(|| {
            CapabilityError::Service {
                status: 500,
                body: "completion offline".to_string(),
            }
        })
    }
}
