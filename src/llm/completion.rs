//! Prompt completion client

use async_trait::async_trait;

use crate::error::CapabilityResult;
use crate::llm::CompletionModel;
use crate::{CapabilityError, Error, HTTP_TIMEOUT, Result};

/// Completion endpoint flavor
#[derive(Clone, Debug)]
enum CompletionEndpoint {
    OpenAi,
    Azure { base_url: String, api_version: String },
}

/// Completion client backed by the OpenAI (or Azure OpenAI) completions API
///
/// Requests use temperature 0, top_p 1 and zero penalties: answers should
/// be stable across runs for the same prompt and memory state.
#[derive(Clone, Debug)]
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: CompletionEndpoint,
    stop: Option<Vec<String>>,
}

impl CompletionClient {
    /// Create a completion client against the `OpenAI` API
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::build(api_key, model, CompletionEndpoint::OpenAi)
    }

    /// Create a completion client against an Azure `OpenAI` deployment
    ///
    /// `model` is the deployment name; `base_url` is the resource endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn azure(
        api_key: String,
        base_url: String,
        model: String,
        api_version: String,
    ) -> Result<Self> {
        Self::build(
            api_key,
            model,
            CompletionEndpoint::Azure {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_version,
            },
        )
    }

    /// Set stop sequences for generation
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn build(api_key: String, model: String, endpoint: CompletionEndpoint) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for completions".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
            stop: None,
        })
    }

    fn url(&self) -> String {
        match &self.endpoint {
            CompletionEndpoint::OpenAi => "https://api.openai.com/v1/completions".to_string(),
            CompletionEndpoint::Azure {
                base_url,
                api_version,
            } => format!(
                "{base_url}/openai/deployments/{}/completions?api-version={api_version}",
                self.model
            ),
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        match self.endpoint {
            CompletionEndpoint::OpenAi => self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {}", self.api_key)),
            CompletionEndpoint::Azure { .. } => {
                self.client.post(url).header("api-key", &self.api_key)
            }
        }
    }
}

#[async_trait]
impl CompletionModel for CompletionClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> CapabilityResult<String> {
        #[derive(serde::Serialize)]
        struct CompletionRequest<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            model: Option<&'a str>,
            prompt: &'a str,
            temperature: f32,
            max_tokens: u32,
            top_p: f32,
            frequency_penalty: f32,
            presence_penalty: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            stop: Option<&'a [String]>,
        }

        #[derive(serde::Deserialize)]
        struct CompletionResponse {
            choices: Vec<CompletionChoice>,
        }

        #[derive(serde::Deserialize)]
        struct CompletionChoice {
            text: String,
        }

        let model = match self.endpoint {
            CompletionEndpoint::OpenAi => Some(self.model.as_str()),
            CompletionEndpoint::Azure { .. } => None,
        };

        let request = CompletionRequest {
            model,
            prompt,
            temperature: 0.0,
            max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: self.stop.as_deref(),
        };

        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            max_tokens,
            "completion request"
        );

        let response = self.request(&self.url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "completion API error");
            return Err(CapabilityError::from_status(status, body));
        }

        let result: CompletionResponse = response.json().await?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| CapabilityError::MalformedResponse("no completion choices".to_string()))
    }
}
