//! Text embedding client for semantic memory search

use async_trait::async_trait;

use crate::error::CapabilityResult;
use crate::llm::Embedder;
use crate::{CapabilityError, Error, HTTP_TIMEOUT, Result};

/// Embedding endpoint flavor
#[derive(Clone, Debug)]
enum EmbeddingEndpoint {
    OpenAi,
    Azure { base_url: String, api_version: String },
}

/// Text embedder backed by the OpenAI (or Azure OpenAI) embeddings API
#[derive(Clone, Debug)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: EmbeddingEndpoint,
}

impl EmbeddingClient {
    /// Create an embedder against the `OpenAI` API
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::build(api_key, model, EmbeddingEndpoint::OpenAi)
    }

    /// Create an embedder against an Azure `OpenAI` deployment
    ///
    /// `model` is the deployment name; `base_url` is the resource endpoint
    /// (e.g. `https://my-resource.openai.azure.com`).
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
            EmbeddingEndpoint::Azure {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_version,
            },
        )
    }

    fn build(api_key: String, model: String, endpoint: EmbeddingEndpoint) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for embeddings".to_string(),
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
        })
    }

    fn url(&self) -> String {
        match &self.endpoint {
            EmbeddingEndpoint::OpenAi => "https://api.openai.com/v1/embeddings".to_string(),
            EmbeddingEndpoint::Azure {
                base_url,
                api_version,
            } => format!(
                "{base_url}/openai/deployments/{}/embeddings?api-version={api_version}",
                self.model
            ),
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        match self.endpoint {
            EmbeddingEndpoint::OpenAi => self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {}", self.api_key)),
            EmbeddingEndpoint::Azure { .. } => {
                self.client.post(url).header("api-key", &self.api_key)
            }
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> CapabilityResult<Vec<f32>> {
        let embeddings = self.embed_batch(&[text]).await?;
        embeddings.into_iter().next().ok_or_else(|| {
            CapabilityError::MalformedResponse("empty embedding response".to_string())
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> CapabilityResult<Vec<Vec<f32>>> {
        #[derive(serde::Serialize)]
        struct EmbeddingRequest<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            model: Option<&'a str>,
            input: &'a [&'a str],
        }

        #[derive(serde::Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(serde::Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
            index: usize,
        }

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Azure routes the deployment through the URL, not the body
        let model = match self.endpoint {
            EmbeddingEndpoint::OpenAi => Some(self.model.as_str()),
            EmbeddingEndpoint::Azure { .. } => None,
        };

        let request = EmbeddingRequest {
            model,
            input: texts,
        };

        tracing::debug!(texts = texts.len(), model = %self.model, "embedding request");

        let response = self.request(&self.url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "embedding API error");
            return Err(CapabilityError::from_status(status, body));
        }

        let mut result: EmbeddingResponse = response.json().await?;

        // Sort by index to maintain input order
        result.data.sort_by_key(|d| d.index);

        if result.data.len() != texts.len() {
            return Err(CapabilityError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = EmbeddingClient::new(String::new(), "text-embedding-ada-002".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_azure_url_shape() {
        let client = EmbeddingClient::azure(
            "key".to_string(),
            "https://my-resource.openai.azure.com/".to_string(),
            "ada-deploy".to_string(),
            "2023-05-15".to_string(),
        )
        .unwrap();

        assert_eq!(
            client.url(),
            "https://my-resource.openai.azure.com/openai/deployments/ada-deploy/embeddings?api-version=2023-05-15"
        );
    }
}
