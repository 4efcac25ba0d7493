//! Ollama HTTP client.

use crate::error::{OllamaError, OllamaResult};
use crate::types::*;
use ragline_config::OllamaConfig;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Client for interacting with Ollama's API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Self::with_timeout(&config.host, Duration::from_secs(config.timeout_seconds))
    }

    /// Create a new client with default settings.
    pub fn new(host: impl Into<String>) -> OllamaResult<Self> {
        Self::with_timeout(&host.into(), Duration::from_secs(120))
    }

    fn with_timeout(host: &str, timeout: Duration) -> OllamaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OllamaError::Http)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Check if Ollama server is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List all available models.
    pub async fn list_models(&self) -> OllamaResult<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let list: ListModelsResponse = self.read_json(response, None).await?;
        Ok(list.models)
    }

    /// Check if a specific model is available, with or without a tag.
    pub async fn has_model(&self, model: &str) -> OllamaResult<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m.name == model || m.name.starts_with(&format!("{}:", model))))
    }

    /// Generate an embedding for text.
    pub async fn embed(&self, model: &str, text: &str) -> OllamaResult<Vec<f32>> {
        debug!(
            "Generating embedding with model {} for text length {}",
            model,
            text.len()
        );
        let request = EmbeddingRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };
        let response: EmbeddingResponse = self.post("/api/embeddings", &request, model).await?;
        Ok(response.embedding)
    }

    /// One non-streaming chat turn, optionally offering tools.
    pub async fn chat(&self, mut request: ChatRequest) -> OllamaResult<ChatResponse> {
        debug!(
            "Chat with model {} ({} messages, {} tools)",
            request.model,
            request.messages.len(),
            request.tools.len()
        );
        request.stream = false;
        let model = request.model.clone();
        self.post("/api/chat", &request, &model).await
    }

    async fn post<B, T>(&self, path: &str, body: &B, model: &str) -> OllamaResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        self.read_json(response, Some(model)).await
    }

    fn send_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_connect() {
            OllamaError::ServerNotRunning {
                host: self.host.clone(),
            }
        } else if e.is_timeout() {
            OllamaError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            OllamaError::Http(e)
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        model: Option<&str>,
    ) -> OllamaResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Some(model) = model {
                if text.contains("not found") || status.as_u16() == 404 {
                    return Err(OllamaError::ModelNotFound {
                        model: model.to_string(),
                    });
                }
            }
            return Err(OllamaError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| OllamaError::ParseError(e.to_string()))
    }
}
