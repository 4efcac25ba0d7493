use crate::client::OllamaClient;
use async_trait::async_trait;
use ragline_core::{CoreError, CoreResult, Embedder};

/// Embeddings from an Ollama embedding model such as `nomic-embed-text`.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        self.client
            .embed(&self.model, text)
            .await
            .map_err(|e| CoreError::Embedding(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failure_maps_to_embedding_error() {
        let embedder = OllamaEmbedder::new(
            OllamaClient::new("http://127.0.0.1:1").unwrap(),
            "nomic-embed-text",
        );
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        let err = embedder.embed("text").await.unwrap_err();
        assert!(matches!(err, CoreError::Embedding(_)));
    }
}
