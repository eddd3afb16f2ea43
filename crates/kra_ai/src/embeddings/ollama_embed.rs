use kra_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::{truncate_chars, OllamaClient};

const CODE: &str = "AI_EMBEDDINGS_FAILED";

// Chunks are ~1200 chars; this only guards oversized queries.
const MAX_EMBED_CHARS: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let prompt = truncate_chars(input, MAX_EMBED_CHARS);
        let reply: EmbeddingsResponse =
            self.client
                .post_json("/api/embeddings", &EmbeddingsRequest { model, prompt }, CODE)?;
        if reply.embedding.is_empty() {
            return Err(AppError::new(CODE, "Embeddings response was empty")
                .with_details(format!("model={model}")));
        }
        Ok(reply.embedding)
    }
}
