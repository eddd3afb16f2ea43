use kra_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::ollama::{truncate_chars, OllamaClient};

const CODE: &str = "AI_LLM_FAILED";

// Evidence prompts carry up to 50 chunks of ~1200 chars; anything beyond this
// would overflow the context window of the small local models anyway.
const MAX_PROMPT_CHARS: usize = 64_000;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Bound the prompt, keeping its tail: the question and output rules come last.
fn bound_prompt(prompt: &str) -> &str {
    let total = prompt.chars().count();
    if total <= MAX_PROMPT_CHARS {
        return prompt;
    }
    let dropped = truncate_chars(prompt, total - MAX_PROMPT_CHARS);
    &prompt[dropped.len()..]
}

impl Llm for OllamaLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let bounded = bound_prompt(prompt);
        if bounded.len() < prompt.len() {
            tracing::warn!(model, dropped_bytes = prompt.len() - bounded.len(), "prompt truncated");
        }
        tracing::debug!(model, prompt_chars = bounded.len(), "calling ollama generate");

        let reply: GenerateResponse = self.client.post_json(
            "/api/generate",
            &GenerateRequest {
                model,
                prompt: bounded,
                stream: false,
            },
            CODE,
        )?;
        if reply.response.trim().is_empty() {
            return Err(AppError::new(CODE, "Model response was empty")
                .with_details(format!("model={model}")));
        }
        Ok(reply.response)
    }
}
