use kra_core::error::AppError;

/// Text generation backend. Implemented by [`ollama_llm::OllamaLlm`] and by test doubles.
pub trait Llm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError>;
}

pub mod ollama_llm;
