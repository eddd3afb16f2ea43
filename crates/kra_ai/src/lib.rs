pub mod agents;
pub mod corpus;
pub mod embeddings;
mod fsio;
pub mod guardrails;
pub mod index;
pub mod ledger;
pub mod llm;
pub mod ollama;
pub mod pipeline;
pub mod retrieve;

#[cfg(test)]
mod tests {
    use super::ollama::OllamaClient;

    #[test]
    fn enforces_localhost_only_base_url() {
        assert!(OllamaClient::new("http://127.0.0.1:11434").is_ok());
        assert!(OllamaClient::new("http://127.0.0.1").is_ok());
        assert!(OllamaClient::new("  http://127.0.0.1:11434/ ").is_ok());

        assert!(OllamaClient::new("http://localhost:11434").is_err());
        assert!(OllamaClient::new("http://0.0.0.0:11434").is_err());
        assert!(OllamaClient::new("http://[::1]:11434").is_err());
        assert!(OllamaClient::new("https://127.0.0.1:11434").is_err());

        assert!(OllamaClient::new("http://127.0.0.1.evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1@evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:0").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:99999").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:+80").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:11434/api").is_err());
    }

    #[test]
    fn rejected_url_reports_remote_not_allowed() {
        let err = OllamaClient::new("http://example.com").expect_err("remote");
        assert_eq!(err.code, "AI_REMOTE_NOT_ALLOWED");
        assert!(!err.retryable);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = OllamaClient::new("http://127.0.0.1:11434/").expect("client");
        assert_eq!(c.base_url(), "http://127.0.0.1:11434");
    }
}
