use std::time::Duration;

use kra_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a client for a local Ollama server. Only `http://127.0.0.1[:port]` is accepted.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        validate_local_base_url(&base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(60),
        })
    }

    /// Timeout for generate/embedding calls; health checks always use a short one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(Duration::from_millis(800)).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                "AI_OLLAMA_UNREACHABLE",
                "Failed to reach Ollama on 127.0.0.1",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }

    /// POST `body` as JSON to `<base_url><path>` and decode the reply. Every
    /// failure is reported under `code`; transport errors are retryable.
    pub(crate) fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        code: &str,
    ) -> Result<R, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let body = serde_json::to_value(body).map_err(|e| {
            AppError::new(code, "Failed to encode Ollama request")
                .with_details(format!("path={path}; err={e}"))
        })?;
        match ureq::post(&url).timeout(self.timeout).send_json(body) {
            Ok(r) if r.status() == 200 => r.into_json().map_err(|e| {
                AppError::new(code, "Failed to decode Ollama response")
                    .with_details(format!("path={path}; err={e}"))
            }),
            Ok(r) => Err(AppError::new(code, "Ollama request failed")
                .with_details(format!("path={path}; status={}", r.status()))),
            // ureq reports 4xx/5xx as errors; an unknown model is not worth retrying.
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(code, "Ollama request failed")
                .with_details(format!("path={path}; status={status}"))
                .with_retryable(status >= 500)),
            Err(e) => Err(AppError::new(code, "Failed to call Ollama")
                .with_details(format!("path={path}; err={e}"))
                .with_retryable(true)),
        }
    }
}

/// Longest prefix of `input` with at most `max_chars` chars.
pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

fn validate_local_base_url(base_url: &str) -> Result<(), AppError> {
    let reject = || {
        AppError::new(
            "AI_REMOTE_NOT_ALLOWED",
            "Ollama base URL must be http://127.0.0.1 with an optional port",
        )
        .with_details(format!("base_url={base_url}"))
    };

    let rest = base_url.strip_prefix("http://127.0.0.1").ok_or_else(reject)?;
    if rest.is_empty() {
        return Ok(());
    }
    let port = rest.strip_prefix(':').ok_or_else(reject)?;
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(reject());
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(reject()),
    }
}
