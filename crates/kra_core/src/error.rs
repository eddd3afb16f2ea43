use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error shared by every layer of the pipeline.
///
/// `code` is a stable SCREAMING_SNAKE identifier callers can match on;
/// `details` carries free-form context (paths, ids, upstream messages).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Re-code an error while keeping the original rendering in `details`.
    pub fn wrap(self, code: impl Into<String>, message: impl Into<String>) -> Self {
        let retryable = self.retryable;
        AppError::new(code, message)
            .with_details(self.to_string_with_details())
            .with_retryable(retryable)
    }

    pub fn to_string_with_details(&self) -> String {
        match self.details.as_deref() {
            Some(d) => format!("[{}] {} ({})", self.code, self.message, d),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
