pub mod dedup;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod session;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("EVIDENCE_ITEM_INVALID", "claim is required").with_retryable(false);
        assert_eq!(err.code, "EVIDENCE_ITEM_INVALID");
        assert_eq!(err.message, "claim is required");
        assert!(!err.retryable);
        assert_eq!(err.to_string(), "[EVIDENCE_ITEM_INVALID] claim is required");
    }

    #[test]
    fn wrap_keeps_inner_rendering_and_retryable_flag() {
        let inner = AppError::new("AI_LLM_FAILED", "Failed to call generate endpoint")
            .with_details("connection refused")
            .with_retryable(true);
        let outer = inner.wrap("PIPELINE_EVIDENCE_FAILED", "Evidence extraction failed");
        assert_eq!(outer.code, "PIPELINE_EVIDENCE_FAILED");
        assert!(outer.retryable);
        assert_eq!(
            outer.details.as_deref(),
            Some("[AI_LLM_FAILED] Failed to call generate endpoint (connection refused)")
        );
    }
}
