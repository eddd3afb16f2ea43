//! Decoding of model output that is supposed to be JSON.
//!
//! Models often wrap JSON in a Markdown code fence; the fence is removed
//! before decoding. Decoding goes through the domain types, so malformed items
//! are rejected here rather than inside dedup.

use serde::Deserialize;

use crate::domain::{EvidenceResponse, PlannerTask};
use crate::error::AppError;

/// Strip one surrounding Markdown code fence (with an optional language tag).
pub fn extract_json_payload(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) up to the end of the opening line.
    let body = match rest.find('\n') {
        Some(nl) => {
            let tag = rest[..nl].trim();
            if tag.is_empty() || tag.eq_ignore_ascii_case("json") {
                &rest[nl + 1..]
            } else {
                rest
            }
        }
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_evidence_response(text: &str) -> Result<EvidenceResponse, AppError> {
    let payload = extract_json_payload(text);
    serde_json::from_str(payload).map_err(|e| {
        AppError::new(
            "EVIDENCE_PARSE_FAILED",
            "Model output is not a valid evidence response",
        )
        .with_details(e.to_string())
    })
}

#[derive(Debug, Deserialize)]
struct PlanEnvelope {
    #[serde(default)]
    tasks: Vec<PlannerTask>,
}

pub fn parse_planner_tasks(text: &str) -> Result<Vec<PlannerTask>, AppError> {
    let payload = extract_json_payload(text);
    let plan: PlanEnvelope = serde_json::from_str(payload).map_err(|e| {
        AppError::new("PLANNER_PARSE_FAILED", "Model output is not a valid plan")
            .with_details(e.to_string())
    })?;
    Ok(plan.tasks)
}
