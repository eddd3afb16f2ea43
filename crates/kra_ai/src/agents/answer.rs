use kra_core::domain::{EvidenceItem, EvidenceResponse, FinalAnswer};
use kra_core::error::AppError;

use super::prompts;
use crate::guardrails::enforce_citations;
use crate::llm::Llm;

pub const INSUFFICIENT_EVIDENCE_ANSWER: &str =
    "The retrieved papers do not contain enough evidence to answer this question.";

/// Number evidence items as `[C1]..[Cn]` for the answer prompt.
pub fn build_evidence_block(items: &[EvidenceItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "[C{}] claim: {}\n    evidence_sentence: {}\n    paper_id={}, chunk_index={}, source={}",
                i + 1,
                item.claim(),
                item.evidence_sentence(),
                item.paper_id(),
                item.chunk_index(),
                item.source()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Compose the cited answer. Citations in the result are the evidence items
/// the answer actually references, in marker order.
pub fn run_answer_agent(
    llm: &dyn Llm,
    model: &str,
    evidence: &EvidenceResponse,
) -> Result<FinalAnswer, AppError> {
    if evidence.is_empty() {
        return Ok(FinalAnswer {
            question: evidence.question().to_string(),
            answer: INSUFFICIENT_EVIDENCE_ANSWER.to_string(),
            citations: Vec::new(),
        });
    }

    let prompt = prompts::answer_prompt(evidence.question(), &build_evidence_block(evidence.items()));
    let answer = llm.generate(model, &prompt)?;
    let cited = enforce_citations(&answer, evidence.len())?;

    let citations = cited
        .into_iter()
        .map(|n| evidence.items()[n - 1].clone())
        .collect();
    Ok(FinalAnswer {
        question: evidence.question().to_string(),
        answer,
        citations,
    })
}
