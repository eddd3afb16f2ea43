use kra_core::dedup::{deduplicate_with_stats, DedupPolicy};
use kra_core::domain::{EvidenceResponse, RetrievedContext};
use kra_core::error::AppError;
use kra_core::parse::parse_evidence_response;

use super::prompts;
use crate::llm::Llm;
use crate::retrieve::format_hits_for_prompt;

/// Extract evidence for `question` from the retrieved chunks, then collapse
/// duplicates with `policy`.
///
/// The returned response always carries the caller's question, even if the
/// model echoed a reworded one.
pub fn run_evidence_agent(
    llm: &dyn Llm,
    model: &str,
    ctx: &RetrievedContext,
    question: &str,
    policy: &DedupPolicy,
) -> Result<EvidenceResponse, AppError> {
    let prompt = prompts::evidence_prompt(question, &format_hits_for_prompt(&ctx.chunks));
    let raw = llm.generate(model, &prompt)?;
    let parsed = parse_evidence_response(&raw)?;
    let (_, items) = parsed.into_parts();
    let extracted = EvidenceResponse::new(question, items)?;

    let (deduped, stats) = deduplicate_with_stats(&extracted, policy);
    tracing::info!(
        input = stats.input_items,
        kept = stats.output_items,
        dropped = stats.dropped(),
        "evidence deduplicated"
    );
    Ok(deduped)
}
