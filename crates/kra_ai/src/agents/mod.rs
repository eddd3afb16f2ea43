//! The three model-driven steps of a turn (plan, extract, answer) plus the
//! retrieval step that feeds them. Each step is a plain function over the
//! [`Llm`](crate::llm::Llm) trait so tests can script model output.

pub mod answer;
pub mod evidence;
pub mod planner;
mod prompts;

pub use answer::{build_evidence_block, run_answer_agent, INSUFFICIENT_EVIDENCE_ANSWER};
pub use evidence::run_evidence_agent;
pub use planner::{plan_question, select_task, ExecutionPlan};

use kra_core::domain::{PlannerTask, RetrievedContext, TaskType};
use kra_core::error::AppError;

use crate::corpus::CorpusStore;
use crate::embeddings::Embedder;
use crate::index::IndexStore;
use crate::retrieve::vector_search;

/// Run the retrieval task and wrap the hits with the query that produced them.
pub fn run_retriever(
    corpus: &CorpusStore,
    index: &IndexStore,
    embedder: &dyn Embedder,
    task: &PlannerTask,
    k: u32,
) -> Result<RetrievedContext, AppError> {
    if task.task_type != TaskType::Retrieval {
        return Err(AppError::new(
            "PIPELINE_TASK_MISMATCH",
            "Retriever called with a non-retrieval task",
        )
        .with_details(format!("task_type={:?}", task.task_type)));
    }
    let chunks = vector_search(corpus, index, embedder, &task.query, k)?;
    Ok(RetrievedContext {
        query: task.query.clone(),
        chunks,
    })
}
