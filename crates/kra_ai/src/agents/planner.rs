use kra_core::domain::{PlannerTask, ResearchQuery, TaskType};
use kra_core::error::AppError;
use kra_core::parse::parse_planner_tasks;

use super::prompts;
use crate::llm::Llm;

/// The three tasks a turn needs, picked out of the planner's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub retrieval: PlannerTask,
    pub evidence: PlannerTask,
    pub answer: PlannerTask,
}

pub fn plan_question(
    llm: &dyn Llm,
    model: &str,
    query: &ResearchQuery,
    history_context: &str,
) -> Result<ExecutionPlan, AppError> {
    let prompt = prompts::planner_prompt(&query.question, history_context);
    let raw = llm.generate(model, &prompt)?;
    let tasks = parse_planner_tasks(&raw)?;
    tracing::debug!(tasks = tasks.len(), "planner returned tasks");

    let missing = |kind: TaskType| {
        AppError::new(
            "PLANNER_INCOMPLETE_PLAN",
            "Planner did not return the retrieval, evidence, answer sequence",
        )
        .with_details(format!("missing={kind:?}; tasks={tasks:?}"))
    };
    Ok(ExecutionPlan {
        retrieval: select_task(&tasks, TaskType::Retrieval).ok_or_else(|| missing(TaskType::Retrieval))?,
        evidence: select_task(&tasks, TaskType::Evidence).ok_or_else(|| missing(TaskType::Evidence))?,
        answer: select_task(&tasks, TaskType::Answer).ok_or_else(|| missing(TaskType::Answer))?,
    })
}

/// First task of the given kind.
pub fn select_task(tasks: &[PlannerTask], kind: TaskType) -> Option<PlannerTask> {
    tasks.iter().find(|t| t.task_type == kind).cloned()
}
