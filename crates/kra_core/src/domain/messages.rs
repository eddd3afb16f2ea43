use serde::{Deserialize, Serialize};

use super::EvidenceItem;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearchQuery {
    pub question: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Retrieval,
    Evidence,
    Answer,
    // Planner output is free-form; unrecognized task kinds are carried, not rejected.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannerTask {
    pub task_type: TaskType,
    pub query: String,
}

/// A retrieved chunk with its citation metadata.
///
/// `distance` is `1 - cosine_similarity`; lower is closer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: String,
    pub paper_id: String,
    pub chunk_index: u32,
    pub source: String,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedContext {
    pub query: String,
    pub chunks: Vec<RetrievedChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalAnswer {
    pub question: String,
    pub answer: String,
    pub citations: Vec<EvidenceItem>,
}
