use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaperRecord {
    pub paper_id: String,
    /// Human-readable origin, usually the file name.
    pub source: String,
    pub origin_path: Option<String>,
    pub char_count: u32,
    pub chunk_ids: Vec<String>,
    pub added_at: String, // RFC3339
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaperChunk {
    pub chunk_id: String,
    pub paper_id: String,
    pub chunk_index: u32,
    pub source: String,
    pub text: String,
    pub text_sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSummary {
    pub chunk_id: String,
    pub paper_id: String,
    pub chunk_index: u32,
    pub source: String,
    pub text_sha256: String,
}

impl From<&PaperChunk> for ChunkSummary {
    fn from(c: &PaperChunk) -> Self {
        Self {
            chunk_id: c.chunk_id.clone(),
            paper_id: c.paper_id.clone(),
            chunk_index: c.chunk_index,
            source: c.source.clone(),
            text_sha256: c.text_sha256.clone(),
        }
    }
}

/// Either `path` (a plain-text file) or `text` must be set, not both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddPaperInput {
    pub path: Option<PathBuf>,
    pub text: Option<String>,
    /// Defaults to the file stem.
    pub paper_id: Option<String>,
    /// Defaults to the file name, or the paper id for pasted text.
    pub source: Option<String>,
    pub added_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddPaperResult {
    pub paper_id: String,
    pub source: String,
    pub chunk_count: u32,
    pub replaced: bool,
}
