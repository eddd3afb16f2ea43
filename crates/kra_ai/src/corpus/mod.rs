use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use kra_core::error::AppError;

use crate::fsio::{ensure_dir, read_json, remove_if_exists, sha256_hex, write_json_atomic};

pub mod chunking;
mod model;

pub use chunking::{chunk_text, ChunkDraft, ChunkingOptions};
pub use model::{AddPaperInput, AddPaperResult, ChunkSummary, PaperChunk, PaperRecord};

use chunking::normalize_line_endings;

const CODE: &str = "CORPUS_STORE_FAILED";

/// File-backed paper corpus.
///
/// Layout under `root`:
/// - `papers.json`: every [`PaperRecord`], sorted by `paper_id`
/// - `chunks/<sha256(chunk_id)>.json`: one [`PaperChunk`] per file
#[derive(Debug, Clone)]
pub struct CorpusStore {
    root: PathBuf,
    chunking: ChunkingOptions,
}

impl CorpusStore {
    pub fn open(root: PathBuf) -> Self {
        Self {
            root,
            chunking: ChunkingOptions::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingOptions) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn papers_path(&self) -> PathBuf {
        self.root.join("papers.json")
    }

    fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    fn chunk_path(&self, chunk_id: &str) -> PathBuf {
        // Chunk ids embed the paper id verbatim; hash them for a portable file name.
        self.chunks_dir()
            .join(format!("{}.json", sha256_hex(chunk_id.as_bytes())))
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        ensure_dir(&self.root, CODE)?;
        ensure_dir(&self.chunks_dir(), CODE)
    }

    fn read_papers(&self) -> Result<Vec<PaperRecord>, AppError> {
        Ok(read_json(&self.papers_path(), CODE)?.unwrap_or_default())
    }

    fn write_papers(&self, records: &mut Vec<PaperRecord>) -> Result<(), AppError> {
        records.sort_by(|a, b| a.paper_id.cmp(&b.paper_id));
        write_json_atomic(&self.papers_path(), &*records, CODE)
    }

    pub fn add_paper(&self, input: AddPaperInput) -> Result<AddPaperResult, AppError> {
        self.ensure_dirs()?;

        let (raw_text, file_stem, file_name) = match (&input.path, &input.text) {
            (Some(path), None) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    AppError::new("CORPUS_PAPER_INVALID", "Failed to read paper text file")
                        .with_details(format!("path={}; err={}", path.display(), e))
                })?;
                let stem = path.file_stem().map(|s| s.to_string_lossy().to_string());
                let name = path.file_name().map(|s| s.to_string_lossy().to_string());
                (text, stem, name)
            }
            (None, Some(text)) => (text.clone(), None, None),
            _ => {
                return Err(AppError::new(
                    "CORPUS_PAPER_INVALID",
                    "Exactly one of path or text is required",
                ))
            }
        };

        let paper_id = input
            .paper_id
            .clone()
            .or(file_stem)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::new("CORPUS_PAPER_INVALID", "Paper id is required"))?;
        let source = input
            .source
            .clone()
            .or(file_name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| paper_id.clone());

        let text = normalize_line_endings(&raw_text);
        let drafts = chunk_text(&text, self.chunking)?;
        if drafts.is_empty() {
            return Err(AppError::new("CORPUS_PAPER_EMPTY", "Paper has no non-blank text")
                .with_details(format!("paper_id={paper_id}")));
        }

        // New chunk files first, then the listing, then stale files: a failure
        // at any step leaves `papers.json` pointing only at chunks that exist.
        let mut papers = self.read_papers()?;
        let previous = papers
            .iter()
            .position(|p| p.paper_id == paper_id)
            .map(|pos| papers.remove(pos));
        let replaced = previous.is_some();

        let mut chunk_ids = Vec::with_capacity(drafts.len());
        for d in drafts {
            let chunk = PaperChunk {
                chunk_id: chunk_id_for(&paper_id, d.chunk_index),
                paper_id: paper_id.clone(),
                chunk_index: d.chunk_index,
                source: source.clone(),
                text_sha256: sha256_hex(d.text.as_bytes()),
                text: d.text,
            };
            write_json_atomic(&self.chunk_path(&chunk.chunk_id), &chunk, CODE)?;
            chunk_ids.push(chunk.chunk_id);
        }

        let chunk_count = chunk_ids.len() as u32;
        let fresh: HashSet<String> = chunk_ids.iter().cloned().collect();
        papers.push(PaperRecord {
            paper_id: paper_id.clone(),
            source: source.clone(),
            origin_path: input.path.as_ref().map(|p| p.display().to_string()),
            char_count: text.chars().count().min(u32::MAX as usize) as u32,
            chunk_ids,
            added_at: input.added_at,
        });
        self.write_papers(&mut papers)?;

        if let Some(old) = previous {
            let stale: Vec<String> = old
                .chunk_ids
                .into_iter()
                .filter(|id| !fresh.contains(id))
                .collect();
            self.delete_chunks(&stale)?;
        }

        tracing::info!(paper_id = %paper_id, chunk_count, replaced, "paper added to corpus");
        Ok(AddPaperResult {
            paper_id,
            source,
            chunk_count,
            replaced,
        })
    }

    pub fn remove_paper(&self, paper_id: &str) -> Result<bool, AppError> {
        self.ensure_dirs()?;
        let mut papers = self.read_papers()?;
        let Some(pos) = papers.iter().position(|p| p.paper_id == paper_id) else {
            return Ok(false);
        };
        let old = papers.remove(pos);
        self.write_papers(&mut papers)?;
        self.delete_chunks(&old.chunk_ids)?;
        Ok(true)
    }

    fn delete_chunks(&self, chunk_ids: &[String]) -> Result<(), AppError> {
        for id in chunk_ids {
            remove_if_exists(&self.chunk_path(id), CODE)?;
        }
        Ok(())
    }

    pub fn list_papers(&self) -> Result<Vec<PaperRecord>, AppError> {
        self.ensure_dirs()?;
        self.read_papers()
    }

    /// Like [`get_chunk`](Self::get_chunk), but a missing chunk is `Ok(None)`.
    pub fn find_chunk(&self, chunk_id: &str) -> Result<Option<PaperChunk>, AppError> {
        read_json(&self.chunk_path(chunk_id), CODE)
    }

    pub fn get_chunk(&self, chunk_id: &str) -> Result<PaperChunk, AppError> {
        self.find_chunk(chunk_id)?.ok_or_else(|| {
            AppError::new("CORPUS_CHUNK_NOT_FOUND", "Chunk not found")
                .with_details(format!("chunk_id={chunk_id}"))
        })
    }

    /// Chunk summaries ordered by `(paper_id, chunk_index)`.
    pub fn list_chunks(&self, paper_id: Option<&str>) -> Result<Vec<ChunkSummary>, AppError> {
        self.ensure_dirs()?;
        let mut out = Vec::new();
        for paper in self.read_papers()? {
            if paper_id.is_some_and(|id| id != paper.paper_id) {
                continue;
            }
            for cid in paper.chunk_ids.iter() {
                out.push(ChunkSummary::from(&self.get_chunk(cid)?));
            }
        }
        out.sort_by(|a, b| {
            a.paper_id
                .cmp(&b.paper_id)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        Ok(out)
    }
}

pub fn chunk_id_for(paper_id: &str, chunk_index: u32) -> String {
    format!("{paper_id}::chunk-{chunk_index:04}")
}
