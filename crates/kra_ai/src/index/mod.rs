use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use kra_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::corpus::CorpusStore;
use crate::embeddings::Embedder;
use crate::fsio::{ensure_dir, read_json, write_json_atomic};

const CODE: &str = "INDEX_BUILD_FAILED";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub ready: bool,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub chunk_count: u32,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexBuildReport {
    pub status: IndexStatus,
    pub embedded: u32,
    pub reused: u32,
    pub removed: u32,
}

/// Dense vectors for every corpus chunk, keyed by chunk id.
///
/// Stored as JSON under `<root>/index/`: `index_status.json`,
/// `index_vectors.json`, and `index_hashes.json` (chunk id -> text sha256 at
/// embed time, used to skip unchanged chunks on rebuild).
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    fn status_path(&self) -> PathBuf {
        self.index_dir().join("index_status.json")
    }

    fn vectors_path(&self) -> PathBuf {
        self.index_dir().join("index_vectors.json")
    }

    fn hashes_path(&self) -> PathBuf {
        self.index_dir().join("index_hashes.json")
    }

    pub fn status(&self) -> Result<IndexStatus, AppError> {
        ensure_dir(&self.index_dir(), CODE)?;
        Ok(read_json(&self.status_path(), CODE)?.unwrap_or_default())
    }

    pub fn read_vectors(&self) -> Result<BTreeMap<String, Vec<f32>>, AppError> {
        ensure_dir(&self.index_dir(), CODE)?;
        Ok(read_json(&self.vectors_path(), CODE)?.unwrap_or_default())
    }

    /// Chunk id -> text sha256 the stored vector was computed from.
    pub fn read_hashes(&self) -> Result<BTreeMap<String, String>, AppError> {
        ensure_dir(&self.index_dir(), CODE)?;
        Ok(read_json(&self.hashes_path(), CODE)?.unwrap_or_default())
    }

    /// Embed every corpus chunk whose text changed since the last build.
    ///
    /// Switching models discards all previous vectors. Files are only written
    /// after every embedding succeeded.
    pub fn build_with_embedder(
        &self,
        corpus: &CorpusStore,
        embedder: &dyn Embedder,
        model: &str,
        updated_at: &str,
    ) -> Result<IndexBuildReport, AppError> {
        ensure_dir(&self.index_dir(), CODE)?;

        let summaries = corpus.list_chunks(None)?;
        if summaries.is_empty() {
            return Err(AppError::new(
                "INDEX_NOT_READY",
                "Corpus has no chunks; ingest papers before building the index",
            ));
        }

        let current = self.status()?;
        let compatible = current.ready && current.model.as_deref() == Some(model);
        let (mut vectors, mut hashes) = if compatible {
            (self.read_vectors()?, self.read_hashes()?)
        } else {
            (BTreeMap::new(), BTreeMap::new())
        };

        let wanted: BTreeSet<&str> = summaries.iter().map(|s| s.chunk_id.as_str()).collect();
        let before = vectors.len();
        vectors.retain(|k, _| wanted.contains(k.as_str()));
        hashes.retain(|k, _| wanted.contains(k.as_str()));
        let removed = (before - vectors.len()) as u32;

        let mut dims: Option<u32> = if compatible { current.dims } else { None };
        let mut embedded: u32 = 0;
        let mut reused: u32 = 0;

        for s in summaries.iter() {
            let fresh = hashes.get(&s.chunk_id) == Some(&s.text_sha256) && vectors.contains_key(&s.chunk_id);
            if fresh {
                reused += 1;
                continue;
            }

            let chunk = corpus.get_chunk(&s.chunk_id)?;
            let v = embedder.embed(model, &chunk.text).map_err(|e| {
                AppError::new("AI_EMBEDDINGS_FAILED", "Failed to compute embeddings")
                    .with_details(format!("chunk_id={}; err={}", s.chunk_id, e))
                    .with_retryable(e.retryable)
            })?;
            let this_dims = v.len() as u32;
            match dims {
                Some(d) if d != this_dims => {
                    return Err(AppError::new(
                        CODE,
                        "Embedding dimension mismatch across chunks",
                    )
                    .with_details(format!("expected={d}; got={this_dims}; chunk_id={}", s.chunk_id)));
                }
                Some(_) => {}
                None => dims = Some(this_dims),
            }
            vectors.insert(s.chunk_id.clone(), v);
            hashes.insert(s.chunk_id.clone(), s.text_sha256.clone());
            embedded += 1;
        }

        write_json_atomic(&self.vectors_path(), &vectors, CODE)?;
        write_json_atomic(&self.hashes_path(), &hashes, CODE)?;

        let status = IndexStatus {
            ready: true,
            model: Some(model.to_string()),
            dims,
            chunk_count: vectors.len() as u32,
            updated_at: Some(updated_at.to_string()),
        };
        write_json_atomic(&self.status_path(), &status, CODE)?;

        tracing::info!(model, embedded, reused, removed, "index built");
        Ok(IndexBuildReport {
            status,
            embedded,
            reused,
            removed,
        })
    }
}
