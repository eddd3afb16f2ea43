use kra_core::domain::RetrievedChunk;
use kra_core::error::AppError;

use crate::corpus::CorpusStore;
use crate::embeddings::Embedder;
use crate::index::IndexStore;

mod similarity;

pub const MAX_TOP_K: u32 = 50;

/// The `k` chunks closest to `query`, nearest first.
///
/// `distance` is `1 - cosine`; ties are broken by chunk id so repeated
/// searches return the same order. Zero-norm vectors are skipped, as are
/// vectors for chunks removed or rewritten since the index was built.
pub fn vector_search(
    corpus: &CorpusStore,
    index: &IndexStore,
    embedder: &dyn Embedder,
    query: &str,
    k: u32,
) -> Result<Vec<RetrievedChunk>, AppError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(AppError::new("RETRIEVAL_FAILED", "Query must not be empty"));
    }
    let k = k.clamp(1, MAX_TOP_K);

    let st = index.status()?;
    if !st.ready {
        return Err(AppError::new(
            "INDEX_NOT_READY",
            "Index not ready; build the index before searching",
        ));
    }
    let model = st
        .model
        .clone()
        .ok_or_else(|| AppError::new("INDEX_NOT_READY", "Index status missing model"))?;
    let dims = st
        .dims
        .ok_or_else(|| AppError::new("INDEX_NOT_READY", "Index status missing dims"))?;

    let qv = embedder.embed(&model, q)?;
    if qv.len() as u32 != dims {
        return Err(AppError::new(
            "RETRIEVAL_FAILED",
            "Query embedding dims do not match index dims",
        )
        .with_details(format!("index_dims={dims}; query_dims={}", qv.len())));
    }
    let qnorm = similarity::l2_norm(&qv);
    if qnorm == 0.0 {
        return Err(AppError::new("RETRIEVAL_FAILED", "Query embedding norm is zero"));
    }

    let vectors = index.read_vectors()?;
    let mut scored: Vec<(String, f32)> = Vec::with_capacity(vectors.len());
    for (chunk_id, v) in vectors.iter() {
        if v.len() as u32 != dims {
            return Err(AppError::new("RETRIEVAL_FAILED", "Index vector dims mismatch")
                .with_details(format!("chunk_id={chunk_id}; expected={dims}; got={}", v.len())));
        }
        let vnorm = similarity::l2_norm(v);
        if vnorm == 0.0 {
            continue;
        }
        let distance = 1.0 - similarity::cosine_similarity(&qv, v, qnorm, vnorm);
        scored.push((chunk_id.clone(), distance));
    }

    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    // The corpus may have changed since the last build: skip vectors whose
    // chunk is gone or whose text no longer matches what was embedded.
    let hashes = index.read_hashes()?;
    let mut hits = Vec::with_capacity(k as usize);
    let mut stale = 0usize;
    for (chunk_id, distance) in scored {
        if hits.len() == k as usize {
            break;
        }
        let Some(chunk) = corpus.find_chunk(&chunk_id)? else {
            stale += 1;
            continue;
        };
        if hashes.get(&chunk_id) != Some(&chunk.text_sha256) {
            stale += 1;
            continue;
        }
        hits.push(RetrievedChunk {
            chunk: chunk.text,
            paper_id: chunk.paper_id,
            chunk_index: chunk.chunk_index,
            source: chunk.source,
            distance,
        });
    }
    if stale > 0 {
        tracing::warn!(stale, "index is out of date with the corpus; rebuild it");
    }
    tracing::debug!(query = q, hits = hits.len(), "vector search finished");
    Ok(hits)
}

/// Render hits as numbered blocks for a prompt.
pub fn format_hits_for_prompt(hits: &[RetrievedChunk]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(hits.len() * 3);
    for (i, hit) in hits.iter().enumerate() {
        lines.push(format!(
            "[HIT {}] paper_id={}, chunk_index={}, source={}, distance={:.4}",
            i + 1,
            hit.paper_id,
            hit.chunk_index,
            hit.source,
            hit.distance
        ));
        lines.push(hit.chunk.trim().to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}
