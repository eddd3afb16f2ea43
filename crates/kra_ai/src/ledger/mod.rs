//! Evidence ledger: every deduplicated evidence response the pipeline produced,
//! grouped by question so later sessions can look up what was cited before.

use std::collections::BTreeMap;
use std::path::PathBuf;

use kra_core::dedup::deduplicate_evidence_strict;
use kra_core::domain::EvidenceResponse;
use kra_core::error::AppError;
use kra_core::normalize::question_hash;
use serde::{Deserialize, Serialize};

use crate::fsio::{ensure_dir, read_json, write_json_atomic};

const CODE: &str = "LEDGER_STORE_FAILED";

/// One cited claim, flattened for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerRow {
    pub paper_id: String,
    pub source: String,
    pub claim: String,
    pub evidence: String,
    pub chunk_index: u32,
    pub question: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordReport {
    pub added: usize,
    pub total: usize,
}

/// Stored as `<root>/ledger.json`, a map from question hash to response.
#[derive(Debug, Clone)]
pub struct EvidenceLedger {
    root: PathBuf,
}

impl EvidenceLedger {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join("ledger.json")
    }

    fn read_all(&self) -> Result<BTreeMap<String, EvidenceResponse>, AppError> {
        Ok(read_json(&self.ledger_path(), CODE)?.unwrap_or_default())
    }

    /// Merge `response` into the entry for its question. Repeats of an already
    /// recorded claim for the same chunk are dropped; the first wording wins.
    pub fn record(&self, response: &EvidenceResponse) -> Result<RecordReport, AppError> {
        ensure_dir(&self.root, CODE)?;
        let mut all = self.read_all()?;
        let key = question_hash(response.question());

        let (before, merged) = match all.get(&key) {
            Some(existing) => {
                let mut items = existing.items().to_vec();
                items.extend(response.items().iter().cloned());
                (existing.len(), existing.with_items(items))
            }
            None => (0, response.clone()),
        };
        let merged = deduplicate_evidence_strict(&merged);
        let report = RecordReport {
            added: merged.len() - before,
            total: merged.len(),
        };
        all.insert(key, merged);
        write_json_atomic(&self.ledger_path(), &all, CODE)?;

        tracing::debug!(added = report.added, total = report.total, "ledger updated");
        Ok(report)
    }

    /// Rows for every recorded question containing `needle` (case-insensitive),
    /// ordered by `(paper_id, chunk_index)`. A blank needle matches nothing.
    pub fn find_by_question(&self, needle: &str) -> Result<Vec<LedgerRow>, AppError> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let mut rows = Vec::new();
        for response in self.read_all()?.into_values() {
            if !response.question().to_lowercase().contains(&needle) {
                continue;
            }
            for item in response.items() {
                rows.push(LedgerRow {
                    paper_id: item.paper_id().to_string(),
                    source: item.source().to_string(),
                    claim: item.claim().to_string(),
                    evidence: item.evidence_sentence().to_string(),
                    chunk_index: item.chunk_index(),
                    question: response.question().to_string(),
                });
            }
        }
        // Stable sort keeps recording order for rows citing the same chunk.
        rows.sort_by(|a, b| {
            a.paper_id
                .cmp(&b.paper_id)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        Ok(rows)
    }
}
