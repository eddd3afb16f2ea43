use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{EvidenceItem, EvidenceResponse};
use crate::normalize::{normalize_text, question_hash};

mod matcher;

pub use matcher::similarity_ratio;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// How near-duplicate evidence items are collapsed.
///
/// `Fuzzy` groups by `(paper_id, chunk_index, question_hash)` and drops a
/// claim whose similarity to an earlier kept claim in the same group reaches
/// `threshold`. `Strict` keys on `(paper_id, chunk_index, normalized claim)`
/// and ignores the question entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DedupPolicy {
    Fuzzy { threshold: f64 },
    Strict,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        DedupPolicy::Fuzzy {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl DedupPolicy {
    /// Fuzzy policy with `threshold` clamped into `[0, 1]` (NaN falls back to the default).
    pub fn fuzzy(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            DEFAULT_SIMILARITY_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        DedupPolicy::Fuzzy { threshold }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupStats {
    pub input_items: usize,
    pub output_items: usize,
    /// Distinct `(paper_id, chunk_index)` citations seen in the input.
    pub groups: usize,
}

impl DedupStats {
    pub fn dropped(&self) -> usize {
        self.input_items - self.output_items
    }
}

/// Collapse near-duplicate claims that cite the same chunk for the same question.
pub fn deduplicate_evidence(response: &EvidenceResponse, similarity_threshold: f64) -> EvidenceResponse {
    deduplicate_with_policy(response, &DedupPolicy::fuzzy(similarity_threshold))
}

/// Exact-repeat removal keyed on `(paper_id, chunk_index, normalized claim)`.
pub fn deduplicate_evidence_strict(response: &EvidenceResponse) -> EvidenceResponse {
    deduplicate_with_policy(response, &DedupPolicy::Strict)
}

pub fn deduplicate_with_policy(response: &EvidenceResponse, policy: &DedupPolicy) -> EvidenceResponse {
    deduplicate_with_stats(response, policy).0
}

pub fn deduplicate_with_stats(
    response: &EvidenceResponse,
    policy: &DedupPolicy,
) -> (EvidenceResponse, DedupStats) {
    let items = match *policy {
        DedupPolicy::Fuzzy { threshold } => fuzzy_pass(response, threshold),
        DedupPolicy::Strict => strict_pass(response.items()),
    };

    let groups = response
        .items()
        .iter()
        .map(|it| (it.paper_id(), it.chunk_index()))
        .collect::<HashSet<_>>()
        .len();
    let stats = DedupStats {
        input_items: response.len(),
        output_items: items.len(),
        groups,
    };
    (response.with_items(items), stats)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey<'a> {
    paper_id: &'a str,
    chunk_index: u32,
    question_hash: &'a str,
}

struct Representative<'a> {
    item: &'a EvidenceItem,
    claim: Vec<char>,
}

fn fuzzy_pass(response: &EvidenceResponse, threshold: f64) -> Vec<EvidenceItem> {
    let qhash = question_hash(response.question());

    // First-seen group order, original order within each group.
    let mut slots: HashMap<GroupKey<'_>, usize> = HashMap::new();
    let mut groups: Vec<Vec<&EvidenceItem>> = Vec::new();
    for item in response.items() {
        let key = GroupKey {
            paper_id: item.paper_id(),
            chunk_index: item.chunk_index(),
            question_hash: qhash.as_str(),
        };
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }

    let mut out = Vec::with_capacity(response.len());
    for group in groups {
        let mut reps: Vec<Representative<'_>> = Vec::new();
        for candidate in group {
            let claim: Vec<char> = normalize_text(candidate.claim()).chars().collect();
            let duplicate = reps
                .iter()
                .any(|rep| matcher::ratio_chars(&rep.claim, &claim) >= threshold);
            if !duplicate {
                reps.push(Representative {
                    item: candidate,
                    claim,
                });
            }
        }
        out.extend(reps.into_iter().map(|rep| rep.item.clone()));
    }
    out
}

fn strict_pass(items: &[EvidenceItem]) -> Vec<EvidenceItem> {
    let mut seen: HashSet<(&str, u32, String)> = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let key = (item.paper_id(), item.chunk_index(), normalize_text(item.claim()));
        if seen.insert(key) {
            out.push(item.clone());
        }
    }
    out
}
