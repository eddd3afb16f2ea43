use serde::{Deserialize, Serialize};

use crate::error::AppError;

mod messages;

pub use messages::{
    FinalAnswer, PlannerTask, ResearchQuery, RetrievedChunk, RetrievedContext, TaskType,
};

/// One extracted claim with a single supporting sentence and its citation.
///
/// Immutable once built: every constructor path (including JSON decoding)
/// goes through [`EvidenceItem::new`], so a value of this type always has
/// non-blank text fields. Dedup identity is derived from the fields and never
/// stored on the item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawEvidenceItem")]
pub struct EvidenceItem {
    claim: String,
    evidence_sentence: String,
    paper_id: String,
    chunk_index: u32,
    source: String,
}

#[derive(Debug, Deserialize)]
struct RawEvidenceItem {
    claim: String,
    evidence_sentence: String,
    paper_id: String,
    chunk_index: u32,
    source: String,
}

impl TryFrom<RawEvidenceItem> for EvidenceItem {
    type Error = AppError;

    fn try_from(raw: RawEvidenceItem) -> Result<Self, Self::Error> {
        EvidenceItem::new(
            raw.claim,
            raw.evidence_sentence,
            raw.paper_id,
            raw.chunk_index,
            raw.source,
        )
    }
}

impl EvidenceItem {
    pub fn new(
        claim: impl Into<String>,
        evidence_sentence: impl Into<String>,
        paper_id: impl Into<String>,
        chunk_index: u32,
        source: impl Into<String>,
    ) -> Result<Self, AppError> {
        let item = Self {
            claim: claim.into(),
            evidence_sentence: evidence_sentence.into(),
            paper_id: paper_id.into(),
            chunk_index,
            source: source.into(),
        };
        for (field, value) in [
            ("claim", &item.claim),
            ("evidence_sentence", &item.evidence_sentence),
            ("paper_id", &item.paper_id),
            ("source", &item.source),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::new(
                    "EVIDENCE_ITEM_INVALID",
                    format!("Evidence item field {field} must not be blank"),
                )
                .with_details(format!("paper_id={}; chunk_index={}", item.paper_id, chunk_index)));
            }
        }
        Ok(item)
    }

    pub fn claim(&self) -> &str {
        &self.claim
    }

    pub fn evidence_sentence(&self) -> &str {
        &self.evidence_sentence
    }

    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Output of the extraction step: the question plus its evidence items, in
/// the order the model produced them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawEvidenceResponse")]
pub struct EvidenceResponse {
    question: String,
    items: Vec<EvidenceItem>,
}

#[derive(Debug, Deserialize)]
struct RawEvidenceResponse {
    question: String,
    #[serde(default)]
    items: Vec<EvidenceItem>,
}

impl TryFrom<RawEvidenceResponse> for EvidenceResponse {
    type Error = AppError;

    fn try_from(raw: RawEvidenceResponse) -> Result<Self, Self::Error> {
        EvidenceResponse::new(raw.question, raw.items)
    }
}

impl EvidenceResponse {
    pub fn new(question: impl Into<String>, items: Vec<EvidenceItem>) -> Result<Self, AppError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(AppError::new(
                "EVIDENCE_RESPONSE_INVALID",
                "Evidence response question must not be blank",
            ));
        }
        Ok(Self { question, items })
    }

    /// Rebuild with a new item list; the question was validated when `self` was built.
    pub fn with_items(&self, items: Vec<EvidenceItem>) -> Self {
        Self {
            question: self.question.clone(),
            items,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<EvidenceItem>) {
        (self.question, self.items)
    }
}
