use kra_core::dedup::DedupPolicy;
use kra_core::domain::{FinalAnswer, ResearchQuery};
use kra_core::error::AppError;
use kra_core::session::SessionState;

use crate::agents::{plan_question, run_answer_agent, run_evidence_agent, run_retriever};
use crate::corpus::CorpusStore;
use crate::embeddings::Embedder;
use crate::index::IndexStore;
use crate::ledger::EvidenceLedger;
use crate::llm::Llm;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub chat_model: String,
    pub top_k: u32,
    pub dedup: DedupPolicy,
    /// Turns of session history shown to the planner.
    pub history_turns: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chat_model: "llama3.2:3b".to_string(),
            top_k: 8,
            dedup: DedupPolicy::default(),
            history_turns: 3,
        }
    }
}

/// One question-answering turn wired from its collaborators.
pub struct Pipeline<'a> {
    corpus: &'a CorpusStore,
    index: &'a IndexStore,
    llm: &'a dyn Llm,
    embedder: &'a dyn Embedder,
    ledger: Option<&'a EvidenceLedger>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        corpus: &'a CorpusStore,
        index: &'a IndexStore,
        llm: &'a dyn Llm,
        embedder: &'a dyn Embedder,
        options: PipelineOptions,
    ) -> Self {
        Self {
            corpus,
            index,
            llm,
            embedder,
            ledger: None,
            options,
        }
    }

    pub fn with_ledger(mut self, ledger: &'a EvidenceLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Plan, retrieve, extract, deduplicate and answer, then remember the turn.
    ///
    /// The session is only updated when the turn succeeds.
    pub fn handle_one_turn(
        &self,
        question: &str,
        session: &mut SessionState,
    ) -> Result<FinalAnswer, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::new("PIPELINE_QUESTION_EMPTY", "Question must not be empty"));
        }
        let model = self.options.chat_model.as_str();
        let history = session.build_history_context(self.options.history_turns);
        let query = ResearchQuery {
            question: question.to_string(),
        };

        let plan = plan_question(self.llm, model, &query, &history)?;
        tracing::info!(retrieval_query = %plan.retrieval.query, "plan ready");

        let ctx = run_retriever(
            self.corpus,
            self.index,
            self.embedder,
            &plan.retrieval,
            self.options.top_k,
        )?;
        if ctx.chunks.is_empty() {
            return Err(AppError::new("PIPELINE_NO_HITS", "No chunks matched the question")
                .with_details(format!("query={}", ctx.query)));
        }
        tracing::info!(hits = ctx.chunks.len(), "chunks retrieved");

        let evidence = run_evidence_agent(self.llm, model, &ctx, question, &self.options.dedup)?;
        if let Some(ledger) = self.ledger {
            if !evidence.is_empty() {
                ledger
                    .record(&evidence)
                    .map_err(|e| e.wrap("PIPELINE_LEDGER_FAILED", "Failed to record evidence"))?;
            }
        }

        let answer = run_answer_agent(self.llm, model, &evidence)?;
        tracing::info!(citations = answer.citations.len(), "answer composed");

        session.add_turn(question, answer.answer.clone());
        Ok(answer)
    }
}
