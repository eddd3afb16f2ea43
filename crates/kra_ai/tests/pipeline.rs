use std::cell::RefCell;
use std::collections::VecDeque;

use kra_ai::corpus::{AddPaperInput, ChunkingOptions, CorpusStore};
use kra_ai::embeddings::Embedder;
use kra_ai::index::IndexStore;
use kra_ai::ledger::EvidenceLedger;
use kra_ai::llm::Llm;
use kra_ai::pipeline::{Pipeline, PipelineOptions};
use kra_core::error::AppError;
use kra_core::session::SessionState;
use pretty_assertions::assert_eq;

struct ScriptedLlm {
    responses: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedLlm {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: RefCell::new(responses.iter().map(|s| s.to_string()).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl Llm for ScriptedLlm {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, AppError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| AppError::new("AI_LLM_FAILED", "script exhausted"))
    }
}

struct CountABEmbedder;

impl Embedder for CountABEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let a = input.chars().filter(|c| *c == 'a').count();
        let b = input.chars().filter(|c| *c == 'b').count();
        Ok(vec![a as f32, b as f32])
    }
}

const PLAN: &str = r#"{"tasks": [
  {"task_type": "retrieval", "query": "aaa"},
  {"task_type": "evidence", "query": "aaa"},
  {"task_type": "answer", "query": "aaa"}
]}"#;

const EVIDENCE: &str = r#"```json
{"question": "ignored", "items": [
  {"claim": "Dense retrievers miss rare terminology.", "evidence_sentence": "They miss rare terms.", "paper_id": "p1", "chunk_index": 0, "source": "p1.txt"},
  {"claim": "Dense retrievers often miss rare terminology.", "evidence_sentence": "Rare terms are missed.", "paper_id": "p1", "chunk_index": 0, "source": "p1.txt"},
  {"claim": "Hybrid retrieval recovers rare terms.", "evidence_sentence": "BM25 helps.", "paper_id": "p1", "chunk_index": 1, "source": "p1.txt"}
]}
```"#;

struct Fixture {
    _dir: tempfile::TempDir,
    corpus: CorpusStore,
    index: IndexStore,
    ledger: EvidenceLedger,
}

fn fixture(texts: &[(&str, String)]) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus = CorpusStore::open(dir.path().join("corpus")).with_chunking(ChunkingOptions {
        chunk_size: 10,
        overlap: 0,
    });
    for (id, text) in texts {
        corpus
            .add_paper(AddPaperInput {
                text: Some(text.clone()),
                paper_id: Some(id.to_string()),
                source: Some(format!("{id}.txt")),
                added_at: "2026-10-19T00:00:00Z".to_string(),
                ..Default::default()
            })
            .expect("add_paper");
    }
    let index = IndexStore::open(dir.path().join("corpus"));
    index
        .build_with_embedder(&corpus, &CountABEmbedder, "mock-embed", "2026-10-19T00:00:00Z")
        .expect("build_index");
    let ledger = EvidenceLedger::open(dir.path().join("ledger"));
    Fixture {
        _dir: dir,
        corpus,
        index,
        ledger,
    }
}

#[test]
fn one_turn_plans_retrieves_deduplicates_and_answers() {
    let fx = fixture(&[("p1", format!("{}{}", "a".repeat(10), "ab".repeat(5)))]);
    let llm = ScriptedLlm::new(&[PLAN, EVIDENCE, "Dense retrievers miss rare terms [C1]; hybrid search helps [C2]."]);
    let pipeline = Pipeline::new(&fx.corpus, &fx.index, &llm, &CountABEmbedder, PipelineOptions::default())
        .with_ledger(&fx.ledger);
    let mut session = SessionState::new();

    let answer = pipeline
        .handle_one_turn("  Why do dense retrievers need help?  ", &mut session)
        .expect("turn");

    assert_eq!(answer.question, "Why do dense retrievers need help?");
    let cited: Vec<(u32, &str)> = answer
        .citations
        .iter()
        .map(|c| (c.chunk_index(), c.claim()))
        .collect();
    assert_eq!(
        cited,
        vec![
            (0, "Dense retrievers miss rare terminology."),
            (1, "Hybrid retrieval recovers rare terms."),
        ]
    );

    // Evidence prompt saw both hits, answer prompt saw the deduplicated items.
    let prompts = llm.prompts.borrow();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("[HIT 1] paper_id=p1, chunk_index=0"));
    assert!(prompts[1].contains("[HIT 2] paper_id=p1, chunk_index=1"));
    assert!(prompts[2].contains("[C2] claim: Hybrid retrieval recovers rare terms."));
    assert!(!prompts[2].contains("[C3]"));

    assert_eq!(session.turns.len(), 1);
    assert_eq!(session.turns[0].question, "Why do dense retrievers need help?");
    assert_eq!(session.turns[0].answer, answer.answer);

    let rows = fx.ledger.find_by_question("dense retrievers").expect("ledger");
    assert_eq!(rows.len(), 2);
}

#[test]
fn second_turn_shows_history_to_the_planner() {
    let fx = fixture(&[("p1", "a".repeat(10))]);
    let evidence = r#"{"question": "q", "items": [{"claim": "c", "evidence_sentence": "s", "paper_id": "p1", "chunk_index": 0, "source": "p1.txt"}]}"#;
    let llm = ScriptedLlm::new(&[PLAN, evidence, "first [C1]", PLAN, evidence, "second [C1]"]);
    let options = PipelineOptions {
        history_turns: 1,
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new(&fx.corpus, &fx.index, &llm, &CountABEmbedder, options);
    let mut session = SessionState::new();

    pipeline.handle_one_turn("first question", &mut session).expect("turn 1");
    pipeline.handle_one_turn("follow-up", &mut session).expect("turn 2");

    let prompts = llm.prompts.borrow();
    assert!(prompts[0].contains("(no previous turns)"));
    assert!(prompts[3].contains("[Turn 1]\nQ: first question\nA: first [C1]"));
    assert_eq!(session.turns.len(), 2);
}

#[test]
fn blank_question_is_rejected_before_any_model_call() {
    let fx = fixture(&[("p1", "a".repeat(10))]);
    let llm = ScriptedLlm::new(&[]);
    let pipeline = Pipeline::new(&fx.corpus, &fx.index, &llm, &CountABEmbedder, PipelineOptions::default());
    let mut session = SessionState::new();

    let err = pipeline.handle_one_turn(" \n\t", &mut session).expect_err("blank");
    assert_eq!(err.code, "PIPELINE_QUESTION_EMPTY");
    assert!(llm.prompts.borrow().is_empty());
    assert!(session.turns.is_empty());
}

#[test]
fn corpus_without_usable_vectors_yields_no_hits() {
    // No 'a' or 'b': every stored vector has zero norm and is skipped.
    let fx = fixture(&[("p1", "c".repeat(10))]);
    let llm = ScriptedLlm::new(&[PLAN]);
    let pipeline = Pipeline::new(&fx.corpus, &fx.index, &llm, &CountABEmbedder, PipelineOptions::default());
    let mut session = SessionState::new();

    let err = pipeline.handle_one_turn("anything", &mut session).expect_err("no hits");
    assert_eq!(err.code, "PIPELINE_NO_HITS");
    assert!(session.turns.is_empty());
}

#[test]
fn failed_turn_leaves_the_session_untouched() {
    let fx = fixture(&[("p1", "a".repeat(10))]);
    let llm = ScriptedLlm::new(&[r#"{"tasks": [{"task_type": "answer", "query": "q"}]}"#]);
    let pipeline = Pipeline::new(&fx.corpus, &fx.index, &llm, &CountABEmbedder, PipelineOptions::default());
    let mut session = SessionState::new();
    session.add_turn("earlier", "answer");

    let err = pipeline.handle_one_turn("q", &mut session).expect_err("incomplete plan");
    assert_eq!(err.code, "PLANNER_INCOMPLETE_PLAN");
    assert_eq!(session.turns.len(), 1);
}

#[test]
fn ledger_failure_is_reported_with_the_underlying_error() {
    let fx = fixture(&[("p1", "a".repeat(10))]);
    let blocker = fx._dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file in the way").expect("write");
    let broken = EvidenceLedger::open(blocker);

    let evidence = r#"{"question": "q", "items": [{"claim": "c", "evidence_sentence": "s", "paper_id": "p1", "chunk_index": 0, "source": "p1.txt"}]}"#;
    let llm = ScriptedLlm::new(&[PLAN, evidence, "answer [C1]"]);
    let pipeline = Pipeline::new(&fx.corpus, &fx.index, &llm, &CountABEmbedder, PipelineOptions::default())
        .with_ledger(&broken);
    let mut session = SessionState::new();

    let err = pipeline.handle_one_turn("q", &mut session).expect_err("ledger down");
    assert_eq!(err.code, "PIPELINE_LEDGER_FAILED");
    assert!(err.details.unwrap_or_default().contains("LEDGER_STORE_FAILED"));
    assert!(session.turns.is_empty());
}
