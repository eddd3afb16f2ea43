//! Subcommand bodies. Each builds the stores it needs from [`Config`].

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kra_ai::corpus::{AddPaperInput, CorpusStore};
use kra_ai::embeddings::ollama_embed::OllamaEmbedder;
use kra_ai::index::IndexStore;
use kra_ai::ledger::{EvidenceLedger, LedgerRow};
use kra_ai::llm::ollama_llm::OllamaLlm;
use kra_ai::ollama::OllamaClient;
use kra_ai::pipeline::Pipeline;
use kra_ai::retrieve::{format_hits_for_prompt, vector_search};
use kra_core::dedup::{deduplicate_with_stats, DedupPolicy};
use kra_core::domain::FinalAnswer;
use kra_core::error::AppError;
use kra_core::parse::parse_evidence_response;
use kra_core::session::SessionState;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::Config;

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::new("CLOCK_FORMAT_FAILED", "Failed to format time").with_details(e.to_string()))
}

fn ollama_client(config: &Config) -> Result<OllamaClient, AppError> {
    Ok(OllamaClient::new(&config.ollama.url)?
        .with_timeout(std::time::Duration::from_secs(config.ollama.timeout_secs)))
}

fn corpus(config: &Config) -> CorpusStore {
    CorpusStore::open(config.corpus_dir()).with_chunking(config.chunking())
}

fn index_store(config: &Config) -> IndexStore {
    IndexStore::open(config.corpus_dir())
}

pub fn ingest(config: &Config, files: &[PathBuf]) -> Result<()> {
    let store = corpus(config);
    let added_at = now_rfc3339_utc()?;
    for path in files {
        let res = store.add_paper(AddPaperInput {
            path: Some(path.clone()),
            added_at: added_at.clone(),
            ..Default::default()
        })?;
        println!(
            "{} {} ({} chunks, source={})",
            if res.replaced { "replaced" } else { "added" },
            res.paper_id,
            res.chunk_count,
            res.source
        );
    }
    println!("Run `kg-research-agent index` to embed new chunks.");
    Ok(())
}

pub fn index(config: &Config) -> Result<()> {
    let embedder = OllamaEmbedder::new(ollama_client(config)?);
    let report = index_store(config).build_with_embedder(
        &corpus(config),
        &embedder,
        &config.ollama.embed_model,
        &now_rfc3339_utc()?,
    )?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn search(config: &Config, query: &str, k: Option<u32>) -> Result<()> {
    let embedder = OllamaEmbedder::new(ollama_client(config)?);
    let hits = vector_search(
        &corpus(config),
        &index_store(config),
        &embedder,
        query,
        k.unwrap_or(config.retrieval.top_k),
    )?;
    if hits.is_empty() {
        println!("No matching chunks.");
    } else {
        println!("{}", format_hits_for_prompt(&hits));
    }
    Ok(())
}

pub fn ask(config: &Config, question: &str) -> Result<()> {
    let client = ollama_client(config)?;
    let llm = OllamaLlm::new(client.clone());
    let embedder = OllamaEmbedder::new(client);
    let (corpus, index) = (corpus(config), index_store(config));
    let ledger = EvidenceLedger::open(config.ledger_dir());
    let pipeline = Pipeline::new(&corpus, &index, &llm, &embedder, config.pipeline_options()).with_ledger(&ledger);

    let answer = pipeline.handle_one_turn(question, &mut SessionState::new())?;
    println!("{}", render_answer(&answer));
    Ok(())
}

pub fn chat(config: &Config) -> Result<()> {
    let client = ollama_client(config)?;
    let llm = OllamaLlm::new(client.clone());
    let embedder = OllamaEmbedder::new(client);
    let (corpus, index) = (corpus(config), index_store(config));
    let ledger = EvidenceLedger::open(config.ledger_dir());
    let pipeline = Pipeline::new(&corpus, &index, &llm, &embedder, config.pipeline_options()).with_ledger(&ledger);

    let mut session = SessionState::new();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    writeln!(stdout, "Ask about the papers in the corpus. Type `exit` or `quit` to leave.")?;
    run_repl(stdin.lock(), &mut stdout, |question| {
        pipeline
            .handle_one_turn(question, &mut session)
            .map(|answer| render_answer(&answer))
    })
}

/// Read questions line by line until EOF or `exit`/`quit`. A failed turn is
/// reported and the loop keeps going.
pub fn run_repl<R, W, F>(input: R, output: &mut W, mut turn: F) -> Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> Result<String, AppError>,
{
    write!(output, "> ")?;
    output.flush()?;
    for line in input.lines() {
        let line = line.context("Failed to read from stdin")?;
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        if !question.is_empty() {
            match turn(question) {
                Ok(rendered) => writeln!(output, "{rendered}\n")?,
                Err(e) => {
                    tracing::warn!(code = %e.code, "turn failed");
                    writeln!(output, "error: {e}\n")?;
                }
            }
        }
        write!(output, "> ")?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}

pub fn render_answer(answer: &FinalAnswer) -> String {
    let mut out = answer.answer.trim().to_string();
    if !answer.citations.is_empty() {
        out.push_str("\n\nSources:");
        for (i, c) in answer.citations.iter().enumerate() {
            out.push_str(&format!(
                "\n  {}. {} [{}, chunk {}]: {}",
                i + 1,
                c.paper_id(),
                c.source(),
                c.chunk_index(),
                c.claim()
            ));
        }
    }
    out
}

pub fn dedup(config: &Config, file: &Path, threshold: Option<f64>, strict: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read evidence file: {}", file.display()))?;
    let response = parse_evidence_response(&text)?;
    let policy = dedup_policy_for(config, threshold, strict);
    let (deduped, stats) = deduplicate_with_stats(&response, &policy);
    tracing::info!(?policy, "deduplicated evidence file");
    eprintln!(
        "kept {} of {} items ({} dropped, {} cited chunks)",
        stats.output_items,
        stats.input_items,
        stats.dropped(),
        stats.groups
    );
    println!("{}", serde_json::to_string_pretty(&deduped)?);
    Ok(())
}

/// Command-line flags win over the configured policy.
fn dedup_policy_for(config: &Config, threshold: Option<f64>, strict: bool) -> DedupPolicy {
    match (strict, threshold) {
        (true, _) => DedupPolicy::Strict,
        (false, Some(t)) => DedupPolicy::fuzzy(t),
        (false, None) => config.dedup_policy(),
    }
}

pub fn ledger(config: &Config, question: &str) -> Result<()> {
    let rows = EvidenceLedger::open(config.ledger_dir()).find_by_question(question)?;
    if rows.is_empty() {
        println!("No recorded evidence for questions matching {question:?}.");
        return Ok(());
    }
    for row in rows.iter() {
        println!("{}", render_ledger_row(row));
    }
    Ok(())
}

fn render_ledger_row(row: &LedgerRow) -> String {
    format!(
        "{} [{}, chunk {}]\n  claim: {}\n  evidence: {}\n  question: {}",
        row.paper_id, row.source, row.chunk_index, row.claim, row.evidence, row.question
    )
}

pub fn health(config: &Config) -> Result<()> {
    ollama_client(config)?.health_check()?;
    println!("Ollama reachable at {}", config.ollama.url);
    Ok(())
}
