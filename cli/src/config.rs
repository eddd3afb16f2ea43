//! `kg-research-agent.toml` loading.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kra_ai::corpus::ChunkingOptions;
use kra_ai::ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
use kra_ai::pipeline::PipelineOptions;
use kra_ai::retrieve::MAX_TOP_K;
use kra_core::dedup::{DedupPolicy, DEFAULT_SIMILARITY_THRESHOLD};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "kg-research-agent.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DedupConfig {
    /// Exact-claim matching instead of fuzzy similarity.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_ollama_url() -> String { DEFAULT_OLLAMA_URL.to_string() }
fn default_chat_model() -> String { "llama3.2:3b".to_string() }
fn default_embed_model() -> String { "nomic-embed-text".to_string() }
fn default_timeout_secs() -> u64 { 120 }
fn default_top_k() -> u32 { 8 }
fn default_chunk_size() -> usize { 1200 }
fn default_chunk_overlap() -> usize { 200 }
fn default_threshold() -> f64 { DEFAULT_SIMILARITY_THRESHOLD }
fn default_history_turns() -> usize { 3 }
fn default_data_dir() -> PathBuf { PathBuf::from(".kg-research-agent") }

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            chat_model: default_chat_model(),
            embed_model: default_embed_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            strict: false,
            threshold: default_threshold(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_turns: default_history_turns(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load from `explicit`, else `./kg-research-agent.toml` when present, else
    /// defaults; then apply `KRA_*` environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = set("KRA_OLLAMA_URL") {
            self.ollama.url = v;
        }
        if let Some(v) = set("KRA_CHAT_MODEL") {
            self.ollama.chat_model = v;
        }
        if let Some(v) = set("KRA_EMBED_MODEL") {
            self.ollama.embed_model = v;
        }
        if let Some(v) = set("KRA_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.dedup.threshold) {
            bail!("dedup.threshold must be within [0, 1], got {}", self.dedup.threshold);
        }
        if !(1..=MAX_TOP_K).contains(&self.retrieval.top_k) {
            bail!("retrieval.top_k must be within 1..={MAX_TOP_K}, got {}", self.retrieval.top_k);
        }
        if self.retrieval.chunk_size == 0 || self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            bail!(
                "retrieval.chunk_overlap ({}) must be smaller than a positive retrieval.chunk_size ({})",
                self.retrieval.chunk_overlap,
                self.retrieval.chunk_size
            );
        }
        if self.ollama.chat_model.trim().is_empty() || self.ollama.embed_model.trim().is_empty() {
            bail!("ollama.chat_model and ollama.embed_model must be set");
        }
        OllamaClient::new(&self.ollama.url)?;
        Ok(())
    }

    pub fn dedup_policy(&self) -> DedupPolicy {
        if self.dedup.strict {
            DedupPolicy::Strict
        } else {
            DedupPolicy::fuzzy(self.dedup.threshold)
        }
    }

    pub fn chunking(&self) -> ChunkingOptions {
        ChunkingOptions {
            chunk_size: self.retrieval.chunk_size,
            overlap: self.retrieval.chunk_overlap,
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            chat_model: self.ollama.chat_model.clone(),
            top_k: self.retrieval.top_k,
            dedup: self.dedup_policy(),
            history_turns: self.session.history_turns,
        }
    }

    pub fn corpus_dir(&self) -> PathBuf {
        self.paths.data_dir.join("corpus")
    }

    pub fn ledger_dir(&self) -> PathBuf {
        self.paths.data_dir.join("ledger")
    }
}
