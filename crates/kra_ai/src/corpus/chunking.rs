use kra_core::error::AppError;
use serde::{Deserialize, Serialize};

/// Character-window chunking parameters. ~4 chars per token, so the defaults
/// give ~300-token chunks with ~50 tokens of overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingOptions {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            overlap: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDraft {
    pub chunk_index: u32,
    pub text: String,
}

/// Split `text` into overlapping windows of `chunk_size` chars, advancing by
/// `chunk_size - overlap`. Blank windows are skipped but still consume an
/// index, so indices always map back to the same character offset.
pub fn chunk_text(text: &str, opts: ChunkingOptions) -> Result<Vec<ChunkDraft>, AppError> {
    if opts.chunk_size == 0 || opts.overlap >= opts.chunk_size {
        return Err(AppError::new(
            "CORPUS_CHUNKING_INVALID",
            "chunk_size must be positive and larger than overlap",
        )
        .with_details(format!("chunk_size={}; overlap={}", opts.chunk_size, opts.overlap)));
    }
    let step = opts.chunk_size - opts.overlap;
    let chars: Vec<char> = text.chars().collect();

    let mut out = Vec::new();
    let mut start = 0usize;
    let mut index: u32 = 0;
    while start < chars.len() {
        let end = (start + opts.chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            out.push(ChunkDraft {
                chunk_index: index,
                text: window,
            });
        }
        index += 1;
        start += step;
    }
    Ok(out)
}

pub(crate) fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_overlap_and_cover_the_text() {
        let text: String = ('a'..='j').collect();
        let chunks = chunk_text(&text, ChunkingOptions { chunk_size: 4, overlap: 1 }).expect("chunks");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "defg", "ghij", "j"]);
        assert_eq!(chunks[3].chunk_index, 3);
    }

    #[test]
    fn blank_windows_are_skipped_but_keep_their_index() {
        let text = format!("{}{}", "x".repeat(4), " ".repeat(8));
        let chunks = chunk_text(&text, ChunkingOptions { chunk_size: 4, overlap: 0 }).expect("chunks");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);

        let text = format!("{}{}", " ".repeat(4), "y".repeat(4));
        let chunks = chunk_text(&text, ChunkingOptions { chunk_size: 4, overlap: 0 }).expect("chunks");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 1);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let chunks = chunk_text("ééééé", ChunkingOptions { chunk_size: 2, overlap: 0 }).expect("chunks");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text, "é");
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let err = chunk_text("abc", ChunkingOptions { chunk_size: 2, overlap: 2 }).expect_err("invalid");
        assert_eq!(err.code, "CORPUS_CHUNKING_INVALID");
        assert!(chunk_text("", ChunkingOptions::default()).expect("empty").is_empty());
    }
}
