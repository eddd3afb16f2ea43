use sha2::{Digest, Sha256};

/// Length of the truncated hex digest returned by [`question_hash`].
pub const QUESTION_HASH_LEN: usize = 16;

/// Lowercase and collapse whitespace runs to a single space, trimming both ends.
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

/// Short stable identifier for a question. Questions that differ only in case
/// or whitespace map to the same hash.
pub fn question_hash(question: &str) -> String {
    let digest = Sha256::digest(normalize_text(question).as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(QUESTION_HASH_LEN);
    hex
}
