use std::collections::BTreeSet;

use kra_core::error::AppError;

/// Parse `[C<n>]` citation markers. Malformed markers are ignored.
pub fn extract_citation_markers(text: &str) -> BTreeSet<usize> {
    let mut out = BTreeSet::new();
    let mut rest = text;
    while let Some(pos) = rest.find("[C") {
        let after = &rest[pos + 2..];
        let digits: &str = &after[..after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len())];
        if !digits.is_empty() && after[digits.len()..].starts_with(']') {
            if let Ok(n) = digits.parse::<usize>() {
                out.insert(n);
            }
        }
        rest = after;
    }
    out
}

/// Require at least one `[Cn]` marker and no marker outside `1..=allowed`.
pub fn enforce_citations(output: &str, allowed: usize) -> Result<BTreeSet<usize>, AppError> {
    let cited = extract_citation_markers(output);
    if cited.is_empty() {
        return Err(AppError::new(
            "AI_CITATION_REQUIRED",
            "Answer must cite evidence with [Cn] markers",
        ));
    }
    if let Some(bad) = cited.iter().find(|&&n| n == 0 || n > allowed) {
        return Err(AppError::new(
            "AI_CITATION_INVALID",
            "Answer cites evidence that was not provided",
        )
        .with_details(format!("marker=C{bad}; allowed=C1..C{allowed}")));
    }
    Ok(cited)
}
