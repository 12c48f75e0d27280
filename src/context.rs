//! Query context assembly and summary previews.

use crate::store::Document;

/// Characters of a summary shown in listings before truncation.
pub const PREVIEW_CHARS: usize = 100;

/// Concatenate `Document '<filename>': <summary>` lines in the given order.
///
/// An empty slice yields an empty string, which callers treat as "no matching documents".
pub fn assemble_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|document| format!("Document '{}': {}", document.filename, document.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First [`PREVIEW_CHARS`] characters of `summary`, with `...` appended when truncated.
pub fn summary_preview(summary: &str) -> String {
    let prefix = char_prefix(summary, PREVIEW_CHARS);
    if prefix.len() < summary.len() {
        format!("{prefix}...")
    } else {
        summary.to_string()
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub(crate) fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn document(filename: &str, summary: &str) -> Document {
        Document {
            id: format!("id-{filename}"),
            filename: filename.into(),
            summary: summary.into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn joins_documents_with_newlines() {
        let documents = vec![document("a.pdf", "Alpha"), document("b.pdf", "Beta")];
        assert_eq!(
            assemble_context(&documents),
            "Document 'a.pdf': Alpha\nDocument 'b.pdf': Beta"
        );
    }

    #[test]
    fn assembly_is_deterministic_and_empty_for_no_documents() {
        let documents = vec![document("a.pdf", "Alpha")];
        assert_eq!(assemble_context(&documents), assemble_context(&documents));
        assert_eq!(assemble_context(&[]), "");
    }

    #[test]
    fn preview_keeps_short_summaries() {
        let summary = "Summary unavailable - boom";
        assert_eq!(summary_preview(summary), summary);
        let exact = "y".repeat(PREVIEW_CHARS);
        assert_eq!(summary_preview(&exact), exact);
    }

    #[test]
    fn preview_truncates_on_character_boundaries() {
        let summary = "é".repeat(150);
        let preview = summary_preview(&summary);
        assert_eq!(preview, format!("{}...", "é".repeat(100)));
    }
}
