//! Boundary-preferring text chunker.
//!
//! Splits a unit's body into segments of at most `chunk_size` bytes with
//! an overlap of one tenth of the target, preferring paragraph (`\n\n`),
//! then newline, then space boundaries so chunks stay readable.
//!
//! Determinism matters here: the same text and the same size must produce
//! the same boundaries on every run, otherwise freshness-marker
//! propagation across runs loses its meaning. Each chunk carries its
//! parent's `source_path`, `freshness_marker`, and metadata, plus a
//! SHA-256 hash of its own text used by the embedding backfill.

use sha2::{Digest, Sha256};

use crate::models::DocUnit;

/// Split one unit into bounded, overlapping chunks.
///
/// Short bodies (including empty ones) come back as a single chunk, so
/// every scanned source yields at least one unit.
pub fn chunk_unit(unit: &DocUnit, chunk_size: usize) -> Vec<DocUnit> {
    let overlap = chunk_size / 10;
    split_text(&unit.content, chunk_size, overlap)
        .into_iter()
        .map(|text| {
            let mut chunk = DocUnit::new(text, unit.source_path.clone());
            chunk.freshness_marker = unit.freshness_marker;
            chunk.extra = unit.extra.clone();
            chunk.extra.insert(
                "content_hash".to_string(),
                serde_json::Value::String(text_hash(&chunk.content)),
            );
            chunk
        })
        .collect()
}

/// SHA-256 hex digest of a chunk body.
pub fn text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn split_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.trim().to_string()];
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let mut end = (start + max_chars).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }

        if end < text.len() {
            // Cut at the last paragraph, line, or word boundary inside
            // the window, as long as it keeps us moving past the overlap
            // tail of the previous chunk.
            let window = &text[start..end];
            let cut = window
                .rfind("\n\n")
                .map(|p| p + 2)
                .or_else(|| window.rfind('\n').map(|p| p + 1))
                .or_else(|| window.rfind(' ').map(|p| p + 1))
                .filter(|&p| p > overlap)
                .unwrap_or(window.len());
            end = start + cut;
        }

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        if end >= text.len() {
            break;
        }

        let mut next = end.saturating_sub(overlap).max(start + 1);
        while next < text.len() && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    if pieces.is_empty() {
        pieces.push(text.trim().to_string());
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_with(text: &str) -> DocUnit {
        let mut u = DocUnit::new(text.to_string(), Some("docs/a.md".to_string()));
        u.extra.insert(
            "site".to_string(),
            serde_json::Value::String("commerce".to_string()),
        );
        u
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_unit(&unit_with("Hello, world!"), 3000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello, world!");
    }

    #[test]
    fn test_empty_text_single_chunk() {
        let chunks = chunk_unit(&unit_with(""), 3000);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let text = (0..200)
            .map(|i| format!("Paragraph number {} with some filler text.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_unit(&unit_with(&text), 500);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.content.len() <= 500, "chunk too large: {}", c.content.len());
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "word ".repeat(500);
        let chunks = chunk_unit(&unit_with(&text), 300);
        assert!(chunks.len() > 1);
        // The tail of each chunk reappears at the head of the next.
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .content
                .chars()
                .rev()
                .take(10)
                .collect::<String>()
                .chars()
                .rev()
                .collect();
            assert!(
                pair[1].content.starts_with(tail.trim_start()),
                "no overlap between consecutive chunks"
            );
        }
    }

    #[test]
    fn test_metadata_propagated_to_every_chunk() {
        let text = "alpha beta ".repeat(200);
        let chunks = chunk_unit(&unit_with(&text), 300);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert_eq!(c.source_path.as_deref(), Some("docs/a.md"));
            assert_eq!(
                c.extra.get("site").and_then(|v| v.as_str()),
                Some("commerce")
            );
            assert!(c.extra.contains_key("content_hash"));
        }
    }

    #[test]
    fn test_deterministic_boundaries() {
        let text = (0..80)
            .map(|i| format!("Sentence {} about syncing documentation.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let a = chunk_unit(&unit_with(&text), 400);
        let b = chunk_unit(&unit_with(&text), 400);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.content, y.content);
            assert_eq!(x.extra.get("content_hash"), y.extra.get("content_hash"));
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let text = format!("{}\n\n{}", "a".repeat(200), "b".repeat(200));
        let chunks = chunk_unit(&unit_with(&text), 250);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.chars().all(|c| c == 'a'));
    }
}
