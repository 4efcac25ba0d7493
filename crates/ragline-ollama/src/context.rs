//! Rendering retrieved fragments as prompt context.

use ragline_core::SearchHit;

/// Format search hits as numbered context blocks.
///
/// Each block is `Context {i} (score {s:.3}):\n{content}\n`, numbered from 1,
/// and blocks are separated by a blank line. No hits yields an empty string.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("Context {} (score {:.3}):\n{}\n", i + 1, hit.score, hit.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate content to a maximum number of characters, adding an ellipsis if needed.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
