//! Character- and word-level text helpers shared by the LLM stages

/// Truncate `text` to at most `max_chars` characters.
///
/// Counts Unicode scalar values, so multi-byte content (Turkish, etc.) is never
/// split inside a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
