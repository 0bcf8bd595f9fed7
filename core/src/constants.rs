//! Reserved characters used as transient scaffolding inside document text.

/// U+2060 WORD JOINER.
///
/// Placed at the start of the document on iOS so the dictation engine does
/// not drop the first dictated word. Never part of user content.
pub const WORD_JOINER: char = '\u{2060}';

/// Returns `true` if `text` begins with `marker`.
pub fn starts_with_marker(text: &str, marker: char) -> bool {
    text.chars().next() == Some(marker)
}
