// Character-offset helpers shared by rendering and suggestion splicing.
// The grammar service reports spans in characters; Rust strings index bytes.

use std::ops::Range;

/// Byte index of the `char_idx`-th character, clamped to the end of `text`.
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Byte range of the character span `[offset, offset + length)`.
///
/// Both ends are clamped to the text, so a stale span never panics; it just
/// shrinks, possibly to an empty range at the end of the text.
pub fn byte_span(text: &str, offset: usize, length: usize) -> Range<usize> {
    let start = char_to_byte(text, offset);
    let end = char_to_byte(text, offset.saturating_add(length));
    start..end.max(start)
}

/// Replace `range` (in bytes) of `text` with `replacement`.
pub fn splice(text: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}
