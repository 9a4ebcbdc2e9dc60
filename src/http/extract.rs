//! Marker-token extraction.
//!
//! Slices the text between two literal delimiters. Every field the handlers
//! read out of a request line (echo payload, filename) goes through here.

/// Return the text after the first `start`, up to the next `end` after it.
///
/// Returns `None` when `start` does not occur. When `end` never follows the
/// start position the slice runs to the end of `haystack`; nothing beyond
/// the given slice is ever inspected.
pub fn extract_between<'a>(start: &str, end: &str, haystack: &'a str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let rest = &haystack[from..];
    let len = rest.find(end).unwrap_or(rest.len());
    Some(&rest[..len])
}
