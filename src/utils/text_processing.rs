//! Text processing utilities.
//!
//! Helpers for the semicolon-joined list cells the spreadsheet backend
//! produces, including detection of cells that hold a serialized object
//! reference instead of text.

use log::*;
use regex::Regex;
use std::sync::OnceLock;

/// Matches a JVM array reference such as `[Ljava.lang.Object;@5e9f23b4`,
/// which the backend writes when it stringifies an array cell.
const SERIALIZATION_MARKER: &str = r"\[L[A-Za-z0-9_.$]+;";

fn marker_regex() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| match Regex::new(SERIALIZATION_MARKER) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(
                    "Failed to compile regex pattern '{}': {}",
                    SERIALIZATION_MARKER, e
                );
                None
            }
        })
        .as_ref()
}

/// Returns true when the text contains a corrupted-serialization marker.
///
pub fn has_serialization_marker(text: &str) -> bool {
    match marker_regex() {
        Some(re) => re.is_match(text),
        None => text.contains("[Ljava.lang.Object;"),
    }
}

/// Split a `;`-joined cell into trimmed, non-empty segments.
///
/// # Examples
/// `"a; b;;c "` becomes `["a", "b", "c"]`.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a notes cell, discarding it entirely when it is corrupted.
///
pub fn split_notes(text: &str) -> Vec<String> {
    if has_serialization_marker(text) {
        debug!("Discarding notes cell with serialization marker");
        return Vec::new();
    }
    split_list(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list("Called customer; Crew dispatched ;; "),
            vec!["Called customer", "Crew dispatched"]
        );
    }

    #[test]
    fn test_split_list_empty() {
        assert!(split_list("").is_empty());
        assert!(split_list(" ; ; ").is_empty());
    }

    #[test]
    fn test_marker_detected() {
        assert!(has_serialization_marker("[Ljava.lang.Object;@1b2c3d"));
        assert!(has_serialization_marker("note one; [Ljava.lang.Object;@ff"));
        assert!(!has_serialization_marker("Replaced fuse [L1]; done"));
    }

    #[test]
    fn test_split_notes_discards_corrupted_cell() {
        assert!(split_notes("first; [Ljava.lang.Object;@7a81197d").is_empty());
        assert_eq!(split_notes("first;second"), vec!["first", "second"]);
    }
}
