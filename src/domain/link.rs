//! Inline `[[reference]]` extraction and directed link edges.

use crate::domain::NoteId;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

// Shortest match per line; an opener without a closer on the same line yields nothing.
static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("reference pattern is valid"));

/// A single reference occurrence found in note content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Text between the delimiters, untouched.
    pub target: String,
    /// 1-based line number of the occurrence.
    pub line: usize,
}

/// Returns every reference occurrence in `content`, in document order.
///
/// Empty references (`[[]]`) and duplicates are included. Malformed
/// delimiters never produce an error, they simply do not match.
pub fn scan_references(content: &str) -> Vec<Reference> {
    content
        .lines()
        .enumerate()
        .flat_map(|(index, line)| {
            REFERENCE_RE.captures_iter(line).map(move |caps| Reference {
                target: caps[1].to_string(),
                line: index + 1,
            })
        })
        .collect()
}

/// Extracts the distinct referenced identifiers from note content.
///
/// Results keep first-occurrence order. Empty references and any target
/// listed in `exclude` (the note's own slug and id) are dropped. Case and
/// whitespace are preserved.
///
/// # Examples
///
/// ```
/// use zet::domain::extract_references;
///
/// let content = "# Rust\n\nSee [[ownership]] and [[traits]], again [[ownership]].\n[[rust]] [[]]";
/// assert_eq!(extract_references(content, &["rust"]), vec!["ownership", "traits"]);
/// ```
pub fn extract_references(content: &str, exclude: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    scan_references(content)
        .into_iter()
        .map(|r| r.target)
        .filter(|target| !target.is_empty() && !exclude.contains(&target.as_str()))
        .filter(|target| seen.insert(target.clone()))
        .collect()
}

/// A directed edge in the link graph: `from` references `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkEdge {
    pub from: NoteId,
    pub to: NoteId,
}

impl LinkEdge {
    pub fn new(from: NoteId, to: NoteId) -> Self {
        Self { from, to }
    }
}
