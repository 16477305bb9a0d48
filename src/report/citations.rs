use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::CiteAuditError;
use crate::report::{BIBLIOGRAPHY_MARKER_REGEX, CITATION_REGEX};

/// Citation index reserved for the original document being updated.
pub const ORIGINAL_REFERENCE: u32 = 0;

/// Consistency of the `[n]` markers of one chapter against its bibliography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationReport {
    /// Indices cited anywhere in the text, bibliography included.
    pub text_citations: BTreeSet<u32>,
    /// Indices listed after the bibliography heading.
    pub bib_citations: BTreeSet<u32>,
    /// Cited but never listed.
    pub orphans_in_text: BTreeSet<u32>,
    /// Listed but never cited.
    pub orphans_in_bib: BTreeSet<u32>,
    pub has_original_ref: bool,
}

impl CitationReport {
    /// True when no research citation is orphaned in either direction.
    pub fn is_consistent(&self) -> bool {
        self.orphans_in_text.is_empty() && self.orphans_in_bib.is_empty()
    }
}

/// Check the citation markers of `text` against its bibliography section.
///
/// The bibliography starts after the first standalone, case-insensitive
/// occurrence of "Sources", "Bibliography" or "References". A text without
/// such a heading is an error rather than an empty report, since every
/// citation in it would otherwise look consistent.
///
/// In-text citations are collected from the whole text, so a heading word
/// used in ordinary prose does not hide the citations before it. The
/// original reference `[0]` needs no bibliography line and is never an orphan.
pub fn check(text: &str) -> Result<CitationReport, CiteAuditError> {
    let (_, bibliography) = split_bibliography(text).ok_or(CiteAuditError::MissingBibliography)?;

    let text_citations = extract_citations(text);
    let bib_citations = extract_citations(bibliography);

    let orphans_in_text = text_citations
        .difference(&bib_citations)
        .copied()
        .filter(|&index| index != ORIGINAL_REFERENCE)
        .collect();
    let orphans_in_bib = bib_citations.difference(&text_citations).copied().collect();

    let report = CitationReport {
        has_original_ref: text_citations.contains(&ORIGINAL_REFERENCE),
        text_citations,
        bib_citations,
        orphans_in_text,
        orphans_in_bib,
    };
    debug!(
        "Checked {} in-text citations against {} bibliography citations",
        report.text_citations.len(),
        report.bib_citations.len()
    );
    Ok(report)
}

/// Split `text` into body and bibliography at the first bibliography heading.
pub fn split_bibliography(text: &str) -> Option<(&str, &str)> {
    let marker = BIBLIOGRAPHY_MARKER_REGEX.find(text)?;
    Some((&text[..marker.start()], &text[marker.end()..]))
}

/// Collect every `[n]` index in `text`. Markers too large for a `u32` are skipped.
pub fn extract_citations(text: &str) -> BTreeSet<u32> {
    CITATION_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| match m.as_str().parse::<u32>() {
            Ok(index) => Some(index),
            Err(_) => {
                debug!("Skipping out-of-range citation marker [{}]", m.as_str());
                None
            }
        })
        .collect()
}

fn join_indices(indices: &BTreeSet<u32>) -> String {
    indices
        .iter()
        .map(|i| format!("[{}]", i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for CitationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_original_ref {
            writeln!(f, "Correctly references Original Report [0]")?;
        } else {
            writeln!(f, "Missing reference to Original Report [0]")?;
        }
        if !self.orphans_in_text.is_empty() {
            writeln!(f, "Orphan citations found: {}", join_indices(&self.orphans_in_text))?;
        }
        if !self.orphans_in_bib.is_empty() {
            writeln!(f, "Uncited bibliography entries: {}", join_indices(&self.orphans_in_bib))?;
        }
        Ok(())
    }
}
