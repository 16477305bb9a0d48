use once_cell::sync::Lazy;
use regex::Regex;

pub mod bibliography;
pub mod citations;
pub mod links;
pub mod session;

pub use bibliography::{aggregate, AggregatedBibliography, BibliographyItem, SourceEntry, ACADEMIC_PREFIX};
pub use citations::{check, CitationReport, ORIGINAL_REFERENCE};
pub use links::{extract_urls, validate_links, LinkFailure, LinkReport, LinkValidator};
pub use session::{AuditOutcome, Chapter, ChapterCheck, ReportSession};

// Commonly used regex patterns compiled once
pub(crate) static CITATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([0-9]+)\]").expect("Invalid citation marker regex pattern")
});
pub(crate) static BIBLIOGRAPHY_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sources|bibliography|references)\b").expect("Invalid bibliography marker regex pattern")
});
// Tolerant on purpose: no `~`, no internationalized hosts, and trailing `)` or `.` are kept.
pub(crate) static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+")
        .expect("Invalid URL regex pattern")
});
