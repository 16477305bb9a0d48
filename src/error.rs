use thiserror::Error;

/// Errors surfaced by the citation audit pipeline.
///
/// Broken links are deliberately absent: they are recorded as
/// [`LinkFailure`](crate::report::links::LinkFailure) values inside a link report.
#[derive(Error, Debug)]
pub enum CiteAuditError {
    #[error("No bibliography section found (expected a 'Sources', 'Bibliography' or 'References' heading)")]
    MissingBibliography,

    #[error("Malformed source entry {position} in chapter {chapter}: missing {field}")]
    MalformedSourceEntry {
        chapter: usize,
        position: usize,
        field: &'static str,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session file error: {0}")]
    Session(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
