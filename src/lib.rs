//! Citation consistency checks, bibliography aggregation and link validation
//! for reports whose chapters were rewritten from fresh research.

pub mod config;
pub mod error;
pub mod report;

#[cfg(feature = "python")]
mod python;

pub use config::LinkCheckConfig;
pub use error::CiteAuditError;
pub use report::{
    aggregate, check, validate_links, AggregatedBibliography, BibliographyItem, CitationReport, LinkFailure,
    LinkReport, LinkValidator, ReportSession, SourceEntry,
};
