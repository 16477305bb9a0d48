use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CiteAuditError;

/// Title prefix the research step puts on scholarly-index results.
pub const ACADEMIC_PREFIX: &str = "[Academic] ";

const PLACEHOLDER: &str = "\n## Bibliography\n\nNo external sources identified.\n";

/// One piece of evidence returned by the research step for a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl SourceEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn is_academic(&self) -> bool {
        self.title.starts_with(ACADEMIC_PREFIX)
    }

    /// Title with the academic tag removed.
    pub fn display_title(&self) -> &str {
        self.title.strip_prefix(ACADEMIC_PREFIX).unwrap_or(&self.title)
    }
}

/// A deduplicated bibliography line, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibliographyItem {
    pub title: String,
    pub url: String,
    /// Chapter in which the URL was first seen.
    pub chapter: usize,
}

/// Report-wide bibliography, split by category, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedBibliography {
    pub academic: Vec<BibliographyItem>,
    pub web: Vec<BibliographyItem>,
}

impl AggregatedBibliography {
    pub fn is_empty(&self) -> bool {
        self.academic.is_empty() && self.web.is_empty()
    }

    pub fn len(&self) -> usize {
        self.academic.len() + self.web.len()
    }

    /// Academic entries first, then web entries.
    pub fn iter(&self) -> impl Iterator<Item = &BibliographyItem> {
        self.academic.iter().chain(self.web.iter())
    }

    /// Render the bibliography as numbered markdown sections.
    ///
    /// Each non-empty category gets its own section with numbering starting
    /// at 1. When both are empty a single placeholder section is produced
    /// instead of two empty headers.
    pub fn to_markdown(&self) -> String {
        if self.is_empty() {
            return PLACEHOLDER.to_string();
        }

        let mut output = String::new();

        if !self.academic.is_empty() {
            output.push_str("\n## Academic Bibliography\n\n");
            for (idx, item) in self.academic.iter().enumerate() {
                output.push_str(&format!("{}. **{}**  \n   Link: {}\n\n", idx + 1, item.title, item.url));
            }
        }

        if !self.web.is_empty() {
            output.push_str("\n## Web References\n\n");
            for (idx, item) in self.web.iter().enumerate() {
                output.push_str(&format!("{}. [{}]({})\n", idx + 1, item.title, item.url));
            }
        }

        output
    }
}

/// Merge per-chapter source lists into one deduplicated bibliography.
///
/// Chapters are visited in ascending index order (ties keep their input
/// order), entries in the order given. A URL is kept the first time it is
/// seen; later entries with the same URL are dropped even when their titles
/// differ. URLs are compared byte for byte.
///
/// Entries with a blank title or URL are rejected, duplicates included.
pub fn aggregate<I, S>(per_chapter_sources: I) -> Result<AggregatedBibliography, CiteAuditError>
where
    I: IntoIterator<Item = (usize, S)>,
    S: AsRef<[SourceEntry]>,
{
    let mut chapters: Vec<(usize, S)> = per_chapter_sources.into_iter().collect();
    chapters.sort_by_key(|(chapter, _)| *chapter);

    let mut bibliography = AggregatedBibliography::default();
    let mut seen_urls: HashSet<&str> = HashSet::new();
    let mut duplicates = 0;

    for (chapter, sources) in &chapters {
        let chapter = *chapter;
        for (position, source) in sources.as_ref().iter().enumerate() {
            validate_entry(chapter, position, source)?;

            if !seen_urls.insert(source.url.as_str()) {
                debug!("Skipping duplicate source {} in chapter {}", source.url, chapter);
                duplicates += 1;
                continue;
            }

            let item = BibliographyItem {
                title: source.display_title().to_string(),
                url: source.url.clone(),
                chapter,
            };
            if source.is_academic() {
                bibliography.academic.push(item);
            } else {
                bibliography.web.push(item);
            }
        }
    }

    info!(
        "Aggregated {} academic and {} web sources ({} duplicates skipped)",
        bibliography.academic.len(),
        bibliography.web.len(),
        duplicates
    );
    Ok(bibliography)
}

fn validate_entry(chapter: usize, position: usize, source: &SourceEntry) -> Result<(), CiteAuditError> {
    let missing = if source.url.trim().is_empty() {
        Some("url")
    } else if source.display_title().trim().is_empty() {
        Some("title")
    } else {
        None
    };

    match missing {
        Some(field) => Err(CiteAuditError::MalformedSourceEntry {
            chapter,
            position,
            field,
        }),
        None => Ok(()),
    }
}
