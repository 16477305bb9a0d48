use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::CiteAuditError;
use crate::report::bibliography::{aggregate, AggregatedBibliography, SourceEntry};
use crate::report::citations::{check, CitationReport};
use crate::report::links::{LinkReport, LinkValidator};

/// A rewritten chapter together with the sources its research produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceEntry>) -> Self {
        self.sources = sources;
        self
    }
}

/// The document being updated, passed explicitly between pipeline stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSession {
    pub chapters: Vec<Chapter>,
}

/// Citation check result of a single chapter.
#[derive(Debug)]
pub struct ChapterCheck {
    pub index: usize,
    pub title: String,
    pub result: Result<CitationReport, CiteAuditError>,
}

impl ChapterCheck {
    pub fn passed(&self) -> bool {
        matches!(&self.result, Ok(report) if report.is_consistent() && report.has_original_ref)
    }
}

/// Everything a full audit of a session produces.
#[derive(Debug)]
pub struct AuditOutcome {
    pub chapters: Vec<ChapterCheck>,
    pub bibliography: AggregatedBibliography,
    pub links: LinkReport,
    /// Chapters followed by the rendered bibliography.
    pub report_text: String,
}

impl AuditOutcome {
    pub fn missing_bibliographies(&self) -> usize {
        self.chapters.iter().filter(|c| c.result.is_err()).count()
    }
}

impl ReportSession {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self { chapters }
    }

    pub fn load(path: &Path) -> Result<Self, CiteAuditError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), CiteAuditError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Sources of each chapter, keyed by chapter index.
    pub fn per_chapter_sources(&self) -> impl Iterator<Item = (usize, &[SourceEntry])> + '_ {
        self.chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| (index, chapter.sources.as_slice()))
    }

    pub fn bibliography(&self) -> Result<AggregatedBibliography, CiteAuditError> {
        aggregate(self.per_chapter_sources())
    }

    /// Run the citation check on every chapter without stopping at failures.
    pub fn check_chapters(&self) -> Vec<ChapterCheck> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| {
                let result = check(&chapter.content);
                if let Err(e) = &result {
                    warn!("Chapter {} '{}': {}", index + 1, chapter.title, e);
                }
                ChapterCheck {
                    index,
                    title: chapter.title.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Concatenate every chapter under its heading, then the bibliography.
    pub fn assemble(&self, bibliography: &AggregatedBibliography) -> String {
        let mut output = String::new();
        for chapter in &self.chapters {
            output.push_str(&format!("# {}\n\n{}\n\n---\n\n", chapter.title, chapter.content));
        }
        output.push_str(&bibliography.to_markdown());
        output
    }

    /// Check citations, aggregate sources, assemble the report and validate its links.
    pub async fn audit(&self, validator: &LinkValidator) -> Result<AuditOutcome, CiteAuditError> {
        let chapters = self.check_chapters();
        let bibliography = self.bibliography()?;
        let report_text = self.assemble(&bibliography);
        let links = validator.validate(&report_text).await;

        info!(
            "Audited {} chapters: {} bibliography entries, {} valid links, {} broken",
            chapters.len(),
            bibliography.len(),
            links.valid_count,
            links.broken.len()
        );

        Ok(AuditOutcome {
            chapters,
            bibliography,
            links,
            report_text,
        })
    }
}
