use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashMap;

use crate::config::LinkCheckConfig;
use crate::error::CiteAuditError;
use crate::report::{aggregate, check, LinkValidator, SourceEntry};

fn to_py_err(error: CiteAuditError) -> PyErr {
    match error {
        CiteAuditError::Io(e) => PyRuntimeError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Check the `[n]` citation markers of a chapter against its bibliography.
#[pyfunction]
fn check_citations<'py>(py: Python<'py>, text: &str) -> PyResult<Bound<'py, PyDict>> {
    let report = check(text).map_err(to_py_err)?;
    let dict = PyDict::new(py);
    dict.set_item("text_citations", report.text_citations.iter().copied().collect::<Vec<u32>>())?;
    dict.set_item("bib_citations", report.bib_citations.iter().copied().collect::<Vec<u32>>())?;
    dict.set_item("orphans_in_text", report.orphans_in_text.iter().copied().collect::<Vec<u32>>())?;
    dict.set_item("orphans_in_bib", report.orphans_in_bib.iter().copied().collect::<Vec<u32>>())?;
    dict.set_item("has_original_ref", report.has_original_ref)?;
    Ok(dict)
}

/// Deduplicate per-chapter sources into `(academic, web)` lists of `(title, url)`.
#[pyfunction]
fn aggregate_sources(
    per_chapter_sources: Vec<(usize, Vec<HashMap<String, String>>)>,
) -> PyResult<(Vec<(String, String)>, Vec<(String, String)>)> {
    let chapters: Vec<(usize, Vec<SourceEntry>)> = per_chapter_sources
        .into_iter()
        .map(|(chapter, sources)| {
            let entries = sources
                .into_iter()
                .map(|mut fields| {
                    SourceEntry::new(
                        fields.remove("title").unwrap_or_default(),
                        fields.remove("url").unwrap_or_default(),
                    )
                })
                .collect();
            (chapter, entries)
        })
        .collect();

    let bibliography = aggregate(chapters).map_err(to_py_err)?;
    let pairs = |items: Vec<crate::report::BibliographyItem>| {
        items.into_iter().map(|item| (item.title, item.url)).collect::<Vec<_>>()
    };
    Ok((pairs(bibliography.academic), pairs(bibliography.web)))
}

/// Check every distinct link in `text`; returns `(valid_count, [(url, reason)])`.
#[pyfunction]
fn validate_links(text: &str) -> PyResult<(usize, Vec<(String, String)>)> {
    let validator = LinkValidator::new(LinkCheckConfig::from_env()).map_err(to_py_err)?;
    let report = validator.validate_blocking(text).map_err(to_py_err)?;
    let broken = report
        .broken
        .into_iter()
        .map(|(url, reason)| (url, reason.to_string()))
        .collect();
    Ok((report.valid_count, broken))
}

#[pymodule]
fn citeaudit(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(check_citations, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate_sources, m)?)?;
    m.add_function(wrap_pyfunction!(validate_links, m)?)?;
    Ok(())
}
