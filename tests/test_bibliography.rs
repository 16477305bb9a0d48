use citeaudit::error::CiteAuditError;
use citeaudit::report::bibliography::{aggregate, AggregatedBibliography, BibliographyItem, SourceEntry};

fn item(title: &str, url: &str, chapter: usize) -> BibliographyItem {
    BibliographyItem {
        title: title.to_string(),
        url: url.to_string(),
        chapter,
    }
}

#[test]
fn test_duplicate_academic_source_keeps_first() {
    let chapters = vec![
        (0, vec![SourceEntry::new("[Academic] Paper A", "a.com")]),
        (1, vec![SourceEntry::new("[Academic] Paper A (dup)", "a.com")]),
    ];
    let bibliography = aggregate(chapters).unwrap();

    assert_eq!(bibliography.academic, vec![item("Paper A", "a.com", 0)]);
    assert!(bibliography.web.is_empty());
}

#[test]
fn test_categorization_by_title_prefix() {
    let chapters = vec![(
        0,
        vec![
            SourceEntry::new("[Academic] Foo", "https://doi.org/10.1000/foo"),
            SourceEntry::new("Foo", "https://example.com/foo"),
        ],
    )];
    let bibliography = aggregate(chapters).unwrap();

    assert_eq!(bibliography.academic, vec![item("Foo", "https://doi.org/10.1000/foo", 0)]);
    assert_eq!(bibliography.web, vec![item("Foo", "https://example.com/foo", 0)]);
}

#[test]
fn test_prefix_requires_trailing_space() {
    let entry = SourceEntry::new("[Academic]Foo", "https://example.com/x");
    assert!(!entry.is_academic());
    assert_eq!(entry.display_title(), "[Academic]Foo");

    let bibliography = aggregate(vec![(0, vec![entry])]).unwrap();
    assert_eq!(bibliography.web.len(), 1);
    assert_eq!(bibliography.web[0].title, "[Academic]Foo");
}

#[test]
fn test_duplicate_across_categories_appears_once() {
    let chapters = vec![
        (0, vec![SourceEntry::new("Blog post", "https://example.com/p")]),
        (1, vec![SourceEntry::new("[Academic] Same link as paper", "https://example.com/p")]),
    ];
    let bibliography = aggregate(chapters).unwrap();

    assert_eq!(bibliography.len(), 1);
    assert!(bibliography.academic.is_empty());
    assert_eq!(bibliography.web[0].title, "Blog post");
}

#[test]
fn test_urls_are_compared_exactly() {
    let chapters = vec![(
        0,
        vec![
            SourceEntry::new("One", "https://example.com"),
            SourceEntry::new("Two", "https://example.com/"),
            SourceEntry::new("Three", "http://example.com"),
            SourceEntry::new("Four", "https://example.com"),
        ],
    )];
    let bibliography = aggregate(chapters).unwrap();

    let titles: Vec<&str> = bibliography.web.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two", "Three"]);
}

#[test]
fn test_chapters_are_visited_in_index_order() {
    let chapters = vec![
        (2, vec![SourceEntry::new("Late", "https://shared.example")]),
        (0, vec![SourceEntry::new("Early", "https://shared.example")]),
        (1, vec![SourceEntry::new("Middle", "https://middle.example")]),
    ];
    let bibliography = aggregate(chapters).unwrap();

    assert_eq!(
        bibliography.web,
        vec![item("Early", "https://shared.example", 0), item("Middle", "https://middle.example", 1)]
    );
}

#[test]
fn test_entry_order_within_chapter_is_kept() {
    let chapters = vec![(
        0,
        vec![
            SourceEntry::new("[Academic] Z", "z.org"),
            SourceEntry::new("[Academic] A", "a.org"),
            SourceEntry::new("[Academic] M", "m.org"),
        ],
    )];
    let bibliography = aggregate(chapters).unwrap();
    let titles: Vec<&str> = bibliography.academic.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Z", "A", "M"]);
}

#[test]
fn test_missing_url_is_rejected() {
    let chapters = vec![
        (0, vec![SourceEntry::new("Fine", "https://ok.example")]),
        (1, vec![SourceEntry::new("Good", "https://good.example"), SourceEntry::new("No link", "  ")]),
    ];
    let err = aggregate(chapters).unwrap_err();
    match err {
        CiteAuditError::MalformedSourceEntry { chapter, position, field } => {
            assert_eq!(chapter, 1);
            assert_eq!(position, 1);
            assert_eq!(field, "url");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_title_is_rejected() {
    let chapters = vec![(0, vec![SourceEntry::new("[Academic] ", "https://doi.org/x")])];
    assert!(matches!(
        aggregate(chapters),
        Err(CiteAuditError::MalformedSourceEntry { field: "title", .. })
    ));
}

#[test]
fn test_missing_fields_deserialize_as_blank_and_are_rejected() {
    let sources: Vec<SourceEntry> = serde_json::from_str(r#"[{"url": "https://example.com"}]"#).unwrap();
    assert_eq!(sources[0].title, "");
    assert!(aggregate(vec![(0, sources)]).is_err());
}

#[test]
fn test_markdown_rendering() {
    let chapters = vec![
        (
            0,
            vec![
                SourceEntry::new("[Academic] Paper A", "https://doi.org/a"),
                SourceEntry::new("News", "https://news.example/1"),
            ],
        ),
        (1, vec![SourceEntry::new("[Academic] Paper B", "https://doi.org/b")]),
    ];
    let bibliography = aggregate(chapters).unwrap();

    let expected = "\n## Academic Bibliography\n\n\
1. **Paper A**  \n   Link: https://doi.org/a\n\n\
2. **Paper B**  \n   Link: https://doi.org/b\n\n\
\n## Web References\n\n\
1. [News](https://news.example/1)\n";
    assert_eq!(bibliography.to_markdown(), expected);
}

#[test]
fn test_markdown_web_only() {
    let bibliography = aggregate(vec![(0, vec![SourceEntry::new("Site", "https://site.example")])]).unwrap();
    assert_eq!(
        bibliography.to_markdown(),
        "\n## Web References\n\n1. [Site](https://site.example)\n"
    );
}

#[test]
fn test_empty_bibliography_renders_placeholder() {
    let bibliography = aggregate(Vec::<(usize, Vec<SourceEntry>)>::new()).unwrap();
    assert!(bibliography.is_empty());
    assert_eq!(bibliography, AggregatedBibliography::default());

    let markdown = bibliography.to_markdown();
    assert_eq!(markdown, "\n## Bibliography\n\nNo external sources identified.\n");
    assert!(!markdown.contains("Academic Bibliography"));
    assert!(!markdown.contains("Web References"));
}
