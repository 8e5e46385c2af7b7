//! End-to-end ranking behavior through the in-memory backend.

#![allow(clippy::tests_outside_test_module)]

use std::fs;

use docsearch_index::{
    BackendError, Document, Encoder, HighlightOptions, MemoryBackend, SearchError,
    SearchOptions, SearchResponse, Searcher,
};
use docsearch_query::QueryString;
use serde_json::{Value, json};

const INDEX: &str = "cake-docs-test-en";

fn documents(records: Value) -> Vec<Document> {
    serde_json::from_value(records).unwrap()
}

fn searcher(records: Value) -> Searcher<MemoryBackend> {
    let mut backend = MemoryBackend::new();
    backend.insert_index(INDEX, documents(records)).unwrap();
    Searcher::new(backend)
}

fn search(searcher: &Searcher<MemoryBackend>, q: &str, options: &SearchOptions) -> SearchResponse {
    searcher
        .search(INDEX, &QueryString::new(q), options)
        .unwrap()
}

fn urls(response: &SearchResponse) -> Vec<&str> {
    response.data.iter().map(|r| r.url.as_str()).collect()
}

fn section(
    url: &str,
    level: u32,
    max_level: u32,
    position: u32,
    max_position: u32,
    hierarchy: &[&str],
    contents: &str,
) -> Value {
    let page_url = url.split('#').next().unwrap_or(url);
    json!({
        "type": "internal",
        "priority": "normal",
        "url": url,
        "page_url": page_url,
        "level": level,
        "max_level": max_level,
        "position": position,
        "max_position": max_position,
        "hierarchy": hierarchy,
        "title": hierarchy.last().copied().unwrap_or_default(),
        "contents": contents,
    })
}

fn external(url: &str, title: &str) -> Value {
    json!({
        "type": "external",
        "priority": "normal",
        "url": url,
        "page_url": url,
        "level": 0,
        "max_level": 0,
        "position": 0,
        "max_position": 0,
        "hierarchy": [title],
        "title": title,
        "contents": null,
    })
}

/// Two documentation pages with nested sections, two low priority pages and three
/// external links: eight distinct pages in total.
fn reference_docs() -> Value {
    let mut low = section(
        "/test/1/appendices.html#appendices",
        0,
        0,
        0,
        0,
        &["Appendices"],
        "Appendices root section content.",
    );
    low["priority"] = json!("low");
    let mut low_nested = section(
        "/test/1/appendices/low-priority.html#low-priority",
        0,
        0,
        0,
        0,
        &["Appendices", "Low Priority"],
        "Low priority root section content.",
    );
    low_nested["priority"] = json!("low");

    json!([
        section(
            "/test/1/test.html#test",
            0, 2, 0, 3,
            &["Test"],
            "class Foo\\Bar\\Baz Test root section content.",
        ),
        section(
            "/test/1/test.html#level-1-subsection-1-title",
            1, 2, 1, 3,
            &["Test", "Level 1 Subsection 1 <b>Title</b>"],
            "Foo\\Bar\\Baz::method(string $argument) $argument - Method argument description. \
             Level 1 subsection 1 <b>content</b>: $foo = new \\Foo\\Bar\\Baz(); \
             $value = $foo->method('argument'); Lorem ipsum, method('argument') dolor sit amet: \
             <method value=\"argument\" /> Admonition content",
        ),
        section(
            "/test/1/test.html#level-2-subsection-1-title",
            2, 2, 2, 3,
            &["Test", "Level 1 Subsection 1 Title", "Level 2 Subsection 1 Title"],
            "Level 2 subsection 1 content.",
        ),
        section(
            "/test/1/test.html#level-1-subsection-2-title",
            1, 2, 3, 3,
            &["Test", "Level 1 Subsection 2 Title"],
            "Level 1 subsection 2 content.",
        ),
        section(
            "/test/1/test/nested.html#nested",
            0, 1, 0, 1,
            &["Test", "Nested"],
            "Nested root section content.",
        ),
        section(
            "/test/1/test/nested.html#level-1-subsection-1-title",
            1, 1, 1, 1,
            &["Test", "Nested", "Level 1 Subsection 1 Title"],
            "Level 1 subsection 1 content.",
        ),
        section("/test/1/more.html#more", 0, 0, 0, 0, &["More"], "More root section content."),
        low,
        low_nested,
        external("https://example.com/foo", "Foo"),
        external("https://example.com/bar", "Bar"),
        external("https://example.com/baz", "Baz"),
    ])
}

#[test]
fn root_sections_are_preferred() {
    let searcher = searcher(json!([
        section("/test/1/term.html#term", 0, 2, 0, 2, &["Term"], "Term root section content."),
        section(
            "/test/1/term.html#nested-term",
            1, 2, 1, 2,
            &["Term", "Nested Term"],
            "Nested term section content.",
        ),
        section(
            "/test/1/term.html#deeper-nested-term",
            2, 2, 2, 2,
            &["Term", "Nested Term", "More Term Repetitions For Deeper Nested Term"],
            "Deeper nested term section content.",
        ),
    ]));

    let response = search(&searcher, "term", &SearchOptions::default());
    assert_eq!(urls(&response), ["/test/1/term.html#term"]);
}

#[test]
fn earlier_sections_are_preferred() {
    let mut records = Vec::new();
    for position in 0..3 {
        let mut record = section(
            &format!("/test/1/term.html#term-position-{position}"),
            0, 0, position, 2,
            &["Term"],
            &format!("Term section position {position} content."),
        );
        let repeated = "Term ".repeat(position as usize + 1);
        record["title"] = json!(format!("{repeated}Position {position}"));
        records.push(record);
    }

    let response = search(&searcher(Value::Array(records)), "term", &SearchOptions::default());
    assert_eq!(urls(&response), ["/test/1/term.html#term-position-0"]);
}

#[test]
fn low_priority_is_deboosted() {
    let mut low = section(
        "/test/1/term-low-priority.html#term",
        0, 0, 0, 0,
        &["Term"],
        "Term root section content.",
    );
    low["priority"] = json!("low");
    let searcher = searcher(json!([
        low,
        section(
            "/test/1/term-low-quality.html#low-quality",
            0, 0, 0, 0,
            &["Low Quality"],
            "Low quality root section content mentioning the term.",
        ),
    ]));

    let response = search(&searcher, "term", &SearchOptions::default());
    assert_eq!(
        urls(&response),
        [
            "/test/1/term-low-quality.html#low-quality",
            "/test/1/term-low-priority.html#term",
        ]
    );
}

#[test]
fn partial_words_match_and_highlight() {
    let searcher = searcher(reference_docs());
    let response = search(&searcher, "subse", &SearchOptions::default());

    assert_eq!(
        urls(&response),
        [
            "/test/1/test.html#level-1-subsection-1-title",
            "/test/1/test/nested.html#level-1-subsection-1-title",
        ]
    );

    let first = &response.data[0].highlights;
    assert_eq!(first.contents.len(), 1);
    assert!(first.contents[0].contains("{{subsection}} 1 <b>content</b"));
    assert_eq!(
        first.hierarchy,
        ["Test", "Level 1 {{Subsection}} 1 <b>Title</b>"]
    );

    let second = &response.data[1].highlights;
    assert_eq!(second.contents, ["Level 1 {{subsection}} 1 content"]);
    assert_eq!(second.hierarchy[2], "Level 1 {{Subsection}} 1 Title");
}

#[test]
fn typos_match_fuzzily() {
    let searcher = searcher(reference_docs());
    let response = search(&searcher, "tset", &SearchOptions::default());

    assert_eq!(
        urls(&response),
        ["/test/1/test.html#test", "/test/1/test/nested.html#nested"]
    );
    assert_eq!(response.data[0].highlights.hierarchy[0], "{{Test}}");
    assert_eq!(response.data[1].highlights.hierarchy[0], "{{Test}}");
    assert!(response.data[0].highlights.contents.is_empty());
}

#[test]
fn page_is_clamped_to_result_window() {
    let searcher = searcher(reference_docs());
    let options = SearchOptions {
        page: 2000,
        ..SearchOptions::default()
    };

    let response = search(&searcher, "subsection", &options);
    assert_eq!(response.page, 1000);
    assert!(response.data.is_empty());
    assert_eq!(response.total, 2);
}

#[test]
fn limit_is_clamped() {
    let mut records = Vec::new();
    for i in 0..120 {
        records.push(section(
            &format!("/test/1/test-{i}.html#limit-{i}"),
            0, 0, i, 120,
            &[format!("Title {i}").as_str()],
            &format!("Contents {i}"),
        ));
    }
    let searcher = searcher(Value::Array(records));
    let options = SearchOptions {
        limit: 2000,
        ..SearchOptions::default()
    };

    let response = search(&searcher, "-non_existent_term_to_find_everything", &options);
    assert_eq!(response.total, 120);
    assert_eq!(response.data.len(), 100);
}

#[test]
fn empty_result_reports_terms() {
    let searcher = searcher(reference_docs());
    let response = search(&searcher, "non_existent_term", &SearchOptions::default());

    assert_eq!(response.page, 1);
    assert_eq!(response.total, 0);
    assert!(response.data.is_empty());
    assert_eq!(response.terms, ["non_existent_term"]);
}

#[test]
fn results_collapse_by_page() {
    let searcher = searcher(reference_docs());
    let options = SearchOptions {
        limit: 100,
        ..SearchOptions::default()
    };

    let response = search(&searcher, "-non_existent_term_to_find_everything", &options);
    assert_eq!(response.total, 8);
    assert_eq!(response.data.len(), 8);

    let mut pages: Vec<&str> = response.data.iter().map(|r| r.page_url.as_str()).collect();
    pages.sort_unstable();
    pages.dedup();
    assert_eq!(pages.len(), 8);
}

#[test]
fn pages_are_disjoint_windows() {
    let searcher = searcher(reference_docs());
    let everything = "-non_existent_term_to_find_everything";
    let page = |page| SearchOptions {
        page,
        limit: 2,
        ..SearchOptions::default()
    };

    let pages: Vec<SearchResponse> = (1..=4).map(|p| search(&searcher, everything, &page(p))).collect();
    assert!(pages.iter().all(|r| r.data.len() == 2 && r.total == 8));

    let mut all: Vec<&str> = pages.iter().flat_map(urls).collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 8);

    let beyond = search(&searcher, everything, &page(5));
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.page, 5);
    assert_eq!(beyond.total, 8);
}

#[test]
fn external_results_show_their_url() {
    let searcher = searcher(reference_docs());
    let response = search(&searcher, "bar", &SearchOptions::default());

    let link = response
        .data
        .iter()
        .find(|r| r.url == "https://example.com/bar")
        .unwrap();
    assert_eq!(link.contents, "https://example.com/bar");
    assert_eq!(link.highlights.hierarchy, ["{{Bar}}"]);
}

#[test]
fn html_encoder_escapes_plain_fields_and_highlights() {
    let searcher = searcher(reference_docs());
    let options = SearchOptions {
        highlight: HighlightOptions {
            pre_tag: "<em>".into(),
            post_tag: "</em>".into(),
            encoder: Encoder::Html,
        },
        ..SearchOptions::default()
    };

    let response = search(&searcher, "subsection", &options);
    let first = &response.data[0];
    assert_eq!(first.url, "/test/1/test.html#level-1-subsection-1-title");
    assert_eq!(first.hierarchy[1], "Level 1 Subsection 1 &lt;b&gt;Title&lt;/b&gt;");
    assert_eq!(
        first.highlights.hierarchy,
        [
            "Test",
            "Level 1 <em>Subsection</em> 1 &lt;b&gt;Title&lt;/b&gt;",
        ]
    );
    assert!(first.contents.contains("&lt;b&gt;content&lt;/b&gt;"));
}

#[test]
fn unknown_index_is_a_backend_error() {
    let searcher = Searcher::new(MemoryBackend::new());
    let err = searcher
        .search("cake-docs-9-xx", &QueryString::new("views"), &SearchOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Backend(BackendError::IndexNotFound(_))
    ));
}

#[test]
fn corpus_directory_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(format!("{INDEX}.json")),
        serde_json::to_string(&reference_docs()).unwrap(),
    )
    .unwrap();

    let searcher = Searcher::new(MemoryBackend::from_dir(dir.path()).unwrap());
    let response = search(&searcher, "nested", &SearchOptions::default());
    assert_eq!(response.data[0].url, "/test/1/test/nested.html#nested");
}
