use std::sync::Once;

use pretty_assertions::assert_eq;
use spider_engine::{
    ExtractedTable, MarkError, MarkScope, Page, ParsedTable, TableError, TableOptions, TableParser,
    LINKS_COLUMN,
};

static INIT: Once = Once::new();

const URL: &str = "http://example.com/list#top";

const TWO_TABLES: &str = r##"<html><body>
<table>
  <thead><tr><th>Name</th><th>Refs</th></tr></thead>
  <tbody>
    <tr><td>Alpha</td><td><a href="/one">One</a>, <a href="#two">Two</a></td></tr>
    <tr><td>Beta</td><td>none</td></tr>
  </tbody>
</table>
<table>
  <tr><th>Refs</th><th>Name</th></tr>
  <tr><td><a href="//cdn.example.org/y">Y</a></td><td>Gamma</td></tr>
</table>
<table>
  <tr><th>Other</th></tr>
  <tr><td>Delta</td></tr>
</table>
</body></html>"##;

fn page(html: &str) -> Page {
    INIT.call_once(spider_logging::initialize_for_tests);
    Page::from_html(URL, html).expect("valid page url")
}

fn table(columns: &[&str], rows: &[&[&str]]) -> ExtractedTable {
    ExtractedTable::new(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect(),
    )
}

#[test]
fn cell_links_move_to_links_column_in_document_order() {
    let mut page = page(TWO_TABLES);
    let extraction = page.tables(&TableOptions::default()).unwrap();

    assert_eq!(extraction.tables.len(), 3);
    assert_eq!(
        extraction.tables[0],
        table(
            &["Name", "Refs", LINKS_COLUMN],
            &[
                &[
                    "Alpha",
                    "One, Two",
                    "http://example.com/one\nhttp://example.com/list#two"
                ],
                &["Beta", "none", ""],
            ],
        )
    );
    assert_eq!(
        extraction.tables[1],
        table(
            &["Refs", "Name", LINKS_COLUMN],
            &[&["Y", "Gamma", "http://cdn.example.org/y"]],
        )
    );
}

#[test]
fn tables_with_same_column_set_merge() {
    let mut page = page(TWO_TABLES);
    let extraction = page.tables(&TableOptions::default()).unwrap();

    assert_eq!(extraction.merged.len(), 2);
    assert_eq!(
        extraction.merged[0],
        table(
            &["Name", "Refs", LINKS_COLUMN],
            &[
                &[
                    "Alpha",
                    "One, Two",
                    "http://example.com/one\nhttp://example.com/list#two"
                ],
                &["Beta", "none", ""],
                &["Gamma", "Y", "http://cdn.example.org/y"],
            ],
        )
    );
    assert_eq!(
        extraction.merged[1],
        table(&["Other", LINKS_COLUMN], &[&["Delta", ""]])
    );
    assert!(extraction.unmergeable.is_empty());
}

#[test]
fn merge_disabled_leaves_merged_empty() {
    let mut page = page(TWO_TABLES);
    let options = TableOptions {
        merge: false,
        ..TableOptions::default()
    };
    let extraction = page.tables(&options).unwrap();
    assert_eq!(extraction.tables.len(), 3);
    assert!(extraction.merged.is_empty());
}

#[test]
fn without_separation_cells_keep_encoded_links() {
    let mut page = page(TWO_TABLES);
    let options = TableOptions {
        href_separate: false,
        merge: false,
        edit_in_place: false,
        ..TableOptions::default()
    };
    let extraction = page.tables(&options).unwrap();
    assert_eq!(
        extraction.tables[1],
        table(&["Refs", "Name"], &[&["Y(hrefhttp://cdn.example.org/yhref)", "Gamma"]])
    );
}

#[test]
fn without_marking_links_are_lost() {
    let mut page = page(TWO_TABLES);
    let options = TableOptions {
        href: false,
        ..TableOptions::default()
    };
    let extraction = page.tables(&options).unwrap();
    assert_eq!(extraction.tables[0].column(LINKS_COLUMN), Some(vec!["", ""]));
    assert_eq!(extraction.tables[0].column("Refs"), Some(vec!["One, Two", "none"]));
}

#[test]
fn in_place_marking_changes_the_page_document() {
    let mut page = page(TWO_TABLES);
    page.tables(&TableOptions::default()).unwrap();
    assert!(page.document().html().contains("One(hrefhttp://example.com/onehref)"));

    // A second in-place pass would double-encode, so it is refused.
    let err = page.tables(&TableOptions::default()).unwrap_err();
    assert_eq!(
        err,
        TableError::Mark(MarkError::DelimiterCollision {
            token: "(href".to_string()
        })
    );
}

#[test]
fn copy_marking_keeps_the_page_document() {
    let mut page = page(TWO_TABLES);
    let before = page.document().html();
    let options = TableOptions {
        edit_in_place: false,
        ..TableOptions::default()
    };
    let first = page.tables(&options).unwrap();
    let second = page.tables(&options).unwrap();

    assert_eq!(page.document().html(), before);
    assert_eq!(first, second);
}

#[test]
fn page_without_tables_yields_empty_extraction() {
    let mut page = page("<p>No tables here</p>");
    let extraction = page.tables(&TableOptions::default()).unwrap();
    assert!(extraction.tables.is_empty());
    assert!(extraction.merged.is_empty());
    assert!(extraction.unmergeable.is_empty());
}

#[test]
fn table_failure_does_not_block_lists() {
    let html = r#"<table><tr><td>says (href <a href="/t">T</a></td></tr></table>
<ul><li><a href="/l">L</a></li></ul>"#;
    let mut page = page(html);

    assert!(page.tables(&TableOptions::default()).is_err());
    let lists = page.lists(&Default::default()).unwrap();
    assert_eq!(lists[0].items[0].hrefs, "http://example.com/l");
}

#[test]
fn delimiter_in_row_header_is_a_collision() {
    let html = r#"<table>
  <tr><th>Key</th><th>Site</th></tr>
  <tr><th>see (href x</th><td><a href="/a">A</a></td></tr>
</table>"#;
    let mut page = page(html);
    let options = TableOptions {
        edit_in_place: false,
        ..TableOptions::default()
    };
    let err = page.tables(&options).unwrap_err();
    assert_eq!(
        err,
        TableError::Mark(MarkError::DelimiterCollision {
            token: "(href".to_string()
        })
    );
}

#[test]
fn separating_unmarked_tables_still_checks_delimiters() {
    let html = r#"<table><tr><th>Note</th></tr><tr><td>ends with href)</td></tr></table>"#;
    let mut page = page(html);
    let options = TableOptions {
        href: false,
        ..TableOptions::default()
    };
    let err = page.tables(&options).unwrap_err();
    assert_eq!(
        err,
        TableError::Mark(MarkError::DelimiterCollision {
            token: "href)".to_string()
        })
    );
}

#[test]
fn headerless_tables_are_not_merged() {
    let html = r#"<table><tr><td>nav</td><td>menu</td></tr></table>
<table><tr><td>Price</td><td>3</td></tr></table>"#;
    let mut page = page(html);
    let extraction = page.tables(&TableOptions::default()).unwrap();

    assert_eq!(extraction.tables.len(), 2);
    assert!(extraction.tables.iter().all(|t| t.positional));
    assert!(extraction.merged.is_empty());
    assert_eq!(extraction.unmergeable, extraction.tables);
    assert_eq!(extraction.unmergeable[1].column("0"), Some(vec!["Price"]));
}

#[test]
fn in_place_tables_leave_later_copies_unmarked() {
    let html = r#"<table><tr><td><ul><li><a href="/a">A</a></li></ul></td></tr></table>"#;
    let mut page = page(html);
    page.tables(&TableOptions::default()).unwrap();
    assert!(page.document().html().contains("(href"));

    let lists = page.lists(&Default::default()).unwrap();
    assert_eq!(lists[0].items[0].text, "A");
    assert_eq!(lists[0].items[0].hrefs, "http://example.com/a");

    let (copy, report) = page.mark_links(&MarkScope::All).unwrap();
    assert_eq!(report.marked, 1);
    assert!(copy.html().contains("A(hrefhttp://example.com/ahref)"));
}

struct FixedParser;

impl TableParser for FixedParser {
    fn parse(&self, _markup: &str) -> Vec<ParsedTable> {
        vec![ParsedTable {
            columns: vec!["A".into(), "B".into()],
            rows: vec![vec![Some("a(hrefhttp://x/1href)".into()), None]],
            positional: false,
        }]
    }
}

#[test]
fn custom_parser_output_is_normalized() {
    let mut page = page("<p>ignored</p>");
    let extraction = page.tables_with(&TableOptions::default(), &FixedParser).unwrap();
    assert_eq!(
        extraction.tables,
        vec![table(&["A", "B", LINKS_COLUMN], &[&["a", "", "http://x/1"]])]
    );
}

#[test]
fn marked_copy_is_returned_to_the_caller() {
    let page = page(TWO_TABLES);
    let (copy, report) = page.mark_links(&MarkScope::tags(["td"])).unwrap();
    assert_eq!(report.marked, 3);
    assert!(copy.html().contains("Two(hrefhttp://example.com/list#twohref)"));
    assert!(!page.document().html().contains("(href"));
}
