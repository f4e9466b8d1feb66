//! Turns table markup into column/row records.
//!
//! Header rows come from `<thead>`, or failing that from leading rows made
//! only of `<th>` cells. Tables without a header get positional column names
//! (`"0"`, `"1"`, ...). `colspan` and `rowspan` repeat the cell text into
//! every slot they cover.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::tables::DEFAULT_SENTINEL;

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector is valid"));

/// Upper bound for `colspan`/`rowspan` values; larger values are clamped.
const MAX_SPAN: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    /// `None` marks a slot no cell covered.
    pub rows: Vec<Vec<Option<String>>>,
    /// Columns are numbered rather than named; the table had no header.
    pub positional: bool,
}

pub trait TableParser: Send + Sync {
    /// Every table found in `markup`, in document order. Finding none is not an error.
    fn parse(&self, markup: &str) -> Vec<ParsedTable>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlTableParser {
    sentinel: char,
}

impl HtmlTableParser {
    /// `sentinel` stands in for newline/tab runs in the markup and reads back as a space.
    pub fn with_sentinel(sentinel: char) -> Self {
        Self { sentinel }
    }

    fn cell_text(&self, cell: ElementRef<'_>) -> String {
        let raw: String = cell
            .text()
            .map(|chunk| chunk.replace(self.sentinel, " "))
            .collect();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn parse_table(&self, table: ElementRef<'_>) -> Option<ParsedTable> {
        let sections = TableRows::collect(table);
        let mut head = sections.head;
        let mut body = sections.body;
        if head.is_empty() {
            let leading = body.iter().take_while(|row| is_header_row(**row)).count();
            head = body.drain(..leading).collect();
        }
        if head.is_empty() && body.is_empty() {
            return None;
        }

        let head_grid = self.expand(&head);
        let body_grid = self.expand(&body);
        let width = head_grid
            .iter()
            .chain(body_grid.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let positional = head_grid.is_empty();
        let columns = if positional {
            (0..width).map(|i| i.to_string()).collect()
        } else {
            header_labels(&head_grid, width)
        };
        let rows = body_grid
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        Some(ParsedTable {
            columns,
            rows,
            positional,
        })
    }

    /// Lay rows out on a grid, carrying `rowspan` cells down into later rows.
    fn expand(&self, rows: &[ElementRef<'_>]) -> Vec<Vec<Option<String>>> {
        let mut carry: BTreeMap<usize, (usize, String)> = BTreeMap::new();
        let mut grid = Vec::with_capacity(rows.len());

        for row in rows {
            let mut cells = row_cells(*row).into_iter();
            let mut out: Vec<Option<String>> = Vec::new();
            let mut col = 0;
            loop {
                if let Some((remaining, text)) = carry.remove(&col) {
                    if remaining > 1 {
                        carry.insert(col, (remaining - 1, text.clone()));
                    }
                    out.push(Some(text));
                    col += 1;
                    continue;
                }
                if let Some(cell) = cells.next() {
                    let text = self.cell_text(cell);
                    let colspan = span_attr(cell, "colspan");
                    let rowspan = span_attr(cell, "rowspan");
                    for _ in 0..colspan {
                        // An overlapped rowspan still uses up this row.
                        if let Some((remaining, carried)) = carry.remove(&col) {
                            if remaining > 1 {
                                carry.insert(col, (remaining - 1, carried));
                            }
                        }
                        if rowspan > 1 {
                            carry.insert(col, (rowspan - 1, text.clone()));
                        }
                        out.push(Some(text.clone()));
                        col += 1;
                    }
                    continue;
                }
                match carry.range(col..).next().map(|(next, _)| *next) {
                    Some(next) => {
                        out.resize(next, None);
                        col = next;
                    }
                    None => break,
                }
            }
            grid.push(out);
        }

        grid
    }
}

impl Default for HtmlTableParser {
    fn default() -> Self {
        Self::with_sentinel(DEFAULT_SENTINEL)
    }
}

impl TableParser for HtmlTableParser {
    fn parse(&self, markup: &str) -> Vec<ParsedTable> {
        let fragment = Html::parse_fragment(markup);
        fragment
            .select(&TABLE_SELECTOR)
            .filter_map(|table| self.parse_table(table))
            .collect()
    }
}

/// Rows that belong to this table, not to tables nested in its cells.
struct TableRows<'a> {
    head: Vec<ElementRef<'a>>,
    body: Vec<ElementRef<'a>>,
}

impl<'a> TableRows<'a> {
    fn collect(table: ElementRef<'a>) -> Self {
        let mut head = Vec::new();
        let mut body = Vec::new();
        let mut foot = Vec::new();
        for child in table.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "thead" => head.extend(child_rows(child)),
                "tbody" => body.extend(child_rows(child)),
                "tfoot" => foot.extend(child_rows(child)),
                "tr" => body.push(child),
                _ => {}
            }
        }
        body.extend(foot);
        Self { head, body }
    }
}

fn child_rows(section: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    section
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
}

fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

fn is_header_row(row: ElementRef<'_>) -> bool {
    let cells = row_cells(row);
    !cells.is_empty() && cells.iter().all(|cell| cell.value().name() == "th")
}

fn span_attr(cell: ElementRef<'_>, name: &str) -> usize {
    cell.value()
        .attr(name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// One label per column; stacked header rows are joined with a space.
fn header_labels(head: &[Vec<Option<String>>], width: usize) -> Vec<String> {
    (0..width)
        .map(|col| {
            let mut parts: Vec<&str> = Vec::new();
            for row in head {
                if let Some(Some(label)) = row.get(col) {
                    if !label.is_empty() && parts.last() != Some(&label.as_str()) {
                        parts.push(label);
                    }
                }
            }
            if parts.is_empty() {
                format!("Unnamed: {col}")
            } else {
                parts.join(" ")
            }
        })
        .collect()
}
