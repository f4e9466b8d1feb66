use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use spider_logging::{spider_debug, spider_info};

use crate::codec::MarkerCodec;
use crate::href::PageContext;
use crate::marker::{check_collisions, mark_links, MarkError, MarkScope};
use crate::table_parser::TableParser;

/// Column that receives the links recovered from each row.
pub const LINKS_COLUMN: &str = "Links";

/// Stand-in for newline/tab runs while table markup passes through the parser.
pub const DEFAULT_SENTINEL: char = 'Ǟ';

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector is valid"));

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n\t]+").expect("line break regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Group tables sharing a column set into one table per group.
    pub merge: bool,
    /// Mark `td` anchors before parsing so their links survive.
    pub href: bool,
    /// Move recovered links into a `Links` column and strip them from cells.
    pub href_separate: bool,
    /// Mark the page's own document instead of a copy.
    pub edit_in_place: bool,
    pub whitespace_sentinel: char,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            merge: true,
            href: true,
            href_separate: true,
            edit_in_place: true,
            whitespace_sentinel: DEFAULT_SENTINEL,
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("marking table links failed: {0}")]
    Mark(#[from] MarkError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Headerless table with numbered columns; never merged.
    #[serde(skip)]
    pub positional: bool,
}

impl ExtractedTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            columns,
            rows,
            positional: false,
        }
    }

    /// A headerless table whose column names are only positions.
    pub fn positional(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            positional: true,
            ..Self::new(columns, rows)
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Values of the first column called `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }

    /// One JSON object per row, keyed by column name.
    pub fn to_records(&self) -> Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), Value::String(value.clone())))
                    .collect();
                Value::Object(record)
            })
            .collect();
        Value::Array(records)
    }

    /// Sorted column names joined with `||`; `None` when a name repeats or
    /// the columns are positional.
    pub fn column_set_key(&self) -> Option<String> {
        if self.positional {
            return None;
        }
        let mut names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        names.sort_unstable();
        if names.windows(2).any(|pair| pair[0] == pair[1]) {
            return None;
        }
        Some(names.join("||"))
    }

    /// Append `other`'s rows, reordering its cells to this table's column order.
    fn append_aligned(&mut self, other: &ExtractedTable) {
        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|column| other.column_index(column))
            .collect();
        for row in &other.rows {
            let aligned = mapping
                .iter()
                .map(|idx| idx.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                .collect();
            self.rows.push(aligned);
        }
    }

    /// Fill a `Links` column from the encoded links in each row and strip the
    /// encodings from every other cell.
    pub fn separate_links(&mut self, codec: &MarkerCodec) {
        let existing = self.column_index(LINKS_COLUMN);
        let links_idx = existing.unwrap_or_else(|| {
            self.columns.push(LINKS_COLUMN.to_string());
            self.columns.len() - 1
        });

        for row in &mut self.rows {
            let joined: String = row
                .iter()
                .enumerate()
                .filter(|(idx, _)| Some(*idx) != existing)
                .map(|(_, value)| value.as_str())
                .collect();
            let links = codec.extract_all(&joined).join("\n");
            for cell in row.iter_mut() {
                *cell = codec.strip(cell);
            }
            if row.len() <= links_idx {
                row.resize(links_idx + 1, String::new());
            }
            row[links_idx] = links;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableExtraction {
    /// Every table, in document order.
    pub tables: Vec<ExtractedTable>,
    /// One table per distinct column set, in order of first appearance.
    pub merged: Vec<ExtractedTable>,
    /// Tables whose column set could not be computed.
    pub unmergeable: Vec<ExtractedTable>,
}

/// Extract every table of `doc`, marking `td` links first when asked to.
///
/// Any delimiter already present in table text, `th` cells included, is a
/// collision whenever links are marked or separated. `doc` is mutated by the
/// marking step; pass a clone to keep the original.
pub fn extract_tables(
    doc: &mut Html,
    ctx: &PageContext,
    options: &TableOptions,
    codec: &MarkerCodec,
    parser: &dyn TableParser,
) -> Result<TableExtraction, TableError> {
    if options.href || options.href_separate {
        check_collisions(doc, &MarkScope::tags(["table"]), codec)?;
    }
    if options.href {
        mark_links(doc, &MarkScope::tags(["td"]), ctx, codec)?;
    }

    let markup = serialize_tables(doc, options.whitespace_sentinel);
    let mut tables: Vec<ExtractedTable> = parser
        .parse(&markup)
        .into_iter()
        .map(|parsed| {
            let rows = parsed
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
                .collect();
            ExtractedTable {
                columns: parsed.columns,
                rows,
                positional: parsed.positional,
            }
        })
        .collect();
    spider_info!("parsed {} tables from {}", tables.len(), ctx.url);

    if options.href_separate {
        for table in &mut tables {
            table.separate_links(codec);
        }
    }

    let (merged, unmergeable) = if options.merge {
        merge_tables(&tables)
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(TableExtraction {
        tables,
        merged,
        unmergeable,
    })
}

/// Outer tables serialized back to back, with newline/tab runs replaced by `sentinel`.
fn serialize_tables(doc: &Html, sentinel: char) -> String {
    let markup: String = doc
        .select(&TABLE_SELECTOR)
        .filter(|table| !has_table_ancestor(*table))
        .map(|table| table.html())
        .collect();
    LINE_BREAKS
        .replace_all(&markup, sentinel.to_string().as_str())
        .into_owned()
}

fn has_table_ancestor(table: ElementRef<'_>) -> bool {
    table
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "table")
}

/// Concatenate tables sharing a column set. Returns `(merged, unmergeable)`.
pub fn merge_tables(tables: &[ExtractedTable]) -> (Vec<ExtractedTable>, Vec<ExtractedTable>) {
    let mut merged: Vec<ExtractedTable> = Vec::new();
    let mut groups: HashMap<String, usize> = HashMap::new();
    let mut unmergeable = Vec::new();

    for table in tables {
        let Some(key) = table.column_set_key() else {
            spider_debug!("table with columns {:?} cannot be merged", table.columns);
            unmergeable.push(table.clone());
            continue;
        };
        match groups.get(&key) {
            Some(&idx) => merged[idx].append_aligned(table),
            None => {
                groups.insert(key, merged.len());
                merged.push(table.clone());
            }
        }
    }

    spider_debug!(
        "merged {} tables into {} groups ({} unmergeable)",
        tables.len(),
        merged.len(),
        unmergeable.len()
    );
    (merged, unmergeable)
}
