use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{json, Value};
use spider_logging::spider_info;

use crate::codec::MarkerCodec;
use crate::href::PageContext;
use crate::marker::{mark_links, MarkError, MarkScope};

static LIST_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ol, ul").expect("list selector is valid"));

static ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("item selector is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Mark `ol`/`ul` anchors before reading item text.
    pub href: bool,
    /// Mark the page's own document instead of a copy.
    pub edit_in_place: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            href: true,
            edit_in_place: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub text: String,
    /// Newline-joined resolved links, in document order.
    pub hrefs: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedList {
    pub items: Vec<ListItem>,
}

impl ExtractedList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `[{"Text": ..., "Hrefs": ...}, ...]`
    pub fn to_records(&self) -> Value {
        self.items
            .iter()
            .map(|item| json!({ "Text": item.text, "Hrefs": item.hrefs }))
            .collect()
    }
}

/// One [`ExtractedList`] per `ol`/`ul` in document order.
///
/// Every `li` below a list counts as one of its items, so items of a nested
/// list also appear (as their own list) after the outer one.
pub fn extract_lists(
    doc: &mut Html,
    ctx: &PageContext,
    options: &ListOptions,
    codec: &MarkerCodec,
) -> Result<Vec<ExtractedList>, MarkError> {
    if options.href {
        mark_links(doc, &MarkScope::lists(), ctx, codec)?;
    }

    let lists: Vec<ExtractedList> = doc
        .select(&LIST_SELECTOR)
        .map(|list| ExtractedList {
            items: list
                .select(&ITEM_SELECTOR)
                .map(|li| {
                    let raw: String = li.text().collect();
                    ListItem {
                        hrefs: codec.extract_all(&raw).join("\n"),
                        text: codec.strip(&raw),
                    }
                })
                .collect(),
        })
        .collect();

    spider_info!("extracted {} lists from {}", lists.len(), ctx.url);
    Ok(lists)
}
