//! Spider engine: single-page link resolution and link-preserving table/list extraction.
mod classify;
mod codec;
mod decode;
mod fetch;
mod href;
mod lists;
mod marker;
mod page;
mod table_parser;
mod tables;
mod types;

pub use classify::{classify_links, ClassificationReport, LinkCategories, SkippedLink};
pub use codec::{CodecError, MarkerCodec, DEFAULT_CLOSE, DEFAULT_OPEN};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use href::{resolve_href, strip_fragment, HrefError, HrefKind, Link, PageContext};
pub use lists::{extract_lists, ExtractedList, ListItem, ListOptions};
pub use marker::{mark_links, MarkError, MarkReport, MarkScope};
pub use page::{Page, PageError};
pub use table_parser::{HtmlTableParser, ParsedTable, TableParser};
pub use tables::{
    extract_tables, merge_tables, ExtractedTable, TableError, TableExtraction, TableOptions,
    DEFAULT_SENTINEL, LINKS_COLUMN,
};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};

pub use scraper::Html;
