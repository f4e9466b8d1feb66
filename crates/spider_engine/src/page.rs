use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use spider_logging::{spider_debug, spider_info};
use url::Url;

use crate::classify::{classify_links, ClassificationReport};
use crate::codec::MarkerCodec;
use crate::decode::{decode_html, DecodeError};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::href::{Link, PageContext};
use crate::lists::{extract_lists, ExtractedList, ListOptions};
use crate::marker::{mark_links, MarkError, MarkReport, MarkScope};
use crate::table_parser::{HtmlTableParser, TableParser};
use crate::tables::{extract_tables, TableError, TableExtraction, TableOptions};
use crate::{FailureKind, FetchError};

static HREF_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[href]").expect("href selector is valid"));

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("invalid page url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("fetch failed: {0}")]
    Transport(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A fetched and parsed page with every `href` it carries.
///
/// Extraction methods mark a private copy of the document as parsed unless
/// their options ask for in-place editing, which needs `&mut self`. In-place
/// marks show up in [`Page::document`] but never in later copies.
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    domain: String,
    html: Html,
    /// The document as parsed, never marked.
    pristine: Html,
    links: Vec<Link>,
    codec: MarkerCodec,
}

impl Page {
    /// GET `url`, decode the body and parse it.
    pub async fn fetch(url: &str, fetcher: &dyn Fetcher) -> Result<Self, PageError> {
        let output = fetcher.fetch(url).await?;
        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref())?;
        spider_debug!("decoded {url} as {}", decoded.encoding_label);
        Self::from_html(url, &decoded.html)
    }

    /// [`Page::fetch`] on a private current-thread runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn fetch_blocking(url: &str, settings: FetchSettings) -> Result<Self, PageError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| FetchError::new(FailureKind::Runtime, err.to_string()))?;
        let fetcher = ReqwestFetcher::new(settings);
        runtime.block_on(Self::fetch(url, &fetcher))
    }

    /// Parse already-downloaded markup as if it had been fetched from `url`.
    pub fn from_html(url: &str, html: &str) -> Result<Self, PageError> {
        let domain = page_domain(url)?;
        let document = Html::parse_document(html);
        let links: Vec<Link> = document
            .select(&HREF_SELECTOR)
            .filter_map(|el| el.value().attr("href"))
            .map(|href| Link::new(href, domain.as_str(), url))
            .collect();
        spider_info!("parsed {url}: {} hrefs", links.len());

        Ok(Self {
            url: url.to_string(),
            domain,
            pristine: document.clone(),
            html: document,
            links,
            codec: MarkerCodec::default(),
        })
    }

    /// Use `codec` for every later marking and recovery step.
    pub fn with_codec(mut self, codec: MarkerCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn document(&self) -> &Html {
        &self.html
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn codec(&self) -> &MarkerCodec {
        &self.codec
    }

    pub fn context(&self) -> PageContext {
        PageContext::new(self.domain.as_str(), self.url.as_str())
    }

    /// A marked copy of the document as parsed; the page itself is left untouched.
    pub fn mark_links(&self, scope: &MarkScope) -> Result<(Html, MarkReport), MarkError> {
        let mut copy = self.pristine.clone();
        let report = mark_links(&mut copy, scope, &self.context(), &self.codec)?;
        Ok((copy, report))
    }

    /// Mark the page's own document. Marking the same anchors twice is
    /// rejected as a delimiter collision.
    pub fn mark_links_in_place(&mut self, scope: &MarkScope) -> Result<MarkReport, MarkError> {
        let ctx = self.context();
        mark_links(&mut self.html, scope, &ctx, &self.codec)
    }

    pub fn tables(&mut self, options: &TableOptions) -> Result<TableExtraction, TableError> {
        let parser = HtmlTableParser::with_sentinel(options.whitespace_sentinel);
        self.tables_with(options, &parser)
    }

    /// Like [`Page::tables`] with a caller-supplied tabular parser.
    pub fn tables_with(
        &mut self,
        options: &TableOptions,
        parser: &dyn TableParser,
    ) -> Result<TableExtraction, TableError> {
        let ctx = self.context();
        if options.edit_in_place {
            extract_tables(&mut self.html, &ctx, options, &self.codec, parser)
        } else {
            let mut copy = self.pristine.clone();
            extract_tables(&mut copy, &ctx, options, &self.codec, parser)
        }
    }

    pub fn lists(&mut self, options: &ListOptions) -> Result<Vec<ExtractedList>, MarkError> {
        let ctx = self.context();
        if options.edit_in_place {
            extract_lists(&mut self.html, &ctx, options, &self.codec)
        } else {
            let mut copy = self.pristine.clone();
            extract_lists(&mut copy, &ctx, options, &self.codec)
        }
    }

    pub fn classify_links(&self) -> ClassificationReport {
        classify_links(&self.links)
    }

    /// Non-whitespace text fragments, trimmed, of the outermost elements in `scope`.
    pub fn page_strings(&self, scope: &MarkScope) -> Vec<String> {
        scope
            .roots(&self.html)
            .into_iter()
            .filter(|root| !has_scoped_ancestor(*root, scope))
            .flat_map(|root| root.text())
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

fn has_scoped_ancestor(el: ElementRef<'_>, scope: &MarkScope) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| scope.matches_tag(ancestor.value().name()))
}

/// Host of `url`, with the port when one is given explicitly.
fn page_domain(url: &str) -> Result<String, PageError> {
    let parsed = Url::parse(url).map_err(|err| PageError::InvalidUrl {
        url: url.to_string(),
        message: err.to_string(),
    })?;
    Ok(match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    })
}
