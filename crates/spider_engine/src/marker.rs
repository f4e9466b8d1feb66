use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::node::{Node, Text};
use scraper::{ElementRef, Html, Selector};
use spider_logging::{spider_debug, spider_warn};

use crate::codec::MarkerCodec;
use crate::href::PageContext;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

static LIST_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^(?:[ou]l)$").expect("list tag pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkError {
    #[error("document text already contains marker delimiter {token:?}")]
    DelimiterCollision { token: String },
}

/// Which anchors get marked: those inside an element this scope matches.
#[derive(Debug, Clone)]
pub enum MarkScope {
    All,
    Tags(Vec<String>),
    /// Matched against the whole lowercase tag name.
    Pattern(Regex),
}

impl MarkScope {
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        MarkScope::Tags(
            tags.into_iter()
                .map(|tag| tag.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{pattern})$")).map(MarkScope::Pattern)
    }

    /// `ol` and `ul`.
    pub fn lists() -> Self {
        MarkScope::Pattern(LIST_TAGS.clone())
    }

    pub fn matches_tag(&self, name: &str) -> bool {
        match self {
            MarkScope::All => true,
            MarkScope::Tags(tags) => tags.iter().any(|tag| tag.eq_ignore_ascii_case(name)),
            MarkScope::Pattern(re) => re.is_match(&name.to_ascii_lowercase()),
        }
    }

    fn covers(&self, anchor: ElementRef<'_>) -> bool {
        match self {
            MarkScope::All => true,
            _ => anchor
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| self.matches_tag(el.value().name())),
        }
    }

    /// Elements the scope selects, in document order.
    pub(crate) fn roots<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        match self {
            MarkScope::All => vec![doc.root_element()],
            _ => doc
                .root_element()
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| self.matches_tag(el.value().name()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkReport {
    pub marked: usize,
    /// Anchors left alone because their href could not be resolved.
    pub skipped: usize,
}

/// Append the encoded resolved link to the text of every anchor in `scope`.
///
/// The encoding goes into a new trailing text node, so the anchor's child
/// elements stay in place and its text reads `existing text + encoded link`.
/// Nothing is mutated when the scoped text already contains a delimiter.
pub fn mark_links(
    doc: &mut Html,
    scope: &MarkScope,
    ctx: &PageContext,
    codec: &MarkerCodec,
) -> Result<MarkReport, MarkError> {
    check_collisions(doc, scope, codec)?;

    let mut report = MarkReport::default();
    let mut plan: Vec<(NodeId, String)> = Vec::new();
    for anchor in doc.select(&ANCHOR_SELECTOR) {
        if !scope.covers(anchor) {
            continue;
        }
        let Some(raw) = anchor.value().attr("href") else {
            continue;
        };
        let link = ctx.link(raw);
        match link.resolved_url() {
            Ok(url) => plan.push((anchor.id(), codec.encode(url))),
            Err(err) => {
                spider_debug!("not marking anchor with href {raw:?}: {err}");
                report.skipped += 1;
            }
        }
    }

    for (id, encoded) in plan {
        if let Some(mut anchor) = doc.tree.get_mut(id) {
            anchor.append(Node::Text(Text {
                text: encoded.into(),
            }));
            report.marked += 1;
        }
    }

    spider_debug!(
        "marked {} anchors ({} skipped) for scope {scope:?}",
        report.marked,
        report.skipped
    );
    Ok(report)
}

/// Fails when the text of any element in `scope` contains a delimiter.
pub(crate) fn check_collisions(
    doc: &Html,
    scope: &MarkScope,
    codec: &MarkerCodec,
) -> Result<(), MarkError> {
    for root in scope.roots(doc) {
        let text: String = root.text().collect();
        if let Some(token) = codec.find_collision(&text) {
            spider_warn!("refusing to mark links: page text contains {token:?}");
            return Err(MarkError::DelimiterCollision {
                token: token.to_string(),
            });
        }
    }
    Ok(())
}
