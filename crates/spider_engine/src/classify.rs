use std::collections::BTreeSet;

use serde::Serialize;
use spider_logging::spider_debug;

use crate::href::{HrefError, HrefKind, Link};

/// Resolved page links grouped by href shape. Each bucket is a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkCategories {
    pub all: BTreeSet<String>,
    pub same_document: BTreeSet<String>,
    pub page_relative: BTreeSet<String>,
    pub external: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    pub raw_href: String,
    pub error: HrefError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    pub categories: LinkCategories,
    pub skipped: Vec<SkippedLink>,
}

impl ClassificationReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Sort every link into exactly one of same-document, page-relative or
/// external. Links that fail to resolve are reported in `skipped` and kept
/// out of every bucket.
pub fn classify_links(links: &[Link]) -> ClassificationReport {
    let mut report = ClassificationReport::default();

    for link in links {
        match classify_link(link) {
            Ok((kind, url)) => {
                let bucket = match kind {
                    HrefKind::SameDocument => &mut report.categories.same_document,
                    HrefKind::PageRelative => &mut report.categories.page_relative,
                    HrefKind::ExternalAbsolute => &mut report.categories.external,
                };
                bucket.insert(url.to_string());
                report.categories.all.insert(url.to_string());
            }
            Err(error) => {
                spider_debug!("skipping href {:?}: {error}", link.raw_href());
                report.skipped.push(SkippedLink {
                    raw_href: link.raw_href().to_string(),
                    error,
                });
            }
        }
    }

    report
}

fn classify_link(link: &Link) -> Result<(HrefKind, &str), HrefError> {
    Ok((link.kind()?, link.resolved_url()?))
}
