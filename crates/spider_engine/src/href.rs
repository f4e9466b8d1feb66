//! Href classification and resolution against the page it was found on.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HrefError {
    #[error("href is empty")]
    Empty,
}

/// Shape of a raw href, decided from its leading characters only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HrefKind {
    /// `#fragment`
    SameDocument,
    /// `/path` on the page's own host.
    PageRelative,
    /// `//host/path` and everything else.
    ExternalAbsolute,
}

impl HrefKind {
    pub fn of(raw_href: &str) -> Result<Self, HrefError> {
        if raw_href.is_empty() {
            return Err(HrefError::Empty);
        }
        Ok(if raw_href.starts_with('#') {
            HrefKind::SameDocument
        } else if raw_href.starts_with("//") {
            HrefKind::ExternalAbsolute
        } else if raw_href.starts_with('/') {
            HrefKind::PageRelative
        } else {
            HrefKind::ExternalAbsolute
        })
    }
}

/// Host component of the page URL (with port when present), as used by
/// root-relative resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub domain: String,
    pub url: String,
}

impl PageContext {
    pub fn new(domain: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            url: url.into(),
        }
    }

    pub fn link(&self, raw_href: impl Into<String>) -> Link {
        Link::new(raw_href, self.domain.clone(), self.url.clone())
    }
}

/// Everything before the last `#` of `url`, or `url` unchanged if it has no fragment.
pub fn strip_fragment(url: &str) -> &str {
    match url.rfind('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Resolve `raw_href` to an absolute URL.
///
/// Rules are applied in order:
/// 1. `#frag` appends to the page URL with its own fragment removed.
/// 2. `//host/path` gets an `http:` scheme.
/// 3. `/path` is joined to `http://{page_domain}`.
/// 4. Anything else resolves to `page_url` itself. Relative paths such as
///    `foo.html` are not joined against the page path.
pub fn resolve_href(raw_href: &str, page_domain: &str, page_url: &str) -> Result<String, HrefError> {
    if raw_href.is_empty() {
        return Err(HrefError::Empty);
    }
    if raw_href.starts_with('#') {
        Ok(format!("{}{raw_href}", strip_fragment(page_url)))
    } else if raw_href.starts_with("//") {
        Ok(format!("http:{raw_href}"))
    } else if raw_href.starts_with('/') {
        Ok(format!("http://{page_domain}{raw_href}"))
    } else {
        Ok(page_url.to_string())
    }
}

/// A link as found on a page. The resolved form is computed once, on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    raw_href: String,
    page_domain: String,
    page_url: String,
    resolved: Result<String, HrefError>,
}

impl Link {
    pub fn new(
        raw_href: impl Into<String>,
        page_domain: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        let raw_href = raw_href.into();
        let page_domain = page_domain.into();
        let page_url = page_url.into();
        let resolved = resolve_href(&raw_href, &page_domain, &page_url);
        Self {
            raw_href,
            page_domain,
            page_url,
            resolved,
        }
    }

    pub fn raw_href(&self) -> &str {
        &self.raw_href
    }

    pub fn page_domain(&self) -> &str {
        &self.page_domain
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn kind(&self) -> Result<HrefKind, HrefError> {
        HrefKind::of(&self.raw_href)
    }

    pub fn resolved_url(&self) -> Result<&str, HrefError> {
        self.resolved.as_deref().map_err(Clone::clone)
    }
}
