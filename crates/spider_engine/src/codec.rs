//! Delimiters that carry resolved links through text-only extraction.
//!
//! A marked anchor reads `text{open}url{close}`. After tables or lists have
//! been flattened to plain strings, [`MarkerCodec::extract_all`] recovers the
//! urls and [`MarkerCodec::strip`] recovers the text.

use regex::Regex;

pub const DEFAULT_OPEN: &str = "(href";
pub const DEFAULT_CLOSE: &str = "href)";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("marker delimiters must not be empty")]
    EmptyDelimiter,
    #[error("open and close delimiters must differ (both are {0:?})")]
    IdenticalDelimiters(String),
    #[error("marker pattern rejected: {0}")]
    Pattern(String),
}

#[derive(Debug, Clone)]
pub struct MarkerCodec {
    open: String,
    close: String,
    span: Regex,
}

impl MarkerCodec {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self, CodecError> {
        let open = open.into();
        let close = close.into();
        if open.is_empty() || close.is_empty() {
            return Err(CodecError::EmptyDelimiter);
        }
        if open == close {
            return Err(CodecError::IdenticalDelimiters(open));
        }
        let span = Regex::new(&format!(
            "{}(.*?){}",
            regex::escape(&open),
            regex::escape(&close)
        ))
        .map_err(|err| CodecError::Pattern(err.to_string()))?;
        Ok(Self { open, close, span })
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }

    pub fn encode(&self, url: &str) -> String {
        format!("{}{url}{}", self.open, self.close)
    }

    /// Every url between an open delimiter and the nearest following close,
    /// left to right. Spans never cross a line break.
    pub fn extract_all(&self, text: &str) -> Vec<String> {
        self.span
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// `text` with every complete `open…close` span removed. A dangling open
    /// delimiter is left in place.
    pub fn strip(&self, text: &str) -> String {
        self.span.replace_all(text, "").into_owned()
    }

    /// The first delimiter found in `text`, if any.
    pub fn find_collision(&self, text: &str) -> Option<&str> {
        if text.contains(&self.open) {
            Some(self.open.as_str())
        } else if text.contains(&self.close) {
            Some(self.close.as_str())
        } else {
            None
        }
    }
}

impl Default for MarkerCodec {
    fn default() -> Self {
        let open = DEFAULT_OPEN.to_string();
        let close = DEFAULT_CLOSE.to_string();
        let span = Regex::new(r"\(href(.*?)href\)").expect("default marker regex is valid");
        Self { open, close, span }
    }
}

impl PartialEq for MarkerCodec {
    fn eq(&self, other: &Self) -> bool {
        self.open == other.open && self.close == other.close
    }
}

impl Eq for MarkerCodec {}
