//! Article XML Parser
//!
//! Loads XML text into an XPath document store. The markup is prepared first:
//! - a leading byte order mark is dropped
//! - DOCTYPE declarations are removed, the store does not read DTDs
//! - named entities other than the five XML ones are escaped so they survive
//!   as literal text (`&eacute;` reads back as `&eacute;`)
//!
//! Comments and CDATA sections pass through untouched. Predefined and numeric
//! character references are decoded by the parser as usual.

use crate::document::Document;
use crate::error::{ChunkError, Result};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use xee_xpath::Documents;

static MARKUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!\[CDATA\[.*?\]\]>|<!--.*?-->|<!DOCTYPE(?:[^\[>]|\[.*?\])*>|&([A-Za-z_][A-Za-z0-9._-]*);",
    )
    .unwrap()
});

/// Prolog constructs that can appear without any element
static PROLOG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?.*?\?>|<!--.*?-->").unwrap());

const XML_ENTITIES: [&str; 5] = ["lt", "gt", "amp", "apos", "quot"];

/// Make article markup acceptable to the XPath store
pub fn prepare_markup(xml: &str) -> Cow<'_, str> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    MARKUP_REGEX.replace_all(xml, |caps: &Captures| {
        let whole = &caps[0];
        match caps.get(1) {
            Some(name) if XML_ENTITIES.contains(&name.as_str()) => whole.to_string(),
            Some(name) => format!("&amp;{};", name.as_str()),
            None if whole.starts_with("<!DOCTYPE") => String::new(),
            None => whole.to_string(),
        }
    })
}

/// Parse XML text into a `Document`
pub fn parse_xml(xml: &str) -> Result<Document> {
    let markup = prepare_markup(xml);
    if PROLOG_REGEX.replace_all(&markup, "").trim().is_empty() {
        return Err(ChunkError::Empty);
    }

    let mut store = Documents::new();
    let handle = store
        .add_string_without_uri(&markup)
        .map_err(|e| ChunkError::malformed(e.to_string()))?;
    Ok(Document::from_store(store, handle))
}
