//! Org header parsing.
//!
//! Documents open with a block of `#+NAME: VALUE` lines:
//!
//! ```text
//! :PROPERTIES:              <- optional editor preamble, skipped
//! :ID: 5c1e...
//! :END:
//! #+LAYOUT: post
//! #+TITLE: Hello World
//! #+CATEGORIES: tech life
//!
//! * First heading           <- body starts at the first non-header line
//! ```
//!
//! Scanning is a prefix scan: the first line that is not a header ends it,
//! so `#+NAME:` lines further down the body are never read as metadata.
//! Names contain no whitespace, so a block opener with arguments
//! (`#+BEGIN_SRC sh :results output`) is body, not a header.
//! Names are case-insensitive and stored lower-cased. The first occurrence
//! of a name wins; later duplicates are ignored.
//!
//! Blank values (`#+TAGS:`) are handled per [`EmptyValues`]: `Skip` treats
//! the field as absent, `Record` stores it as an empty string. Validation
//! checks presence only, so this mode also decides whether a blank required
//! field passes.

use crate::config::SiteConfig;
use crate::types::{FieldName, HeaderMap};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\+([^:\s]+):[ \t]*(.*)$").expect("header regex is valid"));

const PROPERTY_BLOCK_START: &str = ":PROPERTIES:";
const PROPERTY_BLOCK_END: &str = ":END:";

/// How a header line with a blank value is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyValues {
    /// Blank value means the field is absent.
    #[default]
    Skip,
    /// Blank value is stored as an empty string and counts as present.
    Record,
}

/// Header parsing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub empty_values: EmptyValues,
    pub skip_property_block: bool,
}

impl ParseOptions {
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            empty_values: config.headers.empty_values,
            skip_property_block: config.headers.skip_property_block,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// Parse the header block at the top of `text`.
///
/// Never fails: text without headers yields an empty map.
pub fn parse_headers(text: &str, options: &ParseOptions) -> HeaderMap {
    scan(text, options).0
}

/// The document with its property block and header block removed.
///
/// Blank lines separating the headers from the body are dropped too.
pub fn split_body<'a>(text: &'a str, options: &ParseOptions) -> &'a str {
    let (_, offset) = scan(text, options);
    text[offset..].trim_start_matches(['\r', '\n'])
}

/// Walk the header block, returning the headers and the byte offset where
/// the body begins.
fn scan(text: &str, options: &ParseOptions) -> (HeaderMap, usize) {
    let mut headers = HeaderMap::new();
    let mut offset = 0;
    if options.skip_property_block {
        offset = property_block_end(text).unwrap_or(0);
    }

    for line in text[offset..].split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        let Some(caps) = HEADER_LINE.captures(content) else {
            break;
        };
        offset += line.len();

        let value = caps[2].trim_end();
        if value.is_empty() && options.empty_values == EmptyValues::Skip {
            continue;
        }
        headers.insert(FieldName::parse(&caps[1]), value);
    }

    (headers, offset)
}

/// Byte offset just past a leading `:PROPERTIES:` ... `:END:` block.
///
/// `None` when the document does not open with one, or the block is never
/// closed.
fn property_block_end(text: &str) -> Option<usize> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if !first.trim().eq_ignore_ascii_case(PROPERTY_BLOCK_START) {
        return None;
    }
    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if line.trim().eq_ignore_ascii_case(PROPERTY_BLOCK_END) {
            return Some(offset);
        }
    }
    None
}
