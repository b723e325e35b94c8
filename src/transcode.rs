//! Source → target field transcoding.
//!
//! Turns validated org headers into Jekyll vocabulary:
//!
//! - missing `date`/`author` filled from defaults ([`apply_defaults`])
//! - `description` renamed to `excerpt` ([`rename_fields`])
//! - `categories`/`tags` re-encoded from space-separated words to YAML lists
//!   ([`encode_list`]), with tags suppressed by `#+OPTIONS: tags:nil`
//! - org timestamps reformatted ([`convert_timestamp`])
//! - source-only keys such as `options` dropped ([`strip_non_target_fields`])
//!
//! Every function here is pure.

use crate::config::SiteConfig;
use crate::schema::RequiredFieldSchema;
use crate::types::{FieldName, HeaderMap};
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// `<2020-05-01 Fri 10:30>`, `[2020-05-01]`, `2020-05-01 10:30`, ...
///
/// The day name is any run of non-digit characters, so localized names like
/// `ven.` parse too.
static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*[<\[]?(\d{4})-(\d{2})-(\d{2})(?:\s+[^\s\d<>\[\]]+)?(?:\s+(\d{1,2}):(\d{2}))?\s*[>\]]?\s*$",
    )
    .expect("timestamp regex is valid")
});

/// Option token that suppresses tags in the published front matter.
const TAGS_DISABLED: &str = "tags:nil";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("'{0}' does not match <YYYY-MM-DD [Day] [HH:MM]>")]
    Grammar(String),
    #[error("'{0}' is not a valid calendar date")]
    InvalidDate(String),
    #[error("'{0}' is not a valid time of day")]
    InvalidTime(String),
}

/// Output shape of [`convert_timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    /// `YYYY-MM-DD`, used to date post file names.
    DateOnly,
    /// `YYYY-MM-DD HH:MM`, used for the front-matter `date`.
    DateTime,
}

/// Target syntax for list-valued fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    /// `[a,b,c]`
    #[default]
    Inline,
    /// A YAML block list, one `- item` line per token.
    Block,
}

/// Representation of an empty list in either style.
pub const EMPTY_LIST: &str = "[]";

/// Transcoding settings taken from the site config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeConfig {
    pub list_style: ListStyle,
}

impl TranscodeConfig {
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            list_style: config.front_matter.list_style,
        }
    }
}

/// Source names renamed on the way out, as `(source, target)`.
pub fn field_renames() -> Vec<(FieldName, FieldName)> {
    vec![(FieldName::Description, FieldName::Excerpt)]
}

/// Target keys kept even when the schema does not declare them.
pub fn target_vocabulary() -> Vec<FieldName> {
    field_renames().into_iter().map(|(_, target)| target).collect()
}

/// Fill absent fields from `defaults`. Present values are never replaced,
/// even when empty. New entries are appended in `defaults` order.
pub fn apply_defaults(mut headers: HeaderMap, defaults: &[(FieldName, String)]) -> HeaderMap {
    for (field, value) in defaults {
        headers.insert(field.clone(), value.clone());
    }
    headers
}

/// Rename source keys to target keys in place. Unmapped keys pass through.
pub fn rename_fields(mut headers: HeaderMap, mapping: &[(FieldName, FieldName)]) -> HeaderMap {
    for (from, to) in mapping {
        headers.rename(from, to.clone());
    }
    headers
}

/// Encode a space-separated value as a YAML list.
///
/// Empty tokens (from repeated spaces) are dropped; duplicates are kept.
/// Absent and empty input both give [`EMPTY_LIST`].
pub fn encode_list(value: Option<&str>, style: ListStyle) -> String {
    let tokens: Vec<&str> = value
        .unwrap_or_default()
        .split(' ')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return EMPTY_LIST.to_string();
    }

    match style {
        ListStyle::Inline => format!("[{}]", tokens.join(",")),
        ListStyle::Block => tokens.iter().map(|t| format!("\n- {t}")).collect(),
    }
}

/// Reformat an org timestamp.
///
/// A timestamp without a time of day converts to `00:00` in
/// [`TimestampMode::DateTime`].
pub fn convert_timestamp(raw: &str, mode: TimestampMode) -> Result<String, TimestampError> {
    let caps = TIMESTAMP
        .captures(raw)
        .ok_or_else(|| TimestampError::Grammar(raw.to_string()))?;

    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let year = caps[1]
        .parse::<i32>()
        .map_err(|_| TimestampError::Grammar(raw.to_string()))?;
    let date = match (number(2), number(3)) {
        (Some(month), Some(day)) => NaiveDate::from_ymd_opt(year, month, day),
        _ => None,
    }
    .ok_or_else(|| TimestampError::InvalidDate(raw.to_string()))?;

    let time = match (number(4), number(5)) {
        (Some(hour), Some(minute)) => NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| TimestampError::InvalidTime(raw.to_string()))?,
        _ => NaiveTime::MIN,
    };

    Ok(match mode {
        TimestampMode::DateOnly => date.format("%Y-%m-%d").to_string(),
        TimestampMode::DateTime => date.and_time(time).format("%Y-%m-%d %H:%M").to_string(),
    })
}

/// Drop every key the schema does not declare and the target vocabulary
/// does not know.
pub fn strip_non_target_fields(
    mut headers: HeaderMap,
    schema: &RequiredFieldSchema,
    vocabulary: &[FieldName],
) -> HeaderMap {
    headers.retain(|field| schema.declares(field) || vocabulary.contains(field));
    headers
}

/// False when the `options` field carries a `tags:nil` token.
pub fn tags_enabled(headers: &HeaderMap) -> bool {
    headers
        .get(&FieldName::Options)
        .map(|options| !options.split(' ').any(|token| token == TAGS_DISABLED))
        .unwrap_or(true)
}
