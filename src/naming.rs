//! File naming for published documents.
//!
//! Jekyll only picks up posts named `YYYY-MM-DD-slug.ext`. The date comes
//! from the post's front-matter `date`; the slug from the source file stem.
//!
//! Source stems may already carry a date prefix (`2020-05-01-hello.org`).
//! [`parse_dated_name`] splits it off so a published name is never
//! double-dated:
//!
//! - `hello-world` → date=None, name="hello-world"
//! - `2020-05-01-hello` → date=Some("2020-05-01"), name="hello"
//! - `2020-5-1-hello` → date=None (not zero-padded), name="2020-5-1-hello"

use chrono::NaiveDate;

/// Result of parsing a possibly dated stem like `2020-05-01-hello`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedName {
    /// `YYYY-MM-DD` prefix if present and a real date.
    pub date: Option<String>,
    /// Remainder after the date prefix, or the whole stem.
    pub name: String,
}

const DATE_PREFIX_LEN: usize = "YYYY-MM-DD".len();

const MAX_SLUG_LEN: usize = 80;

/// Split a `YYYY-MM-DD-` prefix from a file stem.
pub fn parse_dated_name(stem: &str) -> DatedName {
    if stem.len() > DATE_PREFIX_LEN
        && stem.is_char_boundary(DATE_PREFIX_LEN)
        && stem.as_bytes()[DATE_PREFIX_LEN] == b'-'
    {
        let prefix = &stem[..DATE_PREFIX_LEN];
        if NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok()
            && prefix.bytes().filter(u8::is_ascii_digit).count() == 8
        {
            return DatedName {
                date: Some(prefix.to_string()),
                name: stem[DATE_PREFIX_LEN + 1..].to_string(),
            };
        }
    }
    DatedName {
        date: None,
        name: stem.to_string(),
    }
}

/// Sanitize text for use in URLs and file names.
///
/// - Replaces non-alphanumeric characters (except dashes) with dashes
/// - Collapses consecutive dashes into one
/// - Strips leading and trailing dashes
/// - Truncates to `MAX_SLUG_LEN` characters (breaks at last dash before limit)
pub fn sanitize_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.len() <= MAX_SLUG_LEN {
        return trimmed.to_string();
    }
    let truncated = &trimmed[..MAX_SLUG_LEN];
    match truncated.rfind('-') {
        Some(pos) => truncated[..pos].to_string(),
        None => truncated.to_string(),
    }
}

/// Published file name for a post: `<date>-<slug>.<ext>`.
///
/// `date` is `YYYY-MM-DD`. The slug is taken from the stem (minus any date
/// prefix), falling back to the title when the stem sanitizes to nothing.
pub fn post_file_name(date: &str, stem: &str, title: Option<&str>, extension: &str) -> String {
    let parsed = parse_dated_name(stem);
    let mut slug = sanitize_slug(&parsed.name);
    if slug.is_empty() {
        slug = sanitize_slug(title.unwrap_or_default());
    }
    if slug.is_empty() {
        slug = "untitled".to_string();
    }
    format!("{date}-{slug}.{extension}")
}
