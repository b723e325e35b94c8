//! Shared value types passed between pipeline stages.
//!
//! Field names form a closed vocabulary ([`FieldName`]) with an explicit
//! [`FieldName::Extra`] bucket for anything the pipeline does not know about.
//! Header values always stay raw strings; only the transcoder gives them a
//! target encoding.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A header field name, lower-cased.
///
/// Source documents use `description`; the published front matter uses
/// `excerpt`. `options` is a source-only control field and never reaches the
/// front matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldName {
    Title,
    Date,
    Categories,
    Tags,
    Layout,
    Description,
    Excerpt,
    Author,
    Options,
    /// Any other header, stored lower-cased.
    Extra(String),
}

impl FieldName {
    /// Resolve a raw header name. Matching is case-insensitive.
    pub fn parse(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "title" => Self::Title,
            "date" => Self::Date,
            "categories" => Self::Categories,
            "tags" => Self::Tags,
            "layout" => Self::Layout,
            "description" => Self::Description,
            "excerpt" => Self::Excerpt,
            "author" => Self::Author,
            "options" => Self::Options,
            _ => Self::Extra(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::Date => "date",
            Self::Categories => "categories",
            Self::Tags => "tags",
            Self::Layout => "layout",
            Self::Description => "description",
            Self::Excerpt => "excerpt",
            Self::Author => "author",
            Self::Options => "options",
            Self::Extra(name) => name,
        }
    }

    /// The header as an author would type it: `#+TITLE`.
    pub fn header_tag(&self) -> String {
        format!("#+{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<FieldName> for String {
    fn from(field: FieldName) -> Self {
        field.as_str().to_string()
    }
}

/// Ordered header mapping with unique keys.
///
/// Insertion order is preserved and is the order front matter is rendered in.
/// [`HeaderMap::insert`] keeps the first value seen for a key; use
/// [`HeaderMap::set`] to overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(FieldName, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value unless the key is already present.
    ///
    /// Returns `false` (and leaves the map untouched) for a duplicate key.
    pub fn insert(&mut self, field: FieldName, value: impl Into<String>) -> bool {
        if self.contains(&field) {
            return false;
        }
        self.entries.push((field, value.into()));
        true
    }

    /// Overwrite the value in place, or append if the key is new.
    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &FieldName) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, field: &FieldName) -> bool {
        self.entries.iter().any(|(f, _)| f == field)
    }

    /// Rename `from` to `to`, keeping the entry's position.
    ///
    /// An entry already stored under `to` is dropped so keys stay unique.
    pub fn rename(&mut self, from: &FieldName, to: FieldName) {
        if !self.contains(from) || *from == to {
            return;
        }
        self.entries.retain(|(f, _)| *f != to);
        if let Some(entry) = self.entries.iter_mut().find(|(f, _)| f == from) {
            entry.0 = to;
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&FieldName) -> bool) {
        self.entries.retain(|(f, _)| keep(f));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &str)> {
        self.entries.iter().map(|(f, v)| (f, v.as_str()))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(f, _)| f.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}

/// Fully transcoded front-matter metadata, ready to render.
///
/// Produced only by [`crate::reader::MetadataReader`]: every key is in the
/// target vocabulary, lists are encoded, and `date` is `YYYY-MM-DD HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata(HeaderMap);

impl Metadata {
    pub(crate) fn from_headers(headers: HeaderMap) -> Self {
        Self(headers)
    }

    pub fn get(&self, field: &FieldName) -> Option<&str> {
        self.0.get(field)
    }

    pub fn layout(&self) -> Option<&str> {
        self.get(&FieldName::Layout)
    }

    pub fn title(&self) -> Option<&str> {
        self.get(&FieldName::Title)
    }

    pub fn date(&self) -> Option<&str> {
        self.get(&FieldName::Date)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&FieldName, &str)> {
        self.0.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
