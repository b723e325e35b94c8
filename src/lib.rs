//! # org-jekyll
//!
//! Publishes org-mode documents into a Jekyll site tree. Each document's
//! `#+NAME: VALUE` header block becomes YAML front matter; posts are renamed
//! `YYYY-MM-DD-slug` and moved to `_posts/`, pages are mirrored into the
//! site.
//!
//! # Architecture: One-Way Metadata Pipeline
//!
//! ```text
//! file ─→ parse_headers ─→ validate ─→ transcode ─→ render ─→ publish
//!         (header)         (schema)    (transcode)  (render)  (publish)
//! ```
//!
//! Everything up to `render` is pure and works on value types; only the
//! publish step touches the filesystem, and it does so through the
//! [`publish::Publisher`] trait. The [`reader`] module is the one place
//! failures are turned into user-facing messages.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `FieldName` vocabulary, ordered `HeaderMap`, transcoded `Metadata` |
//! | [`header`] | Prefix scan of `#+NAME: VALUE` lines, property-block skipping, body split |
//! | [`schema`] | Required-field schema presets and presence validation |
//! | [`transcode`] | Defaults, renames, list encoding, timestamp conversion, stripping |
//! | [`reader`] | Orchestrates parse → validate → transcode for one file |
//! | [`render`] | Front-matter block serialization |
//! | [`naming`] | `YYYY-MM-DD-slug` post names and slug sanitizing |
//! | [`publish`] | Post/page dispatch, filesystem publisher and index, bulk publish |
//! | [`config`] | `config.toml` loading, validation, and the stock config |
//! | [`output`] | CLI status formatting |
//!
//! # Design Decisions
//!
//! ## Closed Field Vocabulary
//!
//! Header names resolve to a [`types::FieldName`] enum with an `Extra`
//! bucket. The schema, renames, and stripping all match on enum values, so
//! a typo in a field name is a compile error rather than a silent miss.
//!
//! ## First Header Wins
//!
//! A document repeating `#+TITLE` keeps the first value. Headers are read
//! top-down and the first block is what an author sees when opening the
//! file.
//!
//! ## Configuration As a Value
//!
//! The schema, layout names, and paths live in one [`config::SiteConfig`]
//! loaded once and passed into the reader and dispatcher. The two
//! historical header sets are schema presets, not separate code paths.

pub mod config;
pub mod header;
pub mod naming;
pub mod output;
pub mod publish;
pub mod reader;
pub mod render;
pub mod schema;
pub mod transcode;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
