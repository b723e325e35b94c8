//! Metadata reading: file → headers → validated → transcoded.
//!
//! [`MetadataReader::read_metadata`] is the single entry point the rest of
//! the crate depends on. It is the only place structured failures turn into
//! the two outcomes a caller sees: publishable [`Metadata`], or a
//! [`ReadError`] whose `Display` is the user-facing message.
//!
//! ```text
//! parse_headers → validate ─ Invalid ─→ Err(MissingHeaders)
//!                    │
//!                  Valid
//!                    ↓
//! apply_defaults → encode categories/tags → convert date ─ bad date ─→ Err(Timestamp)
//!                    ↓
//! rename description→excerpt → strip non-target fields → Ok(Metadata)
//! ```

use crate::config::SiteConfig;
use crate::header::{ParseOptions, parse_headers};
use crate::schema::{RequiredFieldSchema, ValidationResult, validate};
use crate::transcode::{
    TimestampError, TimestampMode, TranscodeConfig, apply_defaults, convert_timestamp,
    encode_list, field_renames, rename_fields, strip_non_target_fields, tags_enabled,
    target_vocabulary,
};
use crate::types::{FieldName, HeaderMap, Metadata};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Format of the `date` default: an active org timestamp.
const NOW_FORMAT: &str = "<%Y-%m-%d %a %H:%M>";

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("This org-mode file is missing required header(s):\n{0}\nPublication skipped")]
    MissingHeaders(String),
    #[error("Invalid date {0}\nPublication skipped")]
    Timestamp(#[from] TimestampError),
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads publishable metadata out of org documents.
#[derive(Debug, Clone)]
pub struct MetadataReader {
    schema: RequiredFieldSchema,
    parse: ParseOptions,
    transcode: TranscodeConfig,
    /// Fixed "now" for the date default; `None` reads the local clock.
    now: Option<NaiveDateTime>,
}

impl MetadataReader {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            schema: config.schema(),
            parse: ParseOptions::from_site_config(config),
            transcode: TranscodeConfig::from_site_config(config),
            now: None,
        }
    }

    /// Pin the clock used for the `date` default.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn schema(&self) -> &RequiredFieldSchema {
        &self.schema
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse
    }

    /// Read and transcode the metadata of the document at `path`.
    ///
    /// A missing file reads as a document with no headers, so it fails
    /// validation like any header-less document.
    pub fn read_metadata(&self, path: &Path) -> Result<Metadata, ReadError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ReadError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        self.read_document(&text)
    }

    /// [`read_metadata`](Self::read_metadata) over in-memory text.
    pub fn read_document(&self, text: &str) -> Result<Metadata, ReadError> {
        let headers = match validate(parse_headers(text, &self.parse), &self.schema) {
            ValidationResult::Valid(headers) => headers,
            invalid => return Err(ReadError::MissingHeaders(invalid.message())),
        };
        self.transcode(headers)
    }

    fn transcode(&self, headers: HeaderMap) -> Result<Metadata, ReadError> {
        let defaults = [
            (FieldName::Date, self.now_timestamp()),
            (FieldName::Author, String::new()),
        ];
        let mut headers = apply_defaults(headers, &defaults);

        let style = self.transcode.list_style;
        let categories = encode_list(headers.get(&FieldName::Categories), style);
        let tags = if tags_enabled(&headers) {
            encode_list(headers.get(&FieldName::Tags), style)
        } else {
            encode_list(None, style)
        };
        headers.set(FieldName::Categories, categories);
        headers.set(FieldName::Tags, tags);

        let raw_date = headers.get(&FieldName::Date).unwrap_or_default();
        let date = convert_timestamp(raw_date, TimestampMode::DateTime)?;
        headers.set(FieldName::Date, date);

        let headers = rename_fields(headers, &field_renames());
        let headers = strip_non_target_fields(headers, &self.schema, &target_vocabulary());
        Ok(Metadata::from_headers(headers))
    }

    fn now_timestamp(&self) -> String {
        let now = self.now.unwrap_or_else(|| Local::now().naive_local());
        now.format(NOW_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaField;
    use crate::test_helpers::*;
    use crate::transcode::ListStyle;
    use tempfile::TempDir;

    fn classic_reader() -> MetadataReader {
        MetadataReader::new(&SiteConfig::default()).with_now(fixed_now())
    }

    #[test]
    fn reads_complete_classic_document() {
        let doc = "#+LAYOUT: post\n#+TITLE: Hello\n#+DATE: <2020-05-01 Fri 10:30>\n#+CATEGORIES: tech life\n#+TAGS: a b\n\n* Body\n";
        let metadata = classic_reader().read_document(doc).unwrap();
        assert_eq!(
            metadata.keys(),
            vec!["layout", "title", "date", "categories", "tags"]
        );
        assert_eq!(metadata.date(), Some("2020-05-01 10:30"));
        assert_eq!(metadata.get(&FieldName::Categories), Some("[tech,life]"));
        assert_eq!(metadata.get(&FieldName::Tags), Some("[a,b]"));
    }

    #[test]
    fn missing_headers_report_in_schema_order() {
        let doc = "#+CATEGORIES: x\n#+DATE: <2020-05-01>\n";
        let err = classic_reader().read_document(doc).unwrap_err();
        assert!(matches!(err, ReadError::MissingHeaders(_)));
        assert_eq!(
            err.to_string(),
            "This org-mode file is missing required header(s):\n\
             - The title is required, please add '#+TITLE' at the top of your document.\n\
             - The layout is required, please add '#+LAYOUT' at the top of your document.\n\
             Publication skipped"
        );
    }

    #[test]
    fn malformed_date_blocks_publication() {
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DATE: last tuesday\n#+CATEGORIES: x\n";
        let err = classic_reader().read_document(doc).unwrap_err();
        assert!(matches!(err, ReadError::Timestamp(_)));
        assert!(err.to_string().contains("last tuesday"));
        assert!(err.to_string().ends_with("Publication skipped"));
    }

    #[test]
    fn tags_suppressed_by_options() {
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DATE: <2020-05-01>\n#+CATEGORIES: x\n#+TAGS: foo bar\n#+OPTIONS: toc:nil tags:nil\n";
        let metadata = classic_reader().read_document(doc).unwrap();
        assert_eq!(metadata.get(&FieldName::Tags), Some("[]"));
        assert_eq!(metadata.get(&FieldName::Options), None);
    }

    #[test]
    fn absent_tags_encode_as_empty_list() {
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DATE: <2020-05-01>\n#+CATEGORIES: x\n";
        let metadata = classic_reader().read_document(doc).unwrap();
        assert_eq!(metadata.get(&FieldName::Tags), Some("[]"));
    }

    #[test]
    fn classic_schema_drops_author_default() {
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DATE: <2020-05-01>\n#+CATEGORIES: x\n";
        let metadata = classic_reader().read_document(doc).unwrap();
        assert_eq!(metadata.get(&FieldName::Author), None);
    }

    #[test]
    fn extended_schema_defaults_date_and_author() {
        let mut config = SiteConfig::default();
        config.schema.preset = crate::schema::SchemaPreset::Extended;
        let reader = MetadataReader::new(&config).with_now(fixed_now());
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DESCRIPTION: An intro\n#+CATEGORIES: x\n";
        let metadata = reader.read_document(doc).unwrap();
        assert_eq!(
            metadata.keys(),
            vec!["layout", "title", "excerpt", "categories", "date", "author", "tags"]
        );
        assert_eq!(metadata.date(), Some("2026-10-16 09:45"));
        assert_eq!(metadata.get(&FieldName::Author), Some(""));
        assert_eq!(metadata.get(&FieldName::Excerpt), Some("An intro"));
    }

    #[test]
    fn description_survives_classic_as_excerpt() {
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DATE: <2020-05-01>\n#+CATEGORIES: x\n#+DESCRIPTION: Short\n";
        let metadata = classic_reader().read_document(doc).unwrap();
        assert_eq!(metadata.get(&FieldName::Excerpt), Some("Short"));
        assert_eq!(metadata.get(&FieldName::Description), None);
    }

    #[test]
    fn unknown_headers_are_stripped() {
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DATE: <2020-05-01>\n#+CATEGORIES: x\n#+STARTUP: showall\n";
        let metadata = classic_reader().read_document(doc).unwrap();
        assert!(!metadata.keys().contains(&"startup"));
    }

    #[test]
    fn block_list_style() {
        let mut config = SiteConfig::default();
        config.front_matter.list_style = ListStyle::Block;
        let reader = MetadataReader::new(&config).with_now(fixed_now());
        let doc = "#+LAYOUT: post\n#+TITLE: T\n#+DATE: <2020-05-01>\n#+CATEGORIES: a b\n";
        let metadata = reader.read_document(doc).unwrap();
        assert_eq!(metadata.get(&FieldName::Categories), Some("\n- a\n- b"));
    }

    #[test]
    fn record_mode_lets_blank_required_field_pass() {
        let mut config = SiteConfig::default();
        config.headers.empty_values = crate::header::EmptyValues::Record;
        let reader = MetadataReader::new(&config).with_now(fixed_now());
        let doc = "#+LAYOUT: post\n#+TITLE:\n#+DATE: <2020-05-01>\n#+CATEGORIES:\n";
        let metadata = reader.read_document(doc).unwrap();
        assert_eq!(metadata.title(), Some(""));
        assert_eq!(metadata.get(&FieldName::Categories), Some("[]"));
    }

    #[test]
    fn skip_mode_fails_blank_required_field() {
        let doc = "#+LAYOUT: post\n#+TITLE:\n#+DATE: <2020-05-01>\n#+CATEGORIES: x\n";
        let err = classic_reader().read_document(doc).unwrap_err();
        assert!(err.to_string().contains("The title is required"));
    }

    #[test]
    fn undated_document_gets_current_date() {
        let schema = RequiredFieldSchema::new(vec![
            SchemaField::required(FieldName::Title),
            SchemaField::required(FieldName::Categories),
            SchemaField::required(FieldName::Layout),
            SchemaField::optional(FieldName::Date),
            SchemaField::optional(FieldName::Tags),
        ]);
        let mut config = SiteConfig::default();
        config.schema.fields = Some(schema.fields().to_vec());
        let reader = MetadataReader::new(&config).with_now(fixed_now());
        let metadata = reader
            .read_document("#+LAYOUT: post\n#+TITLE: T\n#+CATEGORIES: x\n")
            .unwrap();
        assert_eq!(metadata.date(), Some("2026-10-16 09:45"));
    }

    #[test]
    fn read_metadata_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_doc(
            tmp.path(),
            "hello.org",
            "#+LAYOUT: post\n#+TITLE: Hello\n#+DATE: <2020-05-01 Fri>\n#+CATEGORIES: x\n",
        );
        let metadata = classic_reader().read_metadata(&path).unwrap();
        assert_eq!(metadata.title(), Some("Hello"));
        assert_eq!(metadata.date(), Some("2020-05-01 00:00"));
    }

    #[test]
    fn missing_file_reads_as_headerless() {
        let tmp = TempDir::new().unwrap();
        let err = classic_reader()
            .read_metadata(&tmp.path().join("nope.org"))
            .unwrap_err();
        assert!(matches!(err, ReadError::MissingHeaders(_)));
    }

    #[test]
    fn directory_path_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = classic_reader().read_metadata(tmp.path()).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
    }
}
