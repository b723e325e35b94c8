//! `config.toml` for an org-jekyll site.
//!
//! Handles loading and validating `config.toml`. The file lives in
//! the site root; stock defaults are used for anything it does not set.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! source = "org"            # Directory holding the org documents
//! posts = "_posts"          # Where published posts are written
//! pages = "."               # Where published pages are written
//! extension = "org"         # Extension of source documents
//!
//! [layouts]
//! post = "post"             # #+LAYOUT value that marks a post
//! page = "default"          # #+LAYOUT value that marks a page
//!
//! [schema]
//! preset = "classic"        # "classic" or "extended"
//! # fields = [{ name = "title", required = true }]
//!
//! [headers]
//! empty_values = "skip"     # "skip" or "record"
//! skip_property_block = true
//!
//! [front_matter]
//! list_style = "inline"     # "inline" or "block"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Only the keys you set are read; everything else keeps its default:
//!
//! ```toml
//! [layouts]
//! page = "page"
//! ```
//!
//! Unknown keys are an error.

use crate::header::EmptyValues;
use crate::schema::{RequiredFieldSchema, SchemaField, SchemaPreset};
use crate::transcode::ListStyle;
use crate::types::FieldName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Everything the reader, dispatcher and filesystem collaborators need to
/// know about a site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Source and destination directories.
    pub paths: PathsConfig,
    /// Layout names that route a document to post or page publishing.
    pub layouts: LayoutsConfig,
    /// Which headers a document must carry.
    pub schema: SchemaConfig,
    /// Header block parsing.
    pub headers: HeadersConfig,
    /// Front-matter output encoding.
    pub front_matter: FrontMatterConfig,
    /// Parallel bulk-publish settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Reject layouts, extensions and schemas the pipeline can't work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layouts.post.trim().is_empty() || self.layouts.page.trim().is_empty() {
            return Err(ConfigError::Validation(
                "layouts.post and layouts.page must not be empty".into(),
            ));
        }
        if self.layouts.post == self.layouts.page {
            return Err(ConfigError::Validation(
                "layouts.post and layouts.page must differ".into(),
            ));
        }
        if self.paths.extension.is_empty() || self.paths.extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "paths.extension must be a bare extension like \"org\"".into(),
            ));
        }
        if let Some(fields) = &self.schema.fields {
            if !fields.iter().any(|f| f.field == FieldName::Layout) {
                return Err(ConfigError::Validation(
                    "schema.fields must declare the layout field".into(),
                ));
            }
            let mut seen = Vec::new();
            for f in fields {
                if seen.contains(&&f.field) {
                    return Err(ConfigError::Validation(format!(
                        "schema.fields declares '{}' twice",
                        f.field
                    )));
                }
                seen.push(&f.field);
            }
        }
        Ok(())
    }

    /// Resolve the schema: explicit fields win over the preset.
    pub fn schema(&self) -> RequiredFieldSchema {
        match &self.schema.fields {
            Some(fields) => RequiredFieldSchema::new(fields.clone()),
            None => RequiredFieldSchema::preset(self.schema.preset),
        }
    }
}

/// Source and destination directories, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory scanned for org documents.
    pub source: PathBuf,
    /// Destination directory for posts.
    pub posts: PathBuf,
    /// Destination directory for pages.
    pub pages: PathBuf,
    /// Extension of source documents, without the dot.
    pub extension: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("org"),
            posts: PathBuf::from("_posts"),
            pages: PathBuf::from("."),
            extension: "org".to_string(),
        }
    }
}

/// Layout names matched exactly against `#+LAYOUT`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutsConfig {
    pub post: String,
    pub page: String,
}

impl Default for LayoutsConfig {
    fn default() -> Self {
        Self {
            post: "post".to_string(),
            page: "default".to_string(),
        }
    }
}

/// Required-field schema selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Named preset used when `fields` is absent.
    pub preset: SchemaPreset,
    /// Explicit ordered field list, replacing the preset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SchemaField>>,
}

/// Header block parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadersConfig {
    /// Whether `#+NAME:` with a blank value counts as present.
    pub empty_values: EmptyValues,
    /// Skip a leading `:PROPERTIES:` ... `:END:` block before the headers.
    pub skip_property_block: bool,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            empty_values: EmptyValues::Skip,
            skip_property_block: true,
        }
    }
}

/// Front-matter encoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontMatterConfig {
    /// YAML syntax for `categories` and `tags`.
    pub list_style: ListStyle,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel publish workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Load `config.toml` from the site root and validate it.
///
/// Every section and key is optional, so serde's defaults fill whatever the
/// file leaves out. A site without the file gets the stock defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);
    let config = if config_path.exists() {
        parse_config(&fs::read_to_string(&config_path)?)?
    } else {
        SiteConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Parse config text, rejecting unknown keys. Not validated.
pub fn parse_config(text: &str) -> Result<SiteConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Commented `config.toml` printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# org-jekyll Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the site root (the directory you run org-jekyll from,
# or the one given with --root). Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths (relative to the site root)
# ---------------------------------------------------------------------------
[paths]
# Directory holding the org documents.
source = "org"

# Published posts land here as YYYY-MM-DD-slug.<extension>.
posts = "_posts"

# Published pages land here, mirroring their path under `source`.
pages = "."

# Extension of source documents (no leading dot).
extension = "org"

# ---------------------------------------------------------------------------
# Layouts
# ---------------------------------------------------------------------------
[layouts]
# A document whose #+LAYOUT equals this value is published as a post.
post = "post"

# A document whose #+LAYOUT equals this value is published as a page.
page = "default"

# ---------------------------------------------------------------------------
# Required headers
# ---------------------------------------------------------------------------
[schema]
# "classic":  title, categories, layout, date required; tags optional.
# "extended": title, categories, layout, description required;
#             date, tags, author optional (date and author are defaulted).
preset = "classic"

# Replace the preset with an explicit ordered list:
# fields = [
#     { name = "title", required = true },
#     { name = "layout", required = true },
#     { name = "tags" },
# ]

# ---------------------------------------------------------------------------
# Header parsing
# ---------------------------------------------------------------------------
[headers]
# "skip":   a header with a blank value (#+TAGS:) counts as absent.
# "record": it counts as present with an empty value.
empty_values = "skip"

# Ignore a leading :PROPERTIES: ... :END: drawer before the headers.
skip_property_block = true

# ---------------------------------------------------------------------------
# Front matter
# ---------------------------------------------------------------------------
[front_matter]
# "inline": categories: [a,b]
# "block":  categories:
#           - a
#           - b
list_style = "inline"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel publish workers for publish-posts/publish-pages/publish-all.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_paths() {
        let config = SiteConfig::default();
        assert_eq!(config.paths.source, PathBuf::from("org"));
        assert_eq!(config.paths.posts, PathBuf::from("_posts"));
        assert_eq!(config.paths.pages, PathBuf::from("."));
        assert_eq!(config.paths.extension, "org");
    }

    #[test]
    fn default_config_layouts() {
        let config = SiteConfig::default();
        assert_eq!(config.layouts.post, "post");
        assert_eq!(config.layouts.page, "default");
    }

    #[test]
    fn default_config_schema_is_classic() {
        let config = SiteConfig::default();
        assert_eq!(config.schema(), RequiredFieldSchema::classic());
    }

    #[test]
    fn default_header_and_front_matter_settings() {
        let config = SiteConfig::default();
        assert_eq!(config.headers.empty_values, EmptyValues::Skip);
        assert!(config.headers.skip_property_block);
        assert_eq!(config.front_matter.list_style, ListStyle::Inline);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[layouts]
page = "page"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.layouts.page, "page");
        assert_eq!(config.layouts.post, "post");
        assert_eq!(config.paths.extension, "org");
    }

    #[test]
    fn parse_enum_settings() {
        let toml = r#"
[schema]
preset = "extended"

[headers]
empty_values = "record"

[front_matter]
list_style = "block"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.schema(), RequiredFieldSchema::extended());
        assert_eq!(config.headers.empty_values, EmptyValues::Record);
        assert_eq!(config.front_matter.list_style, ListStyle::Block);
    }

    #[test]
    fn explicit_schema_fields_replace_preset() {
        let toml = r#"
[schema]
preset = "extended"
fields = [
    { name = "title", required = true },
    { name = "layout", required = true },
    { name = "tags" },
]
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        let schema = config.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["title", "layout", "tags"]);
        assert!(!schema.fields()[2].required);
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.layouts.post, "post");
        assert_eq!(config.paths.posts, PathBuf::from("_posts"));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[paths]
source = "notes"
posts = "site/_posts"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.paths.source, PathBuf::from("notes"));
        assert_eq!(config.paths.posts, PathBuf::from("site/_posts"));
        // Unspecified values should be defaults
        assert_eq!(config.paths.pages, PathBuf::from("."));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "").unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.schema(), RequiredFieldSchema::classic());
        assert_eq!(config.layouts.page, "default");
        assert!(config.headers.skip_property_block);
    }

    #[test]
    fn partial_section_keeps_sibling_defaults() {
        let config = parse_config("[headers]\nempty_values = \"record\"\n").unwrap();
        assert_eq!(config.headers.empty_values, EmptyValues::Record);
        assert!(config.headers.skip_property_block);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[layouts]
page = "post"
"#,
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // Unknown key rejection / validation tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[layouts]\npots = \"x\"\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[layout]\npost = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_enum_value_rejected() {
        let result: Result<SiteConfig, _> =
            toml::from_str("[front_matter]\nlist_style = \"flow\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_empty_layout() {
        let mut config = SiteConfig::default();
        config.layouts.post = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_dotted_extension() {
        let mut config = SiteConfig::default();
        config.paths.extension = ".org".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("extension"));
    }

    #[test]
    fn validate_schema_without_layout() {
        let mut config = SiteConfig::default();
        config.schema.fields = Some(vec![SchemaField::required(FieldName::Title)]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("layout"));
    }

    #[test]
    fn validate_schema_duplicate_field() {
        let mut config = SiteConfig::default();
        config.schema.fields = Some(vec![
            SchemaField::required(FieldName::Layout),
            SchemaField::optional(FieldName::Layout),
        ]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    // =========================================================================
    // stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config = parse_config(stock_config_toml()).unwrap();
        assert_eq!(config.layouts.post, "post");
        assert_eq!(config.layouts.page, "default");
        assert_eq!(config.paths.posts, PathBuf::from("_posts"));
        assert_eq!(config.schema(), RequiredFieldSchema::classic());
        assert_eq!(config.headers.empty_values, EmptyValues::Skip);
        assert_eq!(config.front_matter.list_style, ListStyle::Inline);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in [
            "[paths]",
            "[layouts]",
            "[schema]",
            "[headers]",
            "[front_matter]",
            "[processing]",
        ] {
            assert!(content.contains(section), "missing {section}");
        }
    }
}
