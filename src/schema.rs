//! Required-field schema and header validation.
//!
//! A [`RequiredFieldSchema`] is an ordered list of fields, each either
//! required or optional. Two presets cover the historical header sets:
//!
//! | Field | `classic` | `extended` |
//! |---|---|---|
//! | title | required | required |
//! | categories | required | required |
//! | layout | required | required |
//! | date | required | optional (defaulted) |
//! | tags | optional | optional |
//! | description | - | required |
//! | author | - | optional |
//!
//! Validation is presence-only: a field present with an empty value passes.
//! Errors are reported in schema declaration order, never in document order.

use crate::types::{FieldName, HeaderMap};
use serde::{Deserialize, Serialize};

/// One schema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaField {
    #[serde(rename = "name")]
    pub field: FieldName,
    #[serde(default)]
    pub required: bool,
}

impl SchemaField {
    pub fn required(field: FieldName) -> Self {
        Self {
            field,
            required: true,
        }
    }

    pub fn optional(field: FieldName) -> Self {
        Self {
            field,
            required: false,
        }
    }
}

/// Named schema presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPreset {
    #[default]
    Classic,
    Extended,
}

/// Ordered list of known header fields and whether each is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFieldSchema {
    fields: Vec<SchemaField>,
}

impl RequiredFieldSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    pub fn preset(preset: SchemaPreset) -> Self {
        match preset {
            SchemaPreset::Classic => Self::classic(),
            SchemaPreset::Extended => Self::extended(),
        }
    }

    /// Dated posts without excerpts.
    pub fn classic() -> Self {
        Self::new(vec![
            SchemaField::required(FieldName::Title),
            SchemaField::required(FieldName::Categories),
            SchemaField::required(FieldName::Layout),
            SchemaField::required(FieldName::Date),
            SchemaField::optional(FieldName::Tags),
        ])
    }

    /// Described posts with a defaulted date and author.
    pub fn extended() -> Self {
        Self::new(vec![
            SchemaField::required(FieldName::Title),
            SchemaField::required(FieldName::Categories),
            SchemaField::required(FieldName::Layout),
            SchemaField::optional(FieldName::Date),
            SchemaField::optional(FieldName::Tags),
            SchemaField::required(FieldName::Description),
            SchemaField::optional(FieldName::Author),
        ])
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Whether the schema declares `field` at all, required or not.
    pub fn declares(&self, field: &FieldName) -> bool {
        self.fields.iter().any(|f| f.field == *field)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.iter().filter(|f| f.required).map(|f| &f.field)
    }
}

impl Default for RequiredFieldSchema {
    fn default() -> Self {
        Self::classic()
    }
}

/// Outcome of checking headers against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(HeaderMap),
    /// One error line per missing required field, in schema order.
    Invalid(Vec<String>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The errors joined into the multi-line user message. Empty when valid.
    pub fn message(&self) -> String {
        match self {
            Self::Valid(_) => String::new(),
            Self::Invalid(errors) => errors.join("\n").trim().to_string(),
        }
    }
}

/// Error line for a missing required field.
pub fn missing_field_error(field: &FieldName) -> String {
    format!(
        "- The {} is required, please add '{}' at the top of your document.",
        field,
        field.header_tag()
    )
}

/// Check that every required field is present in `headers`.
pub fn validate(headers: HeaderMap, schema: &RequiredFieldSchema) -> ValidationResult {
    let errors: Vec<String> = schema
        .required_fields()
        .filter(|field| !headers.contains(field))
        .map(missing_field_error)
        .collect();

    if errors.join("\n").trim().is_empty() {
        ValidationResult::Valid(headers)
    } else {
        ValidationResult::Invalid(errors)
    }
}
