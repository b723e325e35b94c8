//! Front-matter rendering.
//!
//! ```text
//! ---
//! layout: post
//! title: Hello World
//! categories: [tech,life]
//! ---
//!
//! ```
//!
//! Values are written verbatim; [`Metadata`] already holds YAML-ready
//! encodings. Block-style lists carry their own leading newline, so their
//! key line ends at the colon.

use crate::types::Metadata;

pub const FRONT_MATTER_DELIMITER: &str = "---";

/// Render metadata as a front-matter block, entries in metadata order.
pub fn render(metadata: &Metadata) -> String {
    let mut block = String::new();
    block.push_str(FRONT_MATTER_DELIMITER);
    block.push('\n');
    for (field, value) in metadata.entries() {
        if value.starts_with('\n') {
            block.push_str(&format!("{field}:{value}\n"));
        } else {
            block.push_str(&format!("{field}: {value}\n"));
        }
    }
    block.push_str(FRONT_MATTER_DELIMITER);
    block.push_str("\n\n");
    block
}
