//! CLI output formatting.
//!
//! Every status the pipeline produces is a single message line (or a
//! multi-line validation report). This module lays those out for the
//! terminal:
//!
//! ## Publish
//!
//! ```text
//! Post 'hello.org' published!
//!     → _posts/2020-05-01-hello.org
//! 'notes.org' is not an article, publication skipped!
//! This org-mode file is missing required header(s):
//!     - The title is required, please add '#+TITLE' at the top of your document.
//!     Publication skipped
//!     Source: org/draft.org
//!
//! Published 1, skipped 1, failed 1
//! ```
//!
//! ## Check
//!
//! ```text
//! org/hello.org
//! ---
//! layout: post
//! ...
//! ---
//! ```
//!
//! # Architecture
//!
//! `format_*` functions return `Vec<String>` for testability and are pure;
//! `print_*` wrappers write to stdout.

use crate::publish::{BulkReport, Outcome, PublishEvent};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path relative to `root` when possible, for shorter context lines.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format one dispatch outcome.
///
/// The first line is the status; continuation lines of multi-line messages
/// and context (destination or source) are indented.
pub fn format_outcome(outcome: &Outcome, file: &Path, root: &Path) -> Vec<String> {
    let status = outcome.to_string();
    let mut message = status.lines();
    let mut lines: Vec<String> = message.next().map(String::from).into_iter().collect();
    lines.extend(message.map(|l| format!("{}{}", indent(1), l)));

    match outcome {
        Outcome::Published { destination, .. } => {
            lines.push(format!("{}→ {}", indent(1), display_path(destination, root)));
        }
        Outcome::Rejected { .. } | Outcome::Failed { .. } => {
            lines.push(format!("{}Source: {}", indent(1), display_path(file, root)));
        }
        Outcome::NotAnArticle { .. } | Outcome::UnknownLayout { .. } => {}
    }
    lines
}

pub fn format_publish_event(event: &PublishEvent, root: &Path) -> Vec<String> {
    format_outcome(&event.outcome, &event.file, root)
}

/// Summary line after a bulk publish.
pub fn format_bulk_summary(report: &BulkReport) -> Vec<String> {
    if report.results.is_empty() {
        return vec!["Nothing to publish".to_string()];
    }
    vec![
        String::new(),
        format!(
            "Published {}, skipped {}, failed {}",
            report.published(),
            report.skipped(),
            report.failed()
        ),
    ]
}

/// Output of `check`: the source path followed by the front-matter block,
/// or the reader's message.
pub fn format_check(file: &Path, root: &Path, rendered: Result<&str, &str>) -> Vec<String> {
    let mut lines = vec![display_path(file, root)];
    match rendered {
        Ok(block) => lines.extend(block.trim_end().lines().map(String::from)),
        Err(message) => lines.extend(message.lines().map(|l| format!("{}{}", indent(1), l))),
    }
    lines
}

pub fn print_outcome(outcome: &Outcome, file: &Path, root: &Path) {
    for line in format_outcome(outcome, file, root) {
        println!("{}", line);
    }
}

pub fn print_bulk_summary(report: &BulkReport) {
    for line in format_bulk_summary(report) {
        println!("{}", line);
    }
}

pub fn print_check(file: &Path, root: &Path, rendered: Result<&str, &str>) {
    for line in format_check(file, root, rendered) {
        println!("{}", line);
    }
}
