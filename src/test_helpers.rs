//! Shared test utilities for the org-jekyll test suite.
//!
//! Provides document/site fixture writers, a pinned clock, and a recording
//! [`Publisher`] mock.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let site = site_fixture(tmp.path(), &[("org/hello.org", "#+LAYOUT: post\n")]);
//! let publisher = MockPublisher::new();
//! // ... dispatch ...
//! assert_eq!(publisher.calls(), vec![RecordedCall::Post(site.join("org/hello.org"))]);
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::publish::{PublishError, Publisher};
use crate::types::Metadata;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `content` to `dir/name` and return the path.
pub fn write_doc(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Lay out a site under `root`: each `(relative path, content)` is written.
/// Returns `root` for chaining joins.
pub fn site_fixture(root: &Path, files: &[(&str, &str)]) -> PathBuf {
    for (rel, content) in files {
        write_doc(root, rel, content);
    }
    root.to_path_buf()
}

/// Fixed "now": Friday 2026-10-16 09:45.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .and_then(|d| d.and_hms_opt(9, 45, 0))
        .unwrap()
}

// =========================================================================
// Mock publisher
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Post(PathBuf),
    Page(PathBuf),
}

/// Publisher that records calls without writing anything.
/// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
pub struct MockPublisher {
    calls: Mutex<Vec<RecordedCall>>,
    fail: bool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A publisher whose every call fails with an IO error.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall, path: &Path) -> Result<PathBuf, PublishError> {
        if self.fail {
            return Err(PublishError::Io(std::io::Error::other("disk full")));
        }
        self.calls.lock().unwrap().push(call);
        Ok(PathBuf::from("published").join(path.file_name().unwrap()))
    }
}

impl Publisher for MockPublisher {
    fn publish_post(&self, _metadata: &Metadata, path: &Path) -> Result<PathBuf, PublishError> {
        self.record(RecordedCall::Post(path.to_path_buf()), path)
    }

    fn publish_page(&self, _metadata: &Metadata, path: &Path) -> Result<PathBuf, PublishError> {
        self.record(RecordedCall::Page(path.to_path_buf()), path)
    }
}
