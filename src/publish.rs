//! Publishing: routing documents to post or page output.
//!
//! [`Dispatcher::dispatch`] decides what happens to one document:
//!
//! 1. Read the raw `#+LAYOUT` header. No layout → not an article, skipped.
//! 2. Run the [`MetadataReader`]. Errors become the final status.
//! 3. Classify the *validated* layout and hand the metadata to the
//!    [`Publisher`] as a post or page.
//!
//! Every outcome is a status line ([`Outcome`]'s `Display`); nothing is
//! written for a document that fails validation.
//!
//! ## Collaborators
//!
//! The publish step and the document index sit behind traits so tests can
//! record calls instead of touching the site tree:
//!
//! - [`Publisher`]: writes a post or page. [`FsPublisher`] prepends the front
//!   matter to the document body and writes it under the site's posts or
//!   pages directory.
//! - [`ProjectIndex`]: lists the documents with a given layout. [`FsIndex`]
//!   walks the source directory.
//!
//! ## Bulk publishing
//!
//! [`Dispatcher::publish_all`] dispatches a file list in parallel using
//! [rayon](https://docs.rs/rayon). Each file is independent: one failure
//! never stops the others, and results come back in no particular order.

use crate::config::{LayoutsConfig, SiteConfig};
use crate::header::{ParseOptions, parse_headers, split_body};
use crate::naming::post_file_name;
use crate::reader::MetadataReader;
use crate::render::render;
use crate::transcode::{TimestampError, TimestampMode, convert_timestamp};
use crate::types::{FieldName, Metadata};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid date: {0}")]
    Timestamp(#[from] TimestampError),
    #[error("Metadata has no date")]
    MissingDate,
    #[error("{} is outside the source directory {}", path.display(), source_dir.display())]
    OutsideSource { path: PathBuf, source_dir: PathBuf },
    #[error("{} is already published from another document", .0.display())]
    DestinationTaken(PathBuf),
}

/// Document kind decided by its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Post,
    Page,
    Neither,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => f.write_str("Post"),
            Self::Page => f.write_str("Page"),
            Self::Neither => f.write_str("Neither"),
        }
    }
}

/// Exact-match a layout value against the configured layout names.
pub fn classify(layout: &str, layouts: &LayoutsConfig) -> LayoutKind {
    if layout == layouts.post {
        LayoutKind::Post
    } else if layout == layouts.page {
        LayoutKind::Page
    } else {
        LayoutKind::Neither
    }
}

/// Writes published documents.
pub trait Publisher: Sync {
    /// Publish a post. Returns the destination path.
    fn publish_post(&self, metadata: &Metadata, path: &Path) -> Result<PathBuf, PublishError>;

    /// Publish a page. Returns the destination path.
    fn publish_page(&self, metadata: &Metadata, path: &Path) -> Result<PathBuf, PublishError>;
}

/// Finds documents to publish.
pub trait ProjectIndex {
    /// Every document whose raw `#+LAYOUT` equals `layout_name`. A document
    /// that can't be read does not stop the listing.
    fn list_base_files(&self, layout_name: &str) -> Result<Vec<PathBuf>, PublishError>;
}

/// Result of dispatching one document. `Display` is the status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Published {
        kind: LayoutKind,
        name: String,
        destination: PathBuf,
    },
    NotAnArticle {
        name: String,
    },
    UnknownLayout {
        name: String,
        layout: String,
    },
    /// The metadata reader refused the document; holds its message.
    Rejected {
        name: String,
        message: String,
    },
    Failed {
        name: String,
        error: String,
    },
}

impl Outcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::NotAnArticle { .. } | Self::UnknownLayout { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published { kind, name, .. } => write!(f, "{kind} '{name}' published!"),
            Self::NotAnArticle { name } => {
                write!(f, "'{name}' is not an article, publication skipped!")
            }
            Self::UnknownLayout { name, layout } => write!(
                f,
                "'{name}' has unknown layout '{layout}', publication skipped!"
            ),
            Self::Rejected { message, .. } => f.write_str(message),
            Self::Failed { name, error } => write!(f, "Publication of '{name}' failed: {error}"),
        }
    }
}

/// Progress event emitted once per file during a bulk publish.
#[derive(Debug, Clone)]
pub struct PublishEvent {
    pub file: PathBuf,
    pub outcome: Outcome,
}

/// Per-file results of a bulk publish.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub results: Vec<(PathBuf, Outcome)>,
}

impl BulkReport {
    pub fn published(&self) -> usize {
        self.results.iter().filter(|(_, o)| o.is_published()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|(_, o)| o.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|(_, o)| o.is_failure()).count()
    }
}

/// Routes documents through the reader to a [`Publisher`].
pub struct Dispatcher<P: Publisher> {
    layouts: LayoutsConfig,
    reader: MetadataReader,
    publisher: P,
}

impl<P: Publisher> Dispatcher<P> {
    pub fn new(config: &SiteConfig, reader: MetadataReader, publisher: P) -> Self {
        Self {
            layouts: config.layouts.clone(),
            reader,
            publisher,
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn classify(&self, layout: &str) -> LayoutKind {
        classify(layout, &self.layouts)
    }

    /// Publish one document and report its status.
    pub fn dispatch(&self, path: &Path) -> Outcome {
        let name = display_name(path);

        let raw_layout = match read_raw_layout(path, self.reader.parse_options()) {
            Ok(Some(layout)) => layout,
            Ok(None) => return Outcome::NotAnArticle { name },
            Err(e) => {
                return Outcome::Failed {
                    name,
                    error: e.to_string(),
                };
            }
        };

        let metadata = match self.reader.read_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                return Outcome::Rejected {
                    name,
                    message: e.to_string(),
                };
            }
        };

        let layout = metadata.layout().unwrap_or(raw_layout.as_str());
        let kind = self.classify(layout);
        let published = match kind {
            LayoutKind::Post => self.publisher.publish_post(&metadata, path),
            LayoutKind::Page => self.publisher.publish_page(&metadata, path),
            LayoutKind::Neither => {
                return Outcome::UnknownLayout {
                    name,
                    layout: layout.to_string(),
                };
            }
        };

        match published {
            Ok(destination) => Outcome::Published {
                kind,
                name,
                destination,
            },
            Err(e) => Outcome::Failed {
                name,
                error: e.to_string(),
            },
        }
    }

    /// Dispatch every file in parallel, streaming one event per file.
    pub fn publish_all(&self, files: &[PathBuf], events: Option<Sender<PublishEvent>>) -> BulkReport {
        let results = files
            .par_iter()
            .map_with(events, |events, file| {
                let outcome = self.dispatch(file);
                if let Some(tx) = events {
                    // A dropped receiver only loses progress output.
                    let _ = tx.send(PublishEvent {
                        file: file.clone(),
                        outcome: outcome.clone(),
                    });
                }
                (file.clone(), outcome)
            })
            .collect();
        BulkReport { results }
    }

    /// Publish every document the index lists under the layout for `kind`.
    pub fn publish_kind(
        &self,
        index: &impl ProjectIndex,
        kind: LayoutKind,
        events: Option<Sender<PublishEvent>>,
    ) -> Result<BulkReport, PublishError> {
        let layout = match kind {
            LayoutKind::Post => &self.layouts.post,
            LayoutKind::Page => &self.layouts.page,
            LayoutKind::Neither => return Ok(BulkReport::default()),
        };
        let files = index.list_base_files(layout)?;
        Ok(self.publish_all(&files, events))
    }
}

/// File name used in status messages.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// The raw layout header, without validation. A missing file has none.
fn read_raw_layout(path: &Path, options: &ParseOptions) -> Result<Option<String>, PublishError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(parse_headers(&text, options)
        .get(&FieldName::Layout)
        .map(str::to_string))
}

// =============================================================================
// Filesystem collaborators
// =============================================================================

/// Writes front matter + document body into the site tree.
///
/// ```text
/// <root>/<posts>/YYYY-MM-DD-<slug>.<ext>          posts, flat
/// <root>/<pages>/<path under source>/<stem>.<ext>  pages, mirrored
/// ```
///
/// Each destination is written at most once per publisher. Two documents
/// that resolve to the same file (`a/hello.org` and `b/hello.org` on the
/// same date) can't both be published: the first to claim the path wins and
/// the rest fail with [`PublishError::DestinationTaken`].
#[derive(Debug)]
pub struct FsPublisher {
    source_dir: PathBuf,
    posts_dir: PathBuf,
    pages_dir: PathBuf,
    extension: String,
    parse: ParseOptions,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl FsPublisher {
    pub fn new(root: &Path, config: &SiteConfig) -> Self {
        Self {
            source_dir: root.join(&config.paths.source),
            posts_dir: root.join(&config.paths.posts),
            pages_dir: root.join(&config.paths.pages),
            extension: config.paths.extension.clone(),
            parse: ParseOptions::from_site_config(config),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Reserve `destination` for this run.
    fn claim(&self, destination: &Path) -> Result<(), PublishError> {
        // A poisoned lock still holds a valid set.
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        if claimed.insert(destination.to_path_buf()) {
            Ok(())
        } else {
            Err(PublishError::DestinationTaken(destination.to_path_buf()))
        }
    }

    fn write(&self, metadata: &Metadata, source: &Path, destination: &Path) -> Result<(), PublishError> {
        let text = fs::read_to_string(source)?;
        let body = split_body(&text, &self.parse);
        self.claim(destination)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, format!("{}{}", render(metadata), body))?;
        Ok(())
    }
}

impl Publisher for FsPublisher {
    fn publish_post(&self, metadata: &Metadata, path: &Path) -> Result<PathBuf, PublishError> {
        let date = metadata.date().ok_or(PublishError::MissingDate)?;
        let day = convert_timestamp(date, TimestampMode::DateOnly)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = post_file_name(&day, &stem, metadata.title(), &self.extension);
        let destination = self.posts_dir.join(file_name);
        self.write(metadata, path, &destination)?;
        Ok(destination)
    }

    fn publish_page(&self, metadata: &Metadata, path: &Path) -> Result<PathBuf, PublishError> {
        let relative =
            relative_to(path, &self.source_dir).ok_or_else(|| PublishError::OutsideSource {
                path: path.to_path_buf(),
                source_dir: self.source_dir.clone(),
            })?;
        let destination = self.pages_dir.join(relative).with_extension(&self.extension);
        self.write(metadata, path, &destination)?;
        Ok(destination)
    }
}

/// `path` relative to `base`, comparing canonical forms when the literal
/// prefix differs (`org/a.org` vs `./org`).
fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(base) {
        return Some(rel.to_path_buf());
    }
    let path = path.canonicalize().ok()?;
    let base = base.canonicalize().ok()?;
    path.strip_prefix(&base).ok().map(Path::to_path_buf)
}

/// Lists source documents by walking the source directory.
///
/// Hidden files and directories are ignored.
#[derive(Debug, Clone)]
pub struct FsIndex {
    source_dir: PathBuf,
    extension: String,
    parse: ParseOptions,
}

impl FsIndex {
    pub fn new(root: &Path, config: &SiteConfig) -> Self {
        Self {
            source_dir: root.join(&config.paths.source),
            extension: config.paths.extension.clone(),
            parse: ParseOptions::from_site_config(config),
        }
    }

    /// Every source document, regardless of layout, sorted by path.
    pub fn documents(&self) -> Result<Vec<PathBuf>, PublishError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.source_dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
        for entry in walker {
            let entry = entry?;
            let is_document = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
            if is_document {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl ProjectIndex for FsIndex {
    fn list_base_files(&self, layout_name: &str) -> Result<Vec<PathBuf>, PublishError> {
        let mut matching = Vec::new();
        for file in self.documents()? {
            // Unreadable documents can't be matched; they are not listed.
            if let Ok(Some(layout)) = read_raw_layout(&file, &self.parse)
                && layout == layout_name
            {
                matching.push(file);
            }
        }
        Ok(matching)
    }
}
