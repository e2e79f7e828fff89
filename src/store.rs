//! Disk-backed artifact store
//!
//! Every artifact is a file `<page id>.<ext>` in the directory bound to its
//! [`ContentKind`]. Existence of that file is the only record that a stage
//! finished for a page; there is no manifest.

use crate::config::StorageConfig;
use crate::error::{NavigationError, Result, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Cache key for one page, derived from its URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Derive the id from the second-to-last `/`-separated segment of `url`.
    ///
    /// `https://example.com/pages/abc123/` gives `abc123`; without the
    /// trailing slash the same rule gives `pages`.
    pub fn from_url(url: &str) -> Result<Self> {
        let segment = url
            .trim()
            .rsplit('/')
            .nth(1)
            .ok_or_else(|| NavigationError::InvalidUrl(format!("no path segments in {url:?}")))?;
        Self::new(segment)
            .map_err(|reason| NavigationError::InvalidUrl(format!("{url:?}: {reason}")).into())
    }

    /// Wrap an existing stem, rejecting names that cannot be a plain file stem
    pub fn new<S: Into<String>>(stem: S) -> std::result::Result<Self, String> {
        let stem = stem.into();
        if stem.is_empty() {
            return Err("empty page identifier".to_string());
        }
        if stem == "." || stem == ".." || stem.contains(['/', '\\', '\0']) {
            return Err(format!("page identifier {stem:?} is not a file name"));
        }
        Ok(Self(stem))
    }

    /// Borrow as str
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two artifact categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// DOM markup copied out of the browser
    RenderedHtml,
    /// Selector-scoped plain text
    ExtractedText,
}

impl ContentKind {
    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ContentKind::RenderedHtml => "html",
            ContentKind::ExtractedText => "txt",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::RenderedHtml => f.write_str("rendered HTML"),
            ContentKind::ExtractedText => f.write_str("extracted text"),
        }
    }
}

/// Handle to one stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Page the artifact belongs to
    pub id: PageId,
    /// Its category
    pub kind: ContentKind,
    /// Full path on disk
    pub path: PathBuf,
}

/// Maps (page id, kind) to files and owns directory creation
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    html_dir: PathBuf,
    text_dir: PathBuf,
}

impl ArtifactStore {
    /// Bind each kind to its directory, checking the mapping is usable
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if config.html_dir == config.text_dir {
            return Err(StorageError::SharedDirectory(config.html_dir.clone()).into());
        }
        for dir in [&config.html_dir, &config.text_dir] {
            if dir.exists() && !dir.is_dir() {
                return Err(StorageError::NotADirectory(dir.clone()).into());
            }
        }
        Ok(Self {
            html_dir: config.html_dir.clone(),
            text_dir: config.text_dir.clone(),
        })
    }

    /// Directory bound to `kind`
    pub fn dir(&self, kind: ContentKind) -> &Path {
        match kind {
            ContentKind::RenderedHtml => &self.html_dir,
            ContentKind::ExtractedText => &self.text_dir,
        }
    }

    /// Final path of an artifact, whether or not it exists
    pub fn path(&self, id: &PageId, kind: ContentKind) -> PathBuf {
        self.dir(kind)
            .join(format!("{}.{}", id.as_str(), kind.extension()))
    }

    /// Whether the artifact exists; a missing directory counts as empty
    pub fn exists(&self, id: &PageId, kind: ContentKind) -> bool {
        self.path(id, kind).is_file()
    }

    /// Write an artifact, creating its directory on first use.
    ///
    /// Content goes to a dot-prefixed temp file that is renamed over the
    /// final name, so readers never observe a half-written artifact.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub fn write(&self, id: &PageId, kind: ContentKind, content: &str) -> Result<PathBuf> {
        let dir = self.dir(kind);
        fs::create_dir_all(dir).map_err(|source| StorageError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = self.path(id, kind);
        let tmp = dir.join(format!(".{}.{}.tmp", id.as_str(), kind.extension()));
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        fs::rename(&tmp, &path).map_err(write_err)?;

        debug!("Wrote {} for {} to {}", kind, id, path.display());
        Ok(path)
    }

    /// Read an artifact; invalid UTF-8 is replaced rather than rejected
    pub fn read(&self, artifact: &Artifact) -> Result<String> {
        let bytes = fs::read(&artifact.path).map_err(|source| StorageError::Read {
            path: artifact.path.clone(),
            source,
        })?;
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }

    /// Lazily enumerate every artifact of `kind`.
    ///
    /// A missing directory yields nothing. Entries that cannot be read, have
    /// another extension, or have a stem that is not a valid [`PageId`] are
    /// skipped. In-flight temp files end in `.tmp` and never match.
    pub fn list(&self, kind: ContentKind) -> Result<impl Iterator<Item = Artifact>> {
        let dir = self.dir(kind);
        let entries = match fs::read_dir(dir) {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(StorageError::Directory {
                    path: dir.to_path_buf(),
                    source,
                }
                .into())
            }
        };

        Ok(entries
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(move |entry| {
                let path = entry.path();
                if path.extension()?.to_str()? != kind.extension() {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?;
                let id = PageId::new(stem).ok()?;
                Some(Artifact { id, kind, path })
            }))
    }
}
