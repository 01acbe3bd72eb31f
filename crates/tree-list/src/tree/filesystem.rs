//! Filesystem source with lazy directory listing

use anyhow::{ensure, Context};
use log::{trace, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::tree::source::{SourceAdapter, SourceItem};
use crate::tree::NodeRef;

/// Whether an entry can have children
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// Metadata for filesystem nodes
#[derive(Debug, Clone, PartialEq)]
pub struct FileData {
    /// File name (last path component)
    pub name: String,
    /// Full path on the filesystem
    pub path: PathBuf,
    pub kind: EntryKind,
    /// File size in bytes (0 for directories)
    pub size: u64,
    /// Last modified timestamp
    pub modified: Option<SystemTime>,
    /// File extension (if any)
    pub extension: Option<String>,
}

impl FileData {
    fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let extension = match kind {
            EntryKind::File => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|s| s.to_string()),
            EntryKind::Directory => None,
        };

        Ok(Self {
            name,
            path: path.to_path_buf(),
            kind,
            size: if kind == EntryKind::File { metadata.len() } else { 0 },
            modified: metadata.modified().ok(),
            extension,
        })
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    fn item(&self) -> SourceItem<FileData> {
        SourceItem::new(self.path.display().to_string(), self.clone())
    }
}

impl fmt::Display for FileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Directory => write!(f, "{}/", self.name),
            EntryKind::File => write!(f, "{} ({} bytes)", self.name, self.size),
        }
    }
}

/// A source listing one or more directories
///
/// Each directory is a root. A directory is read the first time the store
/// asks about its children and the listing is kept until [`refresh`] is
/// called. Directories sort before files, then alphabetically.
///
/// Node identities are full paths, so overlapping roots would collide and
/// the store drops the duplicates.
///
/// [`refresh`]: FilesystemSource::refresh
///
/// # Example
///
/// ```ignore
/// let source = FilesystemSource::new("./src")?;
/// let mut store = TreeStore::with_options(source, TreeOptions::new().lazy());
/// store.load_roots();
/// ```
pub struct FilesystemSource {
    roots: Vec<FileData>,
    /// Sorted directory listings, by directory path
    listings: Mutex<HashMap<PathBuf, Vec<FileData>>>,
}

impl FilesystemSource {
    /// Create a source rooted at a single directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't exist or isn't a directory.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::with_roots([path])
    }

    /// Create a source with one root per directory
    pub fn with_roots<I>(paths: I) -> anyhow::Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut roots = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let data = FileData::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ensure!(data.is_dir(), "{} is not a directory", path.display());
            roots.push(data);
        }

        Ok(Self {
            roots,
            listings: Mutex::new(HashMap::new()),
        })
    }

    /// Forget cached listings so the next load reads the disk again
    pub fn refresh(&self) {
        self.listings.lock().clear();
    }

    /// Root directories, in root order
    pub fn root_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.roots.iter().map(|root| root.path.as_path())
    }

    fn with_listing<T>(&self, dir: &FileData, f: impl FnOnce(&[FileData]) -> T) -> T {
        let mut listings = self.listings.lock();
        let listing = listings
            .entry(dir.path.clone())
            .or_insert_with(|| match read_listing(&dir.path) {
                Ok(entries) => {
                    trace!("Listed {} entries in {}", entries.len(), dir.path.display());
                    entries
                }
                Err(e) => {
                    warn!("Failed to list {}: {}", dir.path.display(), e);
                    Vec::new()
                }
            });
        f(listing)
    }
}

/// Read a directory: directories first, then files, alphabetically within each group
fn read_listing(path: &Path) -> std::io::Result<Vec<FileData>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        match FileData::from_path(&entry.path()) {
            Ok(data) => entries.push(data),
            // Broken symlinks and races with deletion
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }
    entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

impl SourceAdapter for FilesystemSource {
    type Payload = FileData;

    fn root_count(&self) -> usize {
        self.roots.len()
    }

    fn root(&self, root_index: usize) -> Option<SourceItem<FileData>> {
        self.roots.get(root_index).map(FileData::item)
    }

    fn child_count(&self, parent: &NodeRef<'_, FileData>, _root_index: usize) -> usize {
        if !parent.payload.is_dir() {
            return 0;
        }
        self.with_listing(parent.payload, <[FileData]>::len)
    }

    fn child(
        &self,
        index: usize,
        parent: &NodeRef<'_, FileData>,
        _root_index: usize,
    ) -> Option<SourceItem<FileData>> {
        if !parent.payload.is_dir() {
            return None;
        }
        self.with_listing(parent.payload, |listing| listing.get(index).map(FileData::item))
    }
}
