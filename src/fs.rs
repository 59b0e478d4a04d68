//! Filesystem capability used for migration discovery and scaffolding
//!
//! The migrator only ever lists one directory, opens files in it, and (for
//! `create`) writes a new file. [`OsFileSystem`] does that against a base
//! directory on disk; [`MemoryFileSystem`] keeps everything in memory so
//! migrations can be embedded or tested without touching the disk.

use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};

/// Metadata for one directory entry, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Entry name (no directory part)
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, when the backend knows it
    pub modified: Option<DateTime<Utc>>,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// Minimal filesystem capability
pub trait FileSystem {
    /// List the immediate children of `dir`, sorted by name
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `dir` does not exist or cannot be listed.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FileMeta>>;

    /// Open a file for reading; dropping the reader closes it
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file does not exist or cannot be opened.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Create `dir` and any missing parents
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Write a new file, failing with `AlreadyExists` if it is present
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists or cannot be written.
    fn write_new(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// `FileSystem` over the real disk, resolving relative paths against `base`
#[derive(Debug, Clone)]
pub struct OsFileSystem {
    base: PathBuf,
}

impl OsFileSystem {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    /// Filesystem rooted at the process working directory
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    /// Resolve `path` against the base directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

impl FileSystem for OsFileSystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FileMeta>> {
        let mut entries: Vec<FileMeta> = fs::read_dir(self.resolve(dir))?
            .filter_map(|entry| match entry {
                Ok(entry) => file_meta(
                    entry.file_name().to_string_lossy().into_owned(),
                    entry.metadata(),
                ),
                Err(e) => {
                    log::warn!("skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(fs::File::open(self.resolve(path))?))
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(dir))
    }

    fn write_new(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.resolve(path))?;
        file.write_all(contents.as_bytes())
    }
}

/// Entries that vanish or cannot be stat'ed between listing and lookup are
/// skipped, not fatal to the whole listing
fn file_meta(name: String, meta: io::Result<fs::Metadata>) -> Option<FileMeta> {
    match meta {
        Ok(meta) => Some(FileMeta {
            name,
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            is_dir: meta.is_dir(),
        }),
        Err(e) => {
            log::warn!("skipping {}: {}", name, e);
            None
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    File { contents: Vec<u8>, modified: DateTime<Utc> },
    Dir,
}

/// In-memory `FileSystem`
///
/// Paths are normalised (`.` components dropped, no leading `./`), so
/// `migrations/1-a.sql` and `./migrations/1-a.sql` name the same file. The
/// root (`.` or an empty path) always exists. Not thread-safe; the migrator
/// is single-threaded anyway.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file, creating its parent directories
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        self.insert_parents(&path);
        self.nodes.borrow_mut().insert(
            path,
            Node::File {
                contents: contents.into(),
                modified: Utc::now(),
            },
        );
    }

    /// Builder form of [`insert`](Self::insert)
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Contents of a file as UTF-8, if present
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.nodes.borrow().get(&normalize(path.as_ref())) {
            Some(Node::File { contents, .. }) => Some(String::from_utf8_lossy(contents).into_owned()),
            _ => None,
        }
    }

    /// Paths of every file, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        self.nodes
            .borrow()
            .iter()
            .filter(|(_, node)| matches!(node, Node::File { .. }))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn insert_parents(&self, path: &Path) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FileMeta>> {
        let dir = normalize(dir);
        let nodes = self.nodes.borrow();
        match nodes.get(&dir) {
            _ if dir.as_os_str().is_empty() => {}
            Some(Node::Dir) => {}
            Some(Node::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is not a directory", dir.display()),
                ))
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory {} not found", dir.display()),
                ))
            }
        }

        // BTreeMap iteration is ordered, so the listing comes out sorted by name
        let entries = nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir.as_path()))
            .map(|(path, node)| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match node {
                    Node::File { contents, modified } => FileMeta {
                        name,
                        size: contents.len() as u64,
                        modified: Some(*modified),
                        is_dir: false,
                    },
                    Node::Dir => FileMeta {
                        name,
                        size: 0,
                        modified: None,
                        is_dir: true,
                    },
                }
            })
            .collect();
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let path = normalize(path);
        match self.nodes.borrow().get(&path) {
            Some(Node::File { contents, .. }) => Ok(Box::new(Cursor::new(contents.clone()))),
            Some(Node::Dir) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file {} not found", path.display()),
            )),
        }
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let dir = normalize(dir);
        if let Some(Node::File { .. }) = self.nodes.borrow().get(&dir) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", dir.display()),
            ));
        }
        self.insert_parents(&dir.join("_"));
        Ok(())
    }

    fn write_new(&self, path: &Path, contents: &str) -> io::Result<()> {
        let path = normalize(path);
        if self.nodes.borrow().contains_key(&path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) if !matches!(self.nodes.borrow().get(parent), Some(Node::Dir)) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory {} not found", parent.display()),
                ));
            }
            _ => {}
        }
        self.insert(&path, contents.as_bytes().to_vec());
        Ok(())
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
