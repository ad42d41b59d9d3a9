//! File fetcher seam.
//!
//! The loader's only I/O boundary: it asks a [`FileFetcher`] for the text
//! of each `.ndl` file it needs. Apps provide their own implementation;
//! [`MemoryFetcher`] covers tests and embedded content, [`DirFetcher`]
//! reads from a root directory.

use hashbrown::HashMap;
use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

/// Source of `.ndl` file contents, keyed by the filename derived from the
/// imported namespace (`game.units` → `game/units.ndl`).
pub trait FileFetcher: Debug {
    /// Fetch one file's text.
    ///
    /// Returns `io::ErrorKind::NotFound` if there is no such file; any
    /// error is fatal to the load and reported at the import that
    /// requested the file.
    fn fetch(&self, filename: &str) -> io::Result<String>;
}

/// In-memory fetcher for tests and embedded content.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style file registration.
    pub fn with_file(mut self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(filename.into(), content.into());
        self
    }

    /// Register a file.
    pub fn insert(&mut self, filename: impl Into<String>, content: impl Into<String>) {
        self.files.insert(filename.into(), content.into());
    }
}

impl FileFetcher for MemoryFetcher {
    fn fetch(&self, filename: &str) -> io::Result<String> {
        self.files.get(filename).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {filename}"),
            )
        })
    }
}

/// Filesystem fetcher rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileFetcher for DirFetcher {
    fn fetch(&self, filename: &str) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fetcher() {
        let fetcher = MemoryFetcher::new().with_file("a.ndl", "A():\n    pass\n");
        assert!(fetcher.fetch("a.ndl").is_ok());
        let err = fetcher.fetch("missing.ndl").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
