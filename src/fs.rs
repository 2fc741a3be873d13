//! Filesystem collaborator for the template engine.
//!
//! The renderer only ever reads: [`FileSystem::read_one_line`] backs the
//! `withfile` command and [`FileSystem::read_lines`] loads whole sources.
//! Production code uses [`OsFileSystem`]; unit tests use the generated
//! `MockFileSystem`.

use std::io;
use std::path::Path;

/// Read-only access to files, injected into a render.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem: Send + Sync {
    /// Read every line of `path`, without line terminators.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or is not valid UTF-8.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Read the first line of `path`, without its line terminator.
    ///
    /// An empty file yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or is not valid UTF-8.
    fn read_one_line(&self, path: &Path) -> io::Result<String>;
}

/// Production [`FileSystem`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let content = std::fs::read_to_string(path)?;
        Ok(content.lines().map(str::to_string).collect())
    }

    fn read_one_line(&self, path: &Path) -> io::Result<String> {
        let content = std::fs::read_to_string(path)?;
        Ok(content.lines().next().unwrap_or_default().to_string())
    }
}
