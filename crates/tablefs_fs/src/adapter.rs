//! The abstract filesystem contract

use crate::{Config, DirectoryListing, FileAttributes, Result};
use std::io::Read;

/// Filesystem operations every storage adapter provides
///
/// Paths are logical paths relative to the adapter's root. Deleting something
/// that does not exist succeeds; reading metadata of something that does not
/// exist fails.
pub trait FilesystemAdapter: Send + Sync {
    /// Does a file exist at `path`?
    fn file_exists(&self, path: &str) -> Result<bool>;

    /// Does a directory exist at `path`?
    fn directory_exists(&self, path: &str) -> Result<bool>;

    /// Create or overwrite a file, creating missing parent directories
    fn write(&self, path: &str, contents: &[u8], config: &Config) -> Result<()>;

    /// Like `write`, draining `contents` first
    fn write_stream(&self, path: &str, contents: &mut dyn Read, config: &Config) -> Result<()>;

    /// Read a whole file
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Open a file for reading
    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Delete a file; no-op if it does not exist
    fn delete(&self, path: &str) -> Result<()>;

    /// Delete a directory and everything below it; no-op if it does not exist
    fn delete_directory(&self, path: &str) -> Result<()>;

    /// Create a directory and its parents; no-op for existing directories
    fn create_directory(&self, path: &str, config: &Config) -> Result<()>;

    /// Set visibility; `visibility` must be `public` or `private`
    fn set_visibility(&self, path: &str, visibility: &str) -> Result<()>;

    fn visibility(&self, path: &str) -> Result<FileAttributes>;

    fn mime_type(&self, path: &str) -> Result<FileAttributes>;

    fn last_modified(&self, path: &str) -> Result<FileAttributes>;

    fn file_size(&self, path: &str) -> Result<FileAttributes>;

    /// List entries below `path`, ordered by path
    ///
    /// `deep` selects all descendants instead of direct children.
    fn list_contents(&self, path: &str, deep: bool) -> DirectoryListing;

    /// Move a file, overwriting the destination
    fn move_file(&self, source: &str, destination: &str, config: &Config) -> Result<()>;

    /// Copy a file, overwriting the destination
    fn copy(&self, source: &str, destination: &str, config: &Config) -> Result<()>;
}
