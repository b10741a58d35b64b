//! Table rows and their mapping onto file / directory metadata

use crate::{DbError, Result};
use rusqlite::Row;
use tablefs_fs::{
    DirectoryAttributes, FileAttributes, PathPrefixer, StorageAttributes, Visibility, SEPARATOR,
};

/// Value of the `type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Directory => "dir",
        }
    }
}

/// Metadata columns selected by every lookup, in `StoredRecord::from_row` order
pub(crate) const METADATA_COLUMNS: &str = "path, type, visibility, size, mimetype, timestamp";

/// One row of the entries table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Storage path (prefixed)
    pub path: String,
    /// Raw `type` column; validated when mapped
    pub entry_type: String,
    pub visibility: Option<String>,
    pub size: Option<i64>,
    pub mimetype: Option<String>,
    pub timestamp: i64,
    /// Only loaded when asked for
    pub contents: Option<Vec<u8>>,
}

impl StoredRecord {
    /// Build from a row selected with `METADATA_COLUMNS` (optionally followed
    /// by `contents`)
    pub(crate) fn from_row(row: &Row<'_>, with_contents: bool) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            entry_type: row.get(1)?,
            visibility: row.get(2)?,
            size: row.get(3)?,
            mimetype: row.get(4)?,
            timestamp: row.get(5)?,
            contents: if with_contents { row.get(6)? } else { None },
        })
    }

    /// Map onto the caller-facing metadata shape
    pub fn normalize(&self, prefixer: &PathPrefixer) -> Result<StorageAttributes> {
        let path = prefixer.strip_prefix(&self.path);
        let visibility = self.parse_visibility()?;

        match self.entry_type.as_str() {
            "file" => Ok(StorageAttributes::File(FileAttributes {
                path,
                file_size: Some(self.size.unwrap_or(0).max(0) as u64),
                visibility,
                last_modified: Some(self.timestamp),
                mime_type: self.mimetype.clone(),
            })),
            "dir" => Ok(StorageAttributes::Directory(DirectoryAttributes {
                path,
                visibility,
                last_modified: Some(self.timestamp),
            })),
            other => Err(DbError::UnknownEntryType(other.to_string())),
        }
    }

    /// Map a row already known to be a file
    pub fn normalize_file(&self, prefixer: &PathPrefixer) -> Result<FileAttributes> {
        match self.normalize(prefixer)? {
            StorageAttributes::File(file) => Ok(file),
            StorageAttributes::Directory(_) => {
                Err(DbError::UnknownEntryType(self.entry_type.clone()))
            }
        }
    }

    fn parse_visibility(&self) -> Result<Option<Visibility>> {
        match self.visibility.as_deref() {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| DbError::InvalidVisibility(value.to_string())),
        }
    }
}

/// Nesting level of a storage path: its separator count
pub fn directory_level(path: &str) -> i64 {
    path.matches(SEPARATOR).count() as i64
}
