//! File and directory metadata shapes returned by adapters

use crate::FsError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Two-state access flag stored per entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    #[serde(rename = "public")]
    Public,
    #[serde(rename = "private")]
    Private,
}

impl Visibility {
    pub const ALL: [Visibility; 2] = [Visibility::Public, Visibility::Private];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Comma separated list of accepted values, for error messages
    pub fn expected() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for Visibility {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(FsError::InvalidVisibility {
                value: s.to_string(),
                expected: Self::expected(),
            }),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of a stored file
///
/// Metadata calls fill in what they know; `mime_type` for instance only
/// carries the path and the MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Logical path (prefix stripped)
    pub path: String,

    /// Content length in bytes
    pub file_size: Option<u64>,

    pub visibility: Option<Visibility>,

    /// Unix seconds
    pub last_modified: Option<i64>,

    pub mime_type: Option<String>,
}

impl FileAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_size: None,
            visibility: None,
            last_modified: None,
            mime_type: None,
        }
    }
}

/// Metadata of a stored directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryAttributes {
    /// Logical path (prefix stripped)
    pub path: String,

    pub visibility: Option<Visibility>,

    /// Unix seconds
    pub last_modified: Option<i64>,
}

/// One listing entry: either a file or a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageAttributes {
    File(FileAttributes),
    #[serde(rename = "dir")]
    Directory(DirectoryAttributes),
}

impl StorageAttributes {
    pub fn path(&self) -> &str {
        match self {
            StorageAttributes::File(file) => &file.path,
            StorageAttributes::Directory(dir) => &dir.path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, StorageAttributes::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, StorageAttributes::Directory(_))
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            StorageAttributes::File(file) => file.visibility,
            StorageAttributes::Directory(dir) => dir.visibility,
        }
    }

    pub fn last_modified(&self) -> Option<i64> {
        match self {
            StorageAttributes::File(file) => file.last_modified,
            StorageAttributes::Directory(dir) => dir.last_modified,
        }
    }
}

/// Lazily evaluated directory listing
///
/// Backends may load entries in pages as the listing is consumed.
pub struct DirectoryListing {
    entries: Box<dyn Iterator<Item = StorageAttributes> + Send>,
}

impl DirectoryListing {
    pub fn new<I>(entries: I) -> Self
    where
        I: Iterator<Item = StorageAttributes> + Send + 'static,
    {
        Self {
            entries: Box::new(entries),
        }
    }

    /// A listing with no entries
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Keep only files
    pub fn files_only(self) -> Self {
        Self::new(self.entries.filter(StorageAttributes::is_file))
    }

    /// Keep only directories
    pub fn directories_only(self) -> Self {
        Self::new(self.entries.filter(StorageAttributes::is_dir))
    }

    pub fn to_vec(self) -> Vec<StorageAttributes> {
        self.entries.collect()
    }
}

impl Iterator for DirectoryListing {
    type Item = StorageAttributes;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

impl std::fmt::Debug for DirectoryListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryListing").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> StorageAttributes {
        StorageAttributes::File(FileAttributes::new(path))
    }

    fn dir(path: &str) -> StorageAttributes {
        StorageAttributes::Directory(DirectoryAttributes {
            path: path.to_string(),
            visibility: Some(Visibility::Public),
            last_modified: Some(0),
        })
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!("private".parse::<Visibility>().unwrap(), Visibility::Private);

        let err = "PUBLIC".parse::<Visibility>().unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("public,private"));
    }

    #[test]
    fn test_listing_filters() {
        let entries = vec![dir("a"), file("a/x.txt"), dir("a/b")];

        let files = DirectoryListing::new(entries.clone().into_iter()).files_only().to_vec();
        assert_eq!(files, vec![file("a/x.txt")]);

        let dirs = DirectoryListing::new(entries.into_iter()).directories_only().to_vec();
        assert_eq!(dirs.len(), 2);
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_string(&dir("a")).unwrap();
        assert!(json.contains(r#""type":"dir""#));
    }
}
