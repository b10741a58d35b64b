//! tablefs Filesystem Contract
//!
//! Backend-agnostic pieces shared by every storage adapter:
//! - FilesystemAdapter: the abstract filesystem operations
//! - StorageAttributes: file and directory metadata shapes
//! - PathPrefixer: logical path <-> storage path mapping
//! - MimeTypeDetector: injected MIME detection
//! - Config: per-call write options

mod adapter;
mod attributes;
mod config;
mod mime;
mod prefixer;

pub use adapter::FilesystemAdapter;
pub use attributes::{
    DirectoryAttributes, DirectoryListing, FileAttributes, StorageAttributes, Visibility,
};
pub use config::Config;
pub use mime::{DefaultMimeTypeDetector, MimeTypeDetector};
pub use prefixer::{normalize_path, PathPrefixer, SEPARATOR};

use thiserror::Error;

/// Boxed cause carried by every operation failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which piece of metadata could not be retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Visibility,
    MimeType,
    LastModified,
    FileSize,
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MetadataKind::Visibility => "visibility",
            MetadataKind::MimeType => "mime type",
            MetadataKind::LastModified => "last modified",
            MetadataKind::FileSize => "file size",
        };
        f.write_str(name)
    }
}

/// Filesystem operation errors
///
/// Every variant names the logical path(s) the caller passed in. Storage-layer
/// failures travel along as `source`.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("Unable to write file at {path}: {source}")]
    Write { path: String, source: BoxError },

    #[error("Unable to read file from {path}: {source}")]
    Read { path: String, source: BoxError },

    #[error("Unable to check existence for {path}: {source}")]
    CheckExistence { path: String, source: BoxError },

    #[error("Unable to create directory at {path}: {source}")]
    CreateDirectory { path: String, source: BoxError },

    #[error("Unable to delete file at {path}: {source}")]
    DeleteFile { path: String, source: BoxError },

    #[error("Unable to delete directory at {path}: {source}")]
    DeleteDirectory { path: String, source: BoxError },

    #[error("Unable to move file from {from} to {to}: {source}")]
    Move {
        from: String,
        to: String,
        source: BoxError,
    },

    #[error("Unable to copy file from {from} to {to}: {source}")]
    Copy {
        from: String,
        to: String,
        source: BoxError,
    },

    #[error("Unable to set visibility for {path}: {source}")]
    SetVisibility { path: String, source: BoxError },

    #[error("Unable to retrieve the {kind} for file at {path}: {source}")]
    RetrieveMetadata {
        path: String,
        kind: MetadataKind,
        source: BoxError,
    },

    #[error("Invalid visibility provided: {value}. Expected one of: {expected}")]
    InvalidVisibility { value: String, expected: String },
}

impl FsError {
    /// The logical path this failure is about (the source path for move/copy)
    pub fn location(&self) -> &str {
        match self {
            FsError::Write { path, .. }
            | FsError::Read { path, .. }
            | FsError::CheckExistence { path, .. }
            | FsError::CreateDirectory { path, .. }
            | FsError::DeleteFile { path, .. }
            | FsError::DeleteDirectory { path, .. }
            | FsError::SetVisibility { path, .. }
            | FsError::RetrieveMetadata { path, .. } => path,
            FsError::Move { from, .. } | FsError::Copy { from, .. } => from,
            FsError::InvalidVisibility { value, .. } => value,
        }
    }

    /// Was the caller's input rejected before storage was touched?
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, FsError::InvalidVisibility { .. })
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
