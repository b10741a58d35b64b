//! tablefs Database Layer
//!
//! Stores files and directories as rows of a single SQLite table:
//! - SqliteAdapter: the FilesystemAdapter implementation
//! - Directory tree emulation over a flat table (ancestor rows + level column)
//! - Connection pool and schema bootstrap

mod adapter;
mod listing;
mod lookup;
mod pool;
mod record;
mod schema;
mod tree;

pub use adapter::{AdapterOptions, SqliteAdapter};
pub use pool::{init_memory_pool, init_pool, DbPool};
pub use record::{directory_level, EntryType, StoredRecord};
pub use schema::{migrate, TableName, DEFAULT_TABLE};
pub use tree::directory_tree;

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Unable to create metadata of type {0}. Allowed types: file, dir")]
    UnknownEntryType(String),

    #[error("Stored visibility is not recognized: {0}")]
    InvalidVisibility(String),

    #[error("Path conflict: {0}")]
    PathConflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<r2d2::Error> for DbError {
    fn from(e: r2d2::Error) -> Self {
        DbError::Pool(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Default directory for database files
pub fn db_dir() -> PathBuf {
    ProjectDirs::from("dev", "tablefs", "tablefs")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Open (creating if needed) a database file and its table, returning a ready adapter
pub fn open(path: &Path, max_size: u32, options: AdapterOptions) -> Result<SqliteAdapter> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = pool::init_pool(path, max_size)?;
    let adapter = SqliteAdapter::new(pool, options)?;
    migrate(adapter.pool(), adapter.table())?;

    tracing::info!("Database opened at {:?} (table {})", path, adapter.table());
    Ok(adapter)
}
