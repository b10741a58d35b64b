//! Directory tree emulation
//!
//! The table has no parent/child relation, so every ancestor directory of a
//! stored entry is materialized as its own `dir` row.

use crate::lookup::exists;
use crate::record::{directory_level, EntryType};
use crate::{DbError, Result, TableName};
use rusqlite::{params, Connection};
use tablefs_fs::{Config, SEPARATOR};

/// Ordered ancestor paths of a storage path, the path itself included
///
/// `a/b/c` yields `a`, `a/b`, `a/b/c`. Empty segments are skipped.
pub fn directory_tree(path: &str) -> Vec<String> {
    let mut tree = Vec::new();
    let mut current = String::new();

    for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
        if !current.is_empty() {
            current.push(SEPARATOR);
        }
        current.push_str(segment);
        tree.push(current.clone());
    }

    tree
}

/// Make sure a `dir` row exists for `storage_path` and each of its ancestors
///
/// Returns how many rows were inserted. Fails if a file occupies one of the
/// paths.
pub(crate) fn ensure_directory_tree(
    conn: &Connection,
    table: &TableName,
    storage_path: &str,
    config: &Config,
) -> Result<usize> {
    let tree = directory_tree(storage_path);
    if tree.is_empty() {
        return Ok(0);
    }

    let timestamp = config.timestamp_or_now();
    let visibility = config.visibility_or_default();
    let sql = format!(
        "INSERT INTO {} (path, type, visibility, timestamp, level) VALUES (?1, ?2, ?3, ?4, ?5)",
        table
    );

    let mut created = 0;
    for directory in &tree {
        if exists(conn, table, directory, EntryType::Directory)? {
            continue;
        }
        if exists(conn, table, directory, EntryType::File)? {
            return Err(DbError::PathConflict(format!(
                "a file exists at {}",
                directory
            )));
        }

        conn.execute(
            &sql,
            params![
                directory,
                EntryType::Directory.as_str(),
                visibility.as_str(),
                timestamp,
                directory_level(directory),
            ],
        )?;
        tracing::debug!("Created directory row: {}", directory);
        created += 1;
    }

    if created > 0 {
        tracing::info!("Created {} directories for {}", created, storage_path);
    }
    Ok(created)
}
