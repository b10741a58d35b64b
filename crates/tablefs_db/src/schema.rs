//! Database schema bootstrap

use crate::{DbError, DbPool, Result};

/// Table used when none is configured
pub const DEFAULT_TABLE: &str = "flysystem_files";

/// A validated SQL table identifier
///
/// The table name is interpolated into statements, so only plain identifiers
/// (`[A-Za-z_][A-Za-z0-9_]*`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: &str) -> Result<Self> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };

        if !valid {
            return Err(DbError::InvalidTableName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE.to_string())
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Create the entries table if it is missing
pub fn migrate(pool: &DbPool, table: &TableName) -> Result<()> {
    let conn = pool.get()?;

    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table.as_str()],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Creating table {}", table);
        apply_v1(&conn, table)?;
    }

    Ok(())
}

fn apply_v1(conn: &rusqlite::Connection, table: &TableName) -> Result<()> {
    // No UNIQUE constraint on path: the adapter keeps one row per path itself.
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            path TEXT NOT NULL,
            type TEXT NOT NULL,
            visibility TEXT,
            size INTEGER,
            mimetype TEXT,
            timestamp INTEGER NOT NULL,
            level INTEGER NOT NULL,
            contents BLOB
        );

        CREATE INDEX IF NOT EXISTS idx_{table}_path ON {table}(path);
        CREATE INDEX IF NOT EXISTS idx_{table}_level ON {table}(level);
        "#,
        table = table.as_str()
    ))
    .map_err(|e| DbError::Migration(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{init_memory_pool, init_pool};
    use tempfile::NamedTempFile;

    #[test]
    fn test_table_name_validation() {
        assert!(TableName::new("flysystem_files").is_ok());
        assert!(TableName::new("_files2").is_ok());
        assert!(TableName::new("").is_err());
        assert!(TableName::new("2files").is_err());
        assert!(TableName::new("files; DROP TABLE x").is_err());
        assert!(TableName::new("my-files").is_err());
        assert_eq!(TableName::default().as_str(), DEFAULT_TABLE);
    }

    #[test]
    fn test_migration() {
        let temp_file = NamedTempFile::new().unwrap();
        let pool = init_pool(temp_file.path(), 2).unwrap();
        let table = TableName::default();
        assert!(migrate(&pool, &table).is_ok());
    }

    #[test]
    fn test_migration_is_idempotent() {
        let pool = init_memory_pool().unwrap();
        let table = TableName::new("entries").unwrap();
        migrate(&pool, &table).unwrap();
        migrate(&pool, &table).unwrap();

        let conn = pool.get().unwrap();
        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('entries') ORDER BY cid")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(
            columns,
            vec!["path", "type", "visibility", "size", "mimetype", "timestamp", "level", "contents"]
        );
    }
}
