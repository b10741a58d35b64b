//! Point queries against the entries table

use crate::record::{EntryType, StoredRecord, METADATA_COLUMNS};
use crate::{Result, TableName};
use rusqlite::{params, Connection, OptionalExtension};

/// Does a row with exactly this storage path and type exist?
pub(crate) fn exists(
    conn: &Connection,
    table: &TableName,
    storage_path: &str,
    entry_type: EntryType,
) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE path = ?1 AND type = ?2)",
        table
    );

    let found: bool = conn.query_row(&sql, params![storage_path, entry_type.as_str()], |row| {
        row.get(0)
    })?;
    Ok(found)
}

/// Fetch the file row at a storage path
///
/// Not found is `Ok(None)`.
pub(crate) fn fetch_record(
    conn: &Connection,
    table: &TableName,
    storage_path: &str,
    with_contents: bool,
) -> Result<Option<StoredRecord>> {
    let columns = if with_contents {
        format!("{}, contents", METADATA_COLUMNS)
    } else {
        METADATA_COLUMNS.to_string()
    };
    let sql = format!(
        "SELECT {} FROM {} WHERE path = ?1 AND type = ?2 LIMIT 1",
        columns, table
    );

    let mut stmt = conn.prepare_cached(&sql)?;
    let record = stmt
        .query_row(params![storage_path, EntryType::File.as_str()], |row| {
            StoredRecord::from_row(row, with_contents)
        })
        .optional()?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::migrate;
    use crate::pool::init_memory_pool;

    fn setup() -> (crate::DbPool, TableName) {
        let pool = init_memory_pool().unwrap();
        let table = TableName::default();
        migrate(&pool, &table).unwrap();

        pool.get()
            .unwrap()
            .execute_batch(
                "INSERT INTO flysystem_files (path, type, visibility, size, mimetype, timestamp, level, contents)
                 VALUES ('a', 'dir', 'public', NULL, NULL, 10, 0, NULL),
                        ('a/b.txt', 'file', 'private', 3, 'text/plain', 20, 1, X'616263');",
            )
            .unwrap();
        (pool, table)
    }

    #[test]
    fn test_exists_is_type_scoped() {
        let (pool, table) = setup();
        let conn = pool.get().unwrap();

        assert!(exists(&conn, &table, "a", EntryType::Directory).unwrap());
        assert!(!exists(&conn, &table, "a", EntryType::File).unwrap());
        assert!(exists(&conn, &table, "a/b.txt", EntryType::File).unwrap());
        assert!(!exists(&conn, &table, "a/b", EntryType::File).unwrap());
    }

    #[test]
    fn test_fetch_record() {
        let (pool, table) = setup();
        let conn = pool.get().unwrap();

        let meta = fetch_record(&conn, &table, "a/b.txt", false).unwrap().unwrap();
        assert_eq!(meta.size, Some(3));
        assert_eq!(meta.visibility.as_deref(), Some("private"));
        assert_eq!(meta.contents, None);

        let full = fetch_record(&conn, &table, "a/b.txt", true).unwrap().unwrap();
        assert_eq!(full.contents.as_deref(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_fetch_record_ignores_directories() {
        let (pool, table) = setup();
        let conn = pool.get().unwrap();

        assert!(fetch_record(&conn, &table, "a", true).unwrap().is_none());
        assert!(fetch_record(&conn, &table, "missing", true).unwrap().is_none());
    }
}
