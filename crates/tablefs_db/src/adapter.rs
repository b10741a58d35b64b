//! SQLite-backed FilesystemAdapter

use crate::listing::{list, ListingQuery};
use crate::lookup::{exists, fetch_record};
use crate::record::{directory_level, EntryType, StoredRecord};
use crate::tree::ensure_directory_tree;
use crate::{DbError, DbPool, Result, TableName, DEFAULT_TABLE};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, TransactionBehavior};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tablefs_fs::{
    normalize_path, Config, DefaultMimeTypeDetector, DirectoryListing, FileAttributes,
    FilesystemAdapter, FsError, MetadataKind, MimeTypeDetector, PathPrefixer, Visibility,
    SEPARATOR,
};

type FsResult<T> = tablefs_fs::Result<T>;

/// Where the adapter keeps its rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Table holding the entries
    pub table: String,
    /// Root prefix applied to every logical path
    pub prefix: String,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            prefix: String::new(),
        }
    }
}

impl AdapterOptions {
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Filesystem adapter storing every file and directory as a table row
///
/// Each call checks out one pooled connection. Multi-statement operations
/// (write, create_directory, copy, move) run in a single transaction, so a
/// failure leaves the table as it was.
pub struct SqliteAdapter {
    pool: DbPool,
    table: TableName,
    prefixer: PathPrefixer,
    mime_detector: Arc<dyn MimeTypeDetector>,
}

impl SqliteAdapter {
    /// Create an adapter over an existing pool; the table must already exist
    /// (see [`crate::migrate`])
    pub fn new(pool: DbPool, options: AdapterOptions) -> Result<Self> {
        Ok(Self {
            pool,
            table: TableName::new(&options.table)?,
            prefixer: PathPrefixer::new(&options.prefix),
            mime_detector: Arc::new(DefaultMimeTypeDetector::new()),
        })
    }

    /// Replace the MIME detector used on insert and by `mime_type`
    pub fn with_mime_detector(mut self, detector: Arc<dyn MimeTypeDetector>) -> Self {
        self.mime_detector = detector;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside a transaction; any error rolls it back
    ///
    /// The write lock is taken up front so concurrent writers wait on
    /// `busy_timeout` rather than failing on lock upgrade.
    fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn exists(&self, path: &str, entry_type: EntryType) -> FsResult<bool> {
        let storage_path = self.prefixer.prefix_path(path);
        self.connection()
            .and_then(|conn| exists(&conn, &self.table, &storage_path, entry_type))
            .map_err(|e| FsError::CheckExistence {
                path: path.to_string(),
                source: e.into(),
            })
    }

    /// File row for a logical path; lookup errors are existence-check failures
    fn fetch_file(&self, path: &str, with_contents: bool) -> FsResult<Option<StoredRecord>> {
        let storage_path = self.prefixer.prefix_path(path);
        self.connection()
            .and_then(|conn| fetch_record(&conn, &self.table, &storage_path, with_contents))
            .map_err(|e| FsError::CheckExistence {
                path: path.to_string(),
                source: e.into(),
            })
    }

    /// Metadata of an existing file; a missing file is a read failure
    fn fetch_file_meta(&self, path: &str) -> FsResult<FileAttributes> {
        let record = self.fetch_file(path, false)?.ok_or_else(|| FsError::Read {
            path: path.to_string(),
            source: DbError::NotFound("No such file exists".to_string()).into(),
        })?;

        record
            .normalize_file(&self.prefixer)
            .map_err(|e| FsError::Read {
                path: path.to_string(),
                source: e.into(),
            })
    }

    fn file_meta(&self, path: &str, kind: MetadataKind) -> FsResult<FileAttributes> {
        self.fetch_file_meta(path)
            .map_err(|e| FsError::RetrieveMetadata {
                path: path.to_string(),
                kind,
                source: e.into(),
            })
    }

    /// Upsert a file row on `conn`
    fn write_with(&self, conn: &Connection, path: &str, contents: &[u8], config: &Config) -> Result<()> {
        if normalize_path(path).is_empty() {
            return Err(DbError::PathConflict("the root directory is not a file".to_string()));
        }
        let storage_path = self.prefixer.prefix_path(path);

        if let Some((parent, _)) = storage_path.rsplit_once(SEPARATOR) {
            ensure_directory_tree(conn, &self.table, parent, config)?;
        }
        if exists(conn, &self.table, &storage_path, EntryType::Directory)? {
            return Err(DbError::PathConflict(format!(
                "a directory exists at {}",
                path
            )));
        }

        let timestamp = config.timestamp_or_now();
        let visibility = config.visibility_or_default();

        if exists(conn, &self.table, &storage_path, EntryType::File)? {
            conn.execute(
                &format!(
                    "UPDATE {} SET contents = ?1, timestamp = ?2, visibility = ?3 WHERE path = ?4 AND type = ?5",
                    self.table
                ),
                params![
                    contents,
                    timestamp,
                    visibility.as_str(),
                    storage_path,
                    EntryType::File.as_str(),
                ],
            )?;
        } else {
            let mimetype = self.mime_detector.detect_mime_type(&storage_path, contents);
            conn.execute(
                &format!(
                    "INSERT INTO {} (path, type, timestamp, level, contents, mimetype, visibility)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    self.table
                ),
                params![
                    storage_path,
                    EntryType::File.as_str(),
                    timestamp,
                    directory_level(&storage_path),
                    contents,
                    mimetype,
                    visibility.as_str(),
                ],
            )?;
        }

        conn.execute(
            &format!(
                "UPDATE {} SET size = LENGTH(contents) WHERE path = ?1 AND type = ?2",
                self.table
            ),
            params![storage_path, EntryType::File.as_str()],
        )?;

        Ok(())
    }

    /// Copy a file row on `conn`; the destination is overwritten
    fn copy_with(&self, conn: &Connection, source: &str, destination: &str, config: &Config) -> Result<()> {
        let source_path = self.prefixer.prefix_path(source);
        let record = fetch_record(conn, &self.table, &source_path, true)?
            .ok_or_else(|| DbError::NotFound(format!("File does not exist: {}", source)))?;

        let contents = record.contents.unwrap_or_default();
        self.write_with(conn, destination, &contents, config)
    }

    /// Delete a file row on `conn`; returns whether one existed
    fn delete_with(&self, conn: &Connection, path: &str) -> Result<bool> {
        let storage_path = self.prefixer.prefix_path(path);
        if !exists(conn, &self.table, &storage_path, EntryType::File)? {
            return Ok(false);
        }

        conn.execute(
            &format!("DELETE FROM {} WHERE path = ?1 AND type = ?2", self.table),
            params![storage_path, EntryType::File.as_str()],
        )?;
        Ok(true)
    }

    fn same_location(&self, source: &str, destination: &str) -> bool {
        self.prefixer.prefix_path(source) == self.prefixer.prefix_path(destination)
    }
}

impl FilesystemAdapter for SqliteAdapter {
    fn file_exists(&self, path: &str) -> FsResult<bool> {
        self.exists(path, EntryType::File)
    }

    fn directory_exists(&self, path: &str) -> FsResult<bool> {
        self.exists(path, EntryType::Directory)
    }

    fn write(&self, path: &str, contents: &[u8], config: &Config) -> FsResult<()> {
        self.transaction(|conn| self.write_with(conn, path, contents, config))
            .map_err(|e| FsError::Write {
                path: path.to_string(),
                source: e.into(),
            })?;

        tracing::debug!("Wrote {} bytes to {}", contents.len(), path);
        Ok(())
    }

    fn write_stream(&self, path: &str, contents: &mut dyn Read, config: &Config) -> FsResult<()> {
        let mut buffer = Vec::new();
        contents
            .read_to_end(&mut buffer)
            .map_err(|e| FsError::Write {
                path: path.to_string(),
                source: e.into(),
            })?;

        self.write(path, &buffer, config)
    }

    fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        let record = self
            .fetch_file(path, true)
            .map_err(|e| FsError::Read {
                path: path.to_string(),
                source: e.into(),
            })?
            .ok_or_else(|| FsError::Read {
                path: path.to_string(),
                source: DbError::NotFound("File does not exist".to_string()).into(),
            })?;

        Ok(record.contents.unwrap_or_default())
    }

    fn read_stream(&self, path: &str) -> FsResult<Box<dyn Read + Send>> {
        let contents = self.read(path)?;
        Ok(Box::new(Cursor::new(contents)))
    }

    fn delete(&self, path: &str) -> FsResult<()> {
        let deleted = self
            .connection()
            .and_then(|conn| self.delete_with(&conn, path))
            .map_err(|e| FsError::DeleteFile {
                path: path.to_string(),
                source: e.into(),
            })?;

        if deleted {
            tracing::info!("Deleted file: {}", path);
        }
        Ok(())
    }

    fn delete_directory(&self, path: &str) -> FsResult<()> {
        let storage_path = self.prefixer.prefix_path(path);

        let deleted = self
            .connection()
            .and_then(|conn| {
                if !exists(&conn, &self.table, &storage_path, EntryType::Directory)? {
                    return Ok(0);
                }

                // One bulk delete: the directory row plus everything under "path/"
                let rows = conn.execute(
                    &format!(
                        "DELETE FROM {} WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2",
                        self.table
                    ),
                    params![storage_path, format!("{}{}", storage_path, SEPARATOR)],
                )?;
                Ok(rows)
            })
            .map_err(|e| FsError::DeleteDirectory {
                path: path.to_string(),
                source: e.into(),
            })?;

        if deleted > 0 {
            tracing::info!("Deleted directory {} ({} rows)", path, deleted);
        }
        Ok(())
    }

    fn create_directory(&self, path: &str, config: &Config) -> FsResult<()> {
        if normalize_path(path).is_empty() {
            return Ok(());
        }
        let storage_path = self.prefixer.prefix_path(path);

        self.transaction(|conn| ensure_directory_tree(conn, &self.table, &storage_path, config))
            .map_err(|e| FsError::CreateDirectory {
                path: path.to_string(),
                source: e.into(),
            })?;
        Ok(())
    }

    fn set_visibility(&self, path: &str, visibility: &str) -> FsResult<()> {
        let visibility: Visibility = visibility.parse()?;
        let storage_path = self.prefixer.prefix_path(path);

        self.connection()
            .and_then(|conn| {
                let rows = conn.execute(
                    &format!("UPDATE {} SET visibility = ?1 WHERE path = ?2", self.table),
                    params![visibility.as_str(), storage_path],
                )?;
                if rows == 0 {
                    return Err(DbError::NotFound(format!(
                        "Visibility was not changed. Unable to find file or directory: {}",
                        path
                    )));
                }
                Ok(())
            })
            .map_err(|e| FsError::SetVisibility {
                path: path.to_string(),
                source: e.into(),
            })?;

        tracing::debug!("Set visibility of {} to {}", path, visibility);
        Ok(())
    }

    fn visibility(&self, path: &str) -> FsResult<FileAttributes> {
        self.file_meta(path, MetadataKind::Visibility)
    }

    fn mime_type(&self, path: &str) -> FsResult<FileAttributes> {
        let attributes = self.file_meta(path, MetadataKind::MimeType)?;

        let mime_type = attributes
            .mime_type
            .or_else(|| self.mime_detector.detect_mime_type_from_path(&attributes.path))
            .ok_or_else(|| FsError::RetrieveMetadata {
                path: path.to_string(),
                kind: MetadataKind::MimeType,
                source: DbError::NotFound("Unknown MIME type".to_string()).into(),
            })?;

        Ok(FileAttributes {
            mime_type: Some(mime_type),
            ..FileAttributes::new(attributes.path)
        })
    }

    fn last_modified(&self, path: &str) -> FsResult<FileAttributes> {
        self.file_meta(path, MetadataKind::LastModified)
    }

    fn file_size(&self, path: &str) -> FsResult<FileAttributes> {
        self.file_meta(path, MetadataKind::FileSize)
    }

    fn list_contents(&self, path: &str, deep: bool) -> DirectoryListing {
        let directory = self.prefixer.prefix_directory_path(path);
        let query = ListingQuery::new(&directory, deep);

        match list(&self.pool, &self.table, query, self.prefixer.clone()) {
            Ok(listing) => listing,
            Err(e) => {
                // Best effort: callers get an empty listing on query failure
                tracing::warn!("Listing {} failed: {}", path, e);
                DirectoryListing::empty()
            }
        }
    }

    fn move_file(&self, source: &str, destination: &str, config: &Config) -> FsResult<()> {
        let moved = self.transaction(|conn| {
            if self.same_location(source, destination) {
                let source_path = self.prefixer.prefix_path(source);
                if !exists(conn, &self.table, &source_path, EntryType::File)? {
                    return Err(DbError::NotFound(format!("File does not exist: {}", source)));
                }
                return Ok(false);
            }

            self.copy_with(conn, source, destination, config)?;
            self.delete_with(conn, source)?;
            Ok(true)
        });

        let moved = moved.map_err(|e| FsError::Move {
            from: source.to_string(),
            to: destination.to_string(),
            source: e.into(),
        })?;

        if moved {
            tracing::info!("Moved: {} -> {}", source, destination);
        }
        Ok(())
    }

    fn copy(&self, source: &str, destination: &str, config: &Config) -> FsResult<()> {
        self.transaction(|conn| self.copy_with(conn, source, destination, config))
            .map_err(|e| FsError::Copy {
                from: source.to_string(),
                to: destination.to_string(),
                source: e.into(),
            })?;

        tracing::info!("Copied: {} -> {}", source, destination);
        Ok(())
    }
}

impl std::fmt::Debug for SqliteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAdapter")
            .field("table", &self.table)
            .field("prefixer", &self.prefixer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::schema::migrate;

    fn adapter() -> SqliteAdapter {
        let pool = init_memory_pool().unwrap();
        let adapter = SqliteAdapter::new(pool, AdapterOptions::default()).unwrap();
        migrate(adapter.pool(), adapter.table()).unwrap();
        adapter
    }

    fn row_count(adapter: &SqliteAdapter, path: &str) -> i64 {
        adapter
            .pool()
            .get()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM flysystem_files WHERE path = ?1",
                [path],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_invalid_table_name() {
        let pool = init_memory_pool().unwrap();
        let result = SqliteAdapter::new(pool, AdapterOptions::default().with_table("x;y"));
        assert!(matches!(result, Err(DbError::InvalidTableName(_))));
    }

    #[test]
    fn test_write_records_level_and_mimetype() {
        let adapter = adapter();
        adapter
            .write("a/b/c.txt", b"hello", &Config::new().with_timestamp(7))
            .unwrap();

        let (level, mimetype, size, timestamp): (i64, Option<String>, i64, i64) = adapter
            .pool()
            .get()
            .unwrap()
            .query_row(
                "SELECT level, mimetype, size, timestamp FROM flysystem_files WHERE path = 'a/b/c.txt'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(level, 2);
        assert_eq!(mimetype.as_deref(), Some("text/plain"));
        assert_eq!(size, 5);
        assert_eq!(timestamp, 7);
    }

    #[test]
    fn test_write_upserts() {
        let adapter = adapter();
        adapter.write("f.txt", b"one", &Config::new()).unwrap();
        adapter
            .write(
                "f.txt",
                b"second",
                &Config::new().with_visibility(Visibility::Private),
            )
            .unwrap();

        assert_eq!(row_count(&adapter, "f.txt"), 1);
        assert_eq!(adapter.read("f.txt").unwrap(), b"second");
        assert_eq!(adapter.file_size("f.txt").unwrap().file_size, Some(6));
        assert_eq!(
            adapter.visibility("f.txt").unwrap().visibility,
            Some(Visibility::Private)
        );
    }

    #[test]
    fn test_write_onto_directory_fails_and_rolls_back() {
        let adapter = adapter();
        adapter.create_directory("x/y", &Config::new()).unwrap();

        let err = adapter.write("x/y", b"data", &Config::new()).unwrap_err();
        assert!(matches!(err, FsError::Write { .. }));
        assert!(!adapter.file_exists("x/y").unwrap());

        // a file row without its parent directory row
        adapter
            .pool()
            .get()
            .unwrap()
            .execute(
                "INSERT INTO flysystem_files (path, type, timestamp, level) VALUES ('z/w', 'file', 0, 1)",
                [],
            )
            .unwrap();

        // "z" is inserted before the conflict at "z/w" and must be rolled back
        let err = adapter.write("z/w/f.txt", b"data", &Config::new()).unwrap_err();
        assert!(matches!(err, FsError::Write { .. }));
        assert_eq!(row_count(&adapter, "z"), 0);
    }

    #[test]
    fn test_write_to_root_fails() {
        let adapter = adapter();
        assert!(adapter.write("", b"x", &Config::new()).is_err());
        assert!(adapter.write("/", b"x", &Config::new()).is_err());
    }

    #[test]
    fn test_empty_file() {
        let adapter = adapter();
        adapter.write("empty", b"", &Config::new()).unwrap();
        assert_eq!(adapter.read("empty").unwrap(), Vec::<u8>::new());
        assert_eq!(adapter.file_size("empty").unwrap().file_size, Some(0));
    }

    #[test]
    fn test_read_missing_is_read_error() {
        let adapter = adapter();
        let err = adapter.read("nope.txt").unwrap_err();
        assert!(matches!(err, FsError::Read { .. }));
        assert_eq!(err.location(), "nope.txt");
    }

    #[test]
    fn test_metadata_errors_carry_kind() {
        let adapter = adapter();
        for (result, expected) in [
            (adapter.visibility("x"), MetadataKind::Visibility),
            (adapter.mime_type("x"), MetadataKind::MimeType),
            (adapter.last_modified("x"), MetadataKind::LastModified),
            (adapter.file_size("x"), MetadataKind::FileSize),
        ] {
            match result {
                Err(FsError::RetrieveMetadata { kind, .. }) => assert_eq!(kind, expected),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_mime_type_unknown_extension() {
        let adapter = adapter();
        adapter.write("blob.unknownext", b"??", &Config::new()).unwrap();
        assert!(matches!(
            adapter.mime_type("blob.unknownext"),
            Err(FsError::RetrieveMetadata {
                kind: MetadataKind::MimeType,
                ..
            })
        ));

        adapter.write("page.html", b"<p>", &Config::new()).unwrap();
        let attrs = adapter.mime_type("page.html").unwrap();
        assert_eq!(attrs.path, "page.html");
        assert_eq!(attrs.mime_type.as_deref(), Some("text/html"));
        assert_eq!(attrs.file_size, None);
    }

    #[test]
    fn test_mime_type_of_common_files() {
        let adapter = adapter();
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
        adapter.write("photo", &png, &Config::new()).unwrap();
        adapter.write("report.docx", b"draft", &Config::new()).unwrap();

        assert_eq!(
            adapter.mime_type("photo").unwrap().mime_type.as_deref(),
            Some("image/png")
        );
        assert_eq!(
            adapter.mime_type("report.docx").unwrap().mime_type.as_deref(),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
    }

    #[test]
    fn test_custom_mime_detector() {
        struct Fixed;
        impl MimeTypeDetector for Fixed {
            fn detect_mime_type(&self, _path: &str, _contents: &[u8]) -> Option<String> {
                Some("application/x-fixed".to_string())
            }
            fn detect_mime_type_from_path(&self, _path: &str) -> Option<String> {
                None
            }
        }

        let adapter = adapter().with_mime_detector(Arc::new(Fixed));
        adapter.write("any", b"1", &Config::new()).unwrap();
        assert_eq!(
            adapter.mime_type("any").unwrap().mime_type.as_deref(),
            Some("application/x-fixed")
        );
    }

    #[test]
    fn test_move_onto_itself_keeps_file() {
        let adapter = adapter();
        adapter.write("same.txt", b"keep", &Config::new()).unwrap();
        adapter
            .move_file("same.txt", "./same.txt", &Config::new())
            .unwrap();
        assert_eq!(adapter.read("same.txt").unwrap(), b"keep");

        assert!(matches!(
            adapter.move_file("ghost", "ghost", &Config::new()),
            Err(FsError::Move { .. })
        ));
    }

    #[test]
    fn test_listing_query_failure_is_empty() {
        let pool = init_memory_pool().unwrap();
        // table never created
        let adapter = SqliteAdapter::new(pool, AdapterOptions::default()).unwrap();
        assert_eq!(adapter.list_contents("", true).count(), 0);
    }
}
