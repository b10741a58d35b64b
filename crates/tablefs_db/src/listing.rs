//! Directory listing over the flat table
//!
//! Children of `D` are the rows under `D/` whose level is one deeper than
//! `D`'s; descendants are all rows under `D/` at any deeper level.
//!
//! Rows are read in pages keyed on `path`, so a listing holds at most one page
//! in memory and no connection between pages.

use crate::record::{directory_level, StoredRecord, METADATA_COLUMNS};
use crate::{DbPool, Result, TableName};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tablefs_fs::{DirectoryListing, PathPrefixer, StorageAttributes, SEPARATOR};

/// Rows fetched per round trip
pub(crate) const PAGE_SIZE: usize = 500;

/// SELECT builder for one listing request
#[derive(Debug, Clone)]
pub(crate) struct ListingQuery {
    /// Storage path of the listed directory, no trailing separator; `""` is the root
    target: String,
    deep: bool,
    page_size: usize,
}

impl ListingQuery {
    /// `directory` is a storage directory path, with or without its trailing separator
    pub(crate) fn new(directory: &str, deep: bool) -> Self {
        Self {
            target: directory.trim_end_matches(SEPARATOR).to_string(),
            deep,
            page_size: PAGE_SIZE,
        }
    }

    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// SQL for the page following `after` (the last path already returned)
    pub(crate) fn build(&self, table: &TableName, after: Option<&str>) -> (String, Vec<Value>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if self.target.is_empty() {
            if !self.deep {
                conditions.push("level = 0".to_string());
            }
        } else {
            values.push(Value::Text(self.target.clone()));
            values.push(Value::Text(format!("{}{}", self.target, SEPARATOR)));
            // substr keeps the match exact and case sensitive, unlike LIKE
            conditions.push("(path = ?1 OR substr(path, 1, length(?2)) = ?2)".to_string());

            let child_level = directory_level(&self.target) + 1;
            values.push(Value::Integer(child_level));
            if self.deep {
                conditions.push("level >= ?3".to_string());
            } else {
                conditions.push("level = ?3".to_string());
            }
        }

        if let Some(after) = after {
            values.push(Value::Text(after.to_string()));
            conditions.push(format!("path > ?{}", values.len()));
        }

        let mut sql = format!("SELECT {} FROM {}", METADATA_COLUMNS, table);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY path ASC LIMIT {}", self.page_size));

        (sql, values)
    }

    /// Fetch the page following `after`
    pub(crate) fn fetch_page(
        &self,
        conn: &Connection,
        table: &TableName,
        after: Option<&str>,
    ) -> Result<Vec<StoredRecord>> {
        let (sql, values) = self.build(table, after);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            StoredRecord::from_row(row, false)
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }
}

/// Paged rows mapped to metadata on demand
///
/// A row that cannot be mapped, or a later page that fails to load, ends the
/// listing.
struct PagedRows {
    pool: DbPool,
    table: TableName,
    query: ListingQuery,
    prefixer: PathPrefixer,
    page: std::vec::IntoIter<StoredRecord>,
    last_path: Option<String>,
    /// The last page fetched was short, so nothing follows it
    exhausted: bool,
    done: bool,
}

impl PagedRows {
    fn load(&mut self, rows: Vec<StoredRecord>) {
        self.exhausted = rows.len() < self.query.page_size;
        self.page = rows.into_iter();
    }

    fn next_page(&self) -> Result<Vec<StoredRecord>> {
        let conn = self.pool.get()?;
        self.query
            .fetch_page(&conn, &self.table, self.last_path.as_deref())
    }
}

impl Iterator for PagedRows {
    type Item = StorageAttributes;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some(record) = self.page.next() {
                match record.normalize(&self.prefixer) {
                    Ok(attributes) => {
                        self.last_path = Some(record.path);
                        return Some(attributes);
                    }
                    Err(e) => {
                        tracing::error!("Listing stopped at {}: {}", record.path, e);
                        self.done = true;
                        return None;
                    }
                }
            }

            if self.exhausted {
                self.done = true;
                break;
            }

            match self.next_page() {
                Ok(rows) => self.load(rows),
                Err(e) => {
                    tracing::warn!("Listing page after {:?} failed: {}", self.last_path, e);
                    self.done = true;
                }
            }
        }

        None
    }
}

/// Start a listing; the first page is read before returning, so a failing
/// query surfaces here rather than mid-iteration
pub(crate) fn list(
    pool: &DbPool,
    table: &TableName,
    query: ListingQuery,
    prefixer: PathPrefixer,
) -> Result<DirectoryListing> {
    let first = {
        let conn = pool.get()?;
        query.fetch_page(&conn, table, None)?
    };

    let mut rows = PagedRows {
        pool: pool.clone(),
        table: table.clone(),
        query,
        prefixer,
        page: Vec::new().into_iter(),
        last_path: None,
        exhausted: false,
        done: false,
    };
    rows.load(first);

    Ok(DirectoryListing::new(rows))
}
