//! Dynamic-schema document stores.
//!
//! The model decides the column set: every key it emits becomes a TEXT column,
//! created on first sight. Two stores share the mechanism:
//!
//! - **working store** (`documents`): review staging area. Dropped and
//!   recreated on every insert so the review table only ever holds the
//!   latest upload's batch.
//! - **verified store** (`verified_documents`): durable. Never dropped;
//!   confirmed rows are appended.

use std::collections::BTreeSet;

use rusqlite::{Connection, ToSql};
use serde_json::{Map, Value};

use super::DatabaseError;

/// A record ready for storage: every value already a string.
pub type FlatRecord = std::collections::BTreeMap<String, String>;

/// The auto-generated identifier column. Reserved — model-emitted keys that
/// collide with it are skipped rather than allowed to clobber the rowid.
const ID_COLUMN: &str = "id";

pub struct DocumentStore {
    conn: Connection,
    table: &'static str,
    /// Drop the table before each insert, so it holds only the latest batch.
    reset_on_insert: bool,
}

impl DocumentStore {
    /// Working store: review staging, replaced on every insert.
    pub fn working(conn: Connection) -> Self {
        Self {
            conn,
            table: "documents",
            reset_on_insert: true,
        }
    }

    /// Verified store: append-only, never reset.
    pub fn verified(conn: Connection) -> Self {
        Self {
            conn,
            table: "verified_documents",
            reset_on_insert: false,
        }
    }

    /// Insert a batch of flat records, creating the table and any missing
    /// columns first. Returns the number of rows inserted.
    ///
    /// An empty batch is a no-op: it never triggers a reset, so a batch
    /// upload whose files all failed leaves the review table alone.
    pub fn insert_records(&mut self, records: &[FlatRecord]) -> Result<usize, DatabaseError> {
        if records.is_empty() {
            return Ok(0);
        }

        if self.reset_on_insert {
            tracing::info!(table = self.table, "Replacing table contents");
            self.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {};", self.table))?;
        }

        // Union of keys across the batch defines the create/extend set.
        let mut all_keys: BTreeSet<&str> = BTreeSet::new();
        for record in records {
            all_keys.extend(record.keys().map(String::as_str));
        }
        all_keys.remove(ID_COLUMN);

        self.ensure_table()?;
        self.ensure_columns(&all_keys)?;

        let mut inserted = 0;
        for record in records {
            let keys: Vec<&str> = record
                .keys()
                .map(String::as_str)
                .filter(|k| *k != ID_COLUMN)
                .collect();
            if keys.is_empty() {
                continue;
            }

            let columns = keys
                .iter()
                .map(|k| quote_ident(k))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=keys.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let params: Vec<&dyn ToSql> = keys
                .iter()
                .map(|k| &record[*k] as &dyn ToSql)
                .collect();

            self.conn.execute(
                &format!(
                    "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                    self.table
                ),
                params.as_slice(),
            )?;
            inserted += 1;
        }

        tracing::debug!(table = self.table, rows = inserted, "Inserted records");
        Ok(inserted)
    }

    /// Every row as an ordered JSON object (id plus the text columns).
    pub fn fetch_all(&self) -> Result<Vec<Map<String, Value>>, DatabaseError> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY {ID_COLUMN}", self.table))?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = if name == ID_COLUMN {
                    Value::from(row.get::<_, i64>(i)?)
                } else {
                    match row.get::<_, Option<String>>(i)? {
                        Some(s) => Value::String(s),
                        None => Value::Null,
                    }
                };
                obj.insert(name.clone(), value);
            }
            out.push(obj);
        }
        Ok(out)
    }

    fn ensure_table(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT);",
            self.table
        ))?;
        Ok(())
    }

    fn ensure_columns(&self, required: &BTreeSet<&str>) -> Result<(), DatabaseError> {
        let existing = self.existing_columns()?;
        for key in required {
            if existing.contains(*key) {
                continue;
            }
            validate_column_name(key)?;
            self.conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} TEXT;",
                self.table,
                quote_ident(key)
            ))?;
        }
        Ok(())
    }

    fn existing_columns(&self) -> Result<BTreeSet<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", self.table))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(names)
    }

    fn table_exists(&self) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1",
            [self.table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Quote a column identifier for SQL, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column names come from model output. Quoting makes them safe for SQL, but
/// control characters and empty names are garbage, not data — reject them.
fn validate_column_name(name: &str) -> Result<(), DatabaseError> {
    if name.trim().is_empty() || name.chars().any(|c| c.is_control()) {
        return Err(DatabaseError::InvalidColumn(name.to_string()));
    }
    Ok(())
}
