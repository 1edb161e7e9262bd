//! SQLite adapter backed by `rusqlite`.
//!
//! SQLite stores values with a handful of storage classes, so the declared
//! column type decides whether an integer is a boolean and whether text is a
//! timestamp.

use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use querysheet_common::SqlValue;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Rows};

use super::Driver;
use crate::error::EngineError;
use crate::scan::{QueryResult, RowCursor, scan_rows};

const BUSY_TIMEOUT_MS: u64 = 100;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sqlite3"]
    }

    fn execute(&self, connection: &str, sql: &str) -> Result<QueryResult, EngineError> {
        let conn = open(parse_target(connection)?)?;
        let mut stmt = conn.prepare(sql).map_err(EngineError::query)?;
        let columns: Vec<(String, DeclaredKind)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), DeclaredKind::from_decl(c.decl_type())))
            .collect();
        let rows = stmt.query([]).map_err(EngineError::query)?;
        let mut cursor = SqliteCursor { columns, rows };
        scan_rows(&mut cursor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqliteTarget<'a> {
    Memory,
    File(&'a str),
}

/// Accepts `sqlite://path`, `sqlite:path`, `sqlite::memory:`, `sqlite://memory`,
/// `:memory:` or a bare path.
pub fn parse_target(connection: &str) -> Result<SqliteTarget<'_>, EngineError> {
    let trimmed = connection.trim();
    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    match rest {
        "" => Err(EngineError::Connection(
            "sqlite connection string names no database".to_string(),
        )),
        ":memory:" | "memory" => Ok(SqliteTarget::Memory),
        path => Ok(SqliteTarget::File(path)),
    }
}

// Files are opened read-write without CREATE so a mistyped path fails.
fn open(target: SqliteTarget<'_>) -> Result<Connection, EngineError> {
    let conn = match target {
        SqliteTarget::Memory => Connection::open_in_memory(),
        SqliteTarget::File(path) => Connection::open_with_flags(
            Path::new(path),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        ),
    }
    .map_err(EngineError::connection)?;
    conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
        .map_err(EngineError::connection)?;
    Ok(conn)
}

/// What a column's declared type asks for beyond the storage class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclaredKind {
    Plain,
    Boolean,
    Timestamp,
}

impl DeclaredKind {
    pub fn from_decl(decl: Option<&str>) -> Self {
        let Some(decl) = decl else {
            return DeclaredKind::Plain;
        };
        let decl = decl.trim().to_ascii_uppercase();
        if decl.starts_with("BOOL") {
            DeclaredKind::Boolean
        } else if decl.starts_with("DATE") || decl.starts_with("TIMESTAMP") {
            DeclaredKind::Timestamp
        } else {
            DeclaredKind::Plain
        }
    }
}

struct SqliteCursor<'stmt> {
    columns: Vec<(String, DeclaredKind)>,
    rows: Rows<'stmt>,
}

impl RowCursor for SqliteCursor<'_> {
    type Error = rusqlite::Error;

    fn column_names(&mut self) -> Result<Vec<String>, rusqlite::Error> {
        Ok(self.columns.iter().map(|(name, _)| name.clone()).collect())
    }

    fn next_row(&mut self, slots: &mut [SqlValue]) -> Result<bool, rusqlite::Error> {
        let Some(row) = self.rows.next()? else {
            return Ok(false);
        };
        for (idx, slot) in slots.iter_mut().enumerate() {
            let kind = self
                .columns
                .get(idx)
                .map_or(DeclaredKind::Plain, |(_, kind)| *kind);
            *slot = convert(row.get_ref(idx)?, kind);
        }
        Ok(true)
    }
}

pub fn convert(value: ValueRef<'_>, kind: DeclaredKind) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) if kind == DeclaredKind::Boolean => SqlValue::Boolean(i != 0),
        ValueRef::Integer(i) => SqlValue::Int(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            match kind {
                DeclaredKind::Timestamp => parse_timestamp(&text)
                    .map(SqlValue::Timestamp)
                    .unwrap_or_else(|| SqlValue::Text(text.into_owned())),
                _ => SqlValue::Text(text.into_owned()),
            }
        }
        ValueRef::Blob(bytes) => SqlValue::Bytes(bytes.to_vec()),
    }
}

/// Parse SQLite's textual date-time forms. A bare date is midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
