//! Fixture builders shared by the querysheet test suites.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A file inside a temporary directory that lives as long as the fixture.
pub struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    fn in_new_dir(file_name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create fixture dir");
        let path = dir.path().join(file_name);
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path in the same temporary directory.
    pub fn sibling(&self, file_name: &str) -> PathBuf {
        self.path
            .parent()
            .map(|p| p.join(file_name))
            .unwrap_or_else(|| PathBuf::from(file_name))
    }

    /// `sqlite://` connection string for a database fixture.
    pub fn sqlite_url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

/// Write an `.xlsx` built by `f` (starting from umya's default `Sheet1`).
pub fn build_workbook(f: impl FnOnce(&mut umya_spreadsheet::Spreadsheet)) -> Fixture {
    let fixture = Fixture::in_new_dir("template.xlsx");
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    umya_spreadsheet::writer::xlsx::write(&book, fixture.path()).expect("write xlsx fixture");
    fixture
}

/// Create an SQLite database file and run `sql` against it.
pub fn sqlite_database(sql: &str) -> Fixture {
    let fixture = Fixture::in_new_dir("fixture.db");
    let conn = rusqlite::Connection::open(fixture.path()).expect("open sqlite fixture");
    conn.execute_batch(sql).expect("seed sqlite fixture");
    fixture
}

/// Sales table used across engine and CLI tests.
pub const SALES_SQL: &str = r#"
CREATE TABLE sales (
    id INTEGER PRIMARY KEY,
    region TEXT NOT NULL,
    total REAL NOT NULL,
    closed BOOLEAN NOT NULL,
    booked_at DATETIME,
    note BLOB
);
INSERT INTO sales (id, region, total, closed, booked_at, note) VALUES
    (1, 'north', 120.5, 1, '2024-01-05 09:30:00', X'6869'),
    (2, 'south', 80.0, 0, '2024-01-06 14:00:00', NULL),
    (3, 'east', 42.25, 1, NULL, X'6f6b');
"#;

/// [`sqlite_database`] seeded with [`SALES_SQL`].
pub fn sales_database() -> Fixture {
    sqlite_database(SALES_SQL)
}
