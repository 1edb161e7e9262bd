use crate::error::IoError;
use chrono::NaiveDateTime;
use querysheet_common::CellValue;
use std::path::Path;

/// A single destination cell.
///
/// Setters overwrite whatever the cell held before. There is no "set null":
/// a SQL `NULL` leaves the cell untouched.
pub trait CellWriter {
    fn set_int(&mut self, value: i64);
    fn set_float(&mut self, value: f64);
    fn set_bool(&mut self, value: bool);
    fn set_text(&mut self, value: &str);
    fn set_datetime(&mut self, value: NaiveDateTime);

    fn write_value(&mut self, value: &CellValue) {
        match value {
            CellValue::Int(i) => self.set_int(*i),
            CellValue::Number(n) => self.set_float(*n),
            CellValue::Boolean(b) => self.set_bool(*b),
            CellValue::Text(s) => self.set_text(s),
            CellValue::DateTime(dt) => self.set_datetime(*dt),
        }
    }
}

/// A sheet addressed by zero-based `(row, col)`.
pub trait SheetWriter {
    type Cell: CellWriter;

    fn name(&self) -> &str;

    /// Cell at `(row, col)`, created on first access.
    fn cell_mut(&mut self, row: u32, col: u32) -> &mut Self::Cell;
}

pub enum SaveDestination<'a> {
    Path(&'a Path),
    Bytes,
}

pub trait WorkbookWriter {
    type Sheet: SheetWriter;

    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|n| n == name)
    }

    /// Sheet named `name`, appended to the workbook when missing.
    fn sheet_mut(&mut self, name: &str) -> Result<&mut Self::Sheet, IoError>;

    /// Persist the workbook. `SaveDestination::Bytes` returns the encoded file.
    fn save_to(&mut self, dest: SaveDestination<'_>) -> Result<Option<Vec<u8>>, IoError>;

    fn save_to_path(&mut self, path: &Path) -> Result<(), IoError> {
        self.save_to(SaveDestination::Path(path)).map(|_| ())
    }

    fn save_to_bytes(&mut self) -> Result<Vec<u8>, IoError> {
        self.save_to(SaveDestination::Bytes)?
            .ok_or_else(|| IoError::Backend("backend returned no bytes".to_string()))
    }
}
