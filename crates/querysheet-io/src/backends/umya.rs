use crate::error::IoError;
use crate::traits::{CellWriter, SaveDestination, SheetWriter, WorkbookWriter};
use chrono::NaiveDateTime;
use querysheet_common::{CellValue, datetime_to_serial, serial_to_datetime};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use umya_spreadsheet::{Cell, CellRawValue, Spreadsheet, Worksheet, reader::xlsx};

/// Number format applied to cells that receive a date-time.
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Largest magnitude an xlsx number cell holds without rounding.
pub const MAX_EXACT_INT: i64 = 1 << 53;

impl CellWriter for Cell {
    /// Integers beyond [`MAX_EXACT_INT`] are stored as text so their digits
    /// survive.
    fn set_int(&mut self, value: i64) {
        if value.unsigned_abs() > MAX_EXACT_INT as u64 {
            self.set_value_string(value.to_string());
        } else {
            self.set_value_number(value as f64);
        }
    }

    fn set_float(&mut self, value: f64) {
        self.set_value_number(value);
    }

    fn set_bool(&mut self, value: bool) {
        self.set_value_bool(value);
    }

    fn set_text(&mut self, value: &str) {
        // set_value would sniff "12" into a number
        self.set_value_string(value);
    }

    fn set_datetime(&mut self, value: NaiveDateTime) {
        self.set_value_number(datetime_to_serial(&value));
        self.get_style_mut()
            .get_number_format_mut()
            .set_format_code(DATETIME_FORMAT);
    }
}

impl SheetWriter for Worksheet {
    type Cell = Cell;

    fn name(&self) -> &str {
        self.get_name()
    }

    fn cell_mut(&mut self, row: u32, col: u32) -> &mut Cell {
        // umya uses 1-based (col, row)
        self.get_cell_mut((col + 1, row + 1))
    }
}

/// `.xlsx` workbook held fully in memory by `umya-spreadsheet`.
pub struct UmyaWorkbook {
    book: Spreadsheet,
    original_path: Option<PathBuf>,
}

impl UmyaWorkbook {
    /// Empty workbook with umya's default `Sheet1`.
    pub fn new() -> Self {
        Self {
            book: umya_spreadsheet::new_file(),
            original_path: None,
        }
    }

    /// Open an existing template. Sheets are read eagerly so saving never
    /// hits an undeserialized sheet.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let book = xlsx::read(path.as_ref())?;
        Ok(Self {
            book,
            original_path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn original_path(&self) -> Option<&Path> {
        self.original_path.as_deref()
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }

    /// Save back to the file the workbook was opened from.
    pub fn save(&mut self) -> Result<(), IoError> {
        let path = self.original_path.clone().ok_or_else(|| {
            IoError::Unsupported("in-place save unavailable: no original path".to_string())
        })?;
        self.save_to_path(&path)
    }

    /// Read a cell back as a [`CellValue`], zero-based `(row, col)`.
    ///
    /// Numbers carrying [`DATETIME_FORMAT`] are decoded as date-times.
    pub fn read_value(&self, sheet: &str, row: u32, col: u32) -> Option<CellValue> {
        let ws = self.book.get_sheet_by_name(sheet)?;
        let cell = ws.get_cell((col + 1, row + 1))?;
        convert_cell(cell)
    }
}

impl Default for UmyaWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_cell(cell: &Cell) -> Option<CellValue> {
    let number = match cell.get_cell_value().get_raw_value() {
        CellRawValue::Numeric(n) => *n,
        CellRawValue::Bool(b) => return Some(CellValue::Boolean(*b)),
        CellRawValue::String(s) => return Some(CellValue::Text(s.to_string())),
        CellRawValue::RichText(rt) => return Some(CellValue::Text(rt.get_text().to_string())),
        CellRawValue::Lazy(s) => {
            // attempt parse
            let txt = s.as_ref();
            if let Ok(n) = txt.parse::<f64>() {
                n
            } else if txt.eq_ignore_ascii_case("TRUE") {
                return Some(CellValue::Boolean(true));
            } else if txt.eq_ignore_ascii_case("FALSE") {
                return Some(CellValue::Boolean(false));
            } else {
                return Some(CellValue::Text(txt.to_string()));
            }
        }
        CellRawValue::Error(_) | CellRawValue::Empty => return None,
    };
    let is_datetime = cell
        .get_style()
        .get_number_format()
        .is_some_and(|fmt| fmt.get_format_code() == DATETIME_FORMAT);
    if is_datetime {
        serial_to_datetime(number).map(CellValue::DateTime)
    } else {
        Some(CellValue::Number(number))
    }
}

impl WorkbookWriter for UmyaWorkbook {
    type Sheet = Worksheet;

    fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Worksheet, IoError> {
        if self.book.get_sheet_by_name(name).is_none() {
            self.book
                .new_sheet(name)
                .map_err(|reason| IoError::SheetCreate {
                    sheet: name.to_string(),
                    reason: reason.to_string(),
                })?;
        }
        self.book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| IoError::SheetCreate {
                sheet: name.to_string(),
                reason: "sheet missing after creation".to_string(),
            })
    }

    fn save_to(&mut self, dest: SaveDestination<'_>) -> Result<Option<Vec<u8>>, IoError> {
        match dest {
            SaveDestination::Path(path) => {
                umya_spreadsheet::writer::xlsx::write(&self.book, path)?;
                Ok(None)
            }
            SaveDestination::Bytes => {
                let mut buf = Cursor::new(Vec::new());
                umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buf)?;
                Ok(Some(buf.into_inner()))
            }
        }
    }
}
