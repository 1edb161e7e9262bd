use crate::error::IoError;
use crate::traits::{CellWriter, SaveDestination, SheetWriter, WorkbookWriter};
use chrono::NaiveDateTime;
use querysheet_common::CellValue;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryCell {
    pub value: Option<CellValue>,
}

impl MemoryCell {
    pub fn value(&self) -> Option<&CellValue> {
        self.value.as_ref()
    }
}

impl CellWriter for MemoryCell {
    fn set_int(&mut self, value: i64) {
        self.value = Some(CellValue::Int(value));
    }

    fn set_float(&mut self, value: f64) {
        self.value = Some(CellValue::Number(value));
    }

    fn set_bool(&mut self, value: bool) {
        self.value = Some(CellValue::Boolean(value));
    }

    fn set_text(&mut self, value: &str) {
        self.value = Some(CellValue::Text(value.to_string()));
    }

    fn set_datetime(&mut self, value: NaiveDateTime) {
        self.value = Some(CellValue::DateTime(value));
    }
}

/// Sparse in-memory sheet keyed by zero-based `(row, col)`.
#[derive(Clone, Debug, Default)]
pub struct MemorySheet {
    name: String,
    cells: BTreeMap<(u32, u32), MemoryCell>,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col)).and_then(MemoryCell::value)
    }

    /// Seed a cell, e.g. to check that a later write leaves it alone.
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.cell_mut(row, col).write_value(&value);
    }

    /// Cells that currently hold a value, in row-major order.
    pub fn values(&self) -> impl Iterator<Item = ((u32, u32), &CellValue)> {
        self.cells
            .iter()
            .filter_map(|(pos, cell)| cell.value().map(|v| (*pos, v)))
    }

    pub fn value_count(&self) -> usize {
        self.values().count()
    }

    /// `(rows, cols)` spanned by populated cells, counted from the origin.
    pub fn dimensions(&self) -> (u32, u32) {
        self.values().fold((0, 0), |(rows, cols), ((r, c), _)| {
            (rows.max(r + 1), cols.max(c + 1))
        })
    }
}

impl SheetWriter for MemorySheet {
    type Cell = MemoryCell;

    fn name(&self) -> &str {
        &self.name
    }

    fn cell_mut(&mut self, row: u32, col: u32) -> &mut MemoryCell {
        self.cells.entry((row, col)).or_default()
    }
}

/// Workbook of [`MemorySheet`]s in creation order.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

impl WorkbookWriter for MemoryWorkbook {
    type Sheet = MemorySheet;

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut MemorySheet, IoError> {
        if name.trim().is_empty() {
            return Err(IoError::SheetCreate {
                sheet: name.to_string(),
                reason: "sheet name is empty".to_string(),
            });
        }
        let idx = match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sheets.push(MemorySheet::new(name));
                self.sheets.len() - 1
            }
        };
        Ok(&mut self.sheets[idx])
    }

    fn save_to(&mut self, _dest: SaveDestination<'_>) -> Result<Option<Vec<u8>>, IoError> {
        Err(IoError::Unsupported(
            "memory workbooks have no file representation".to_string(),
        ))
    }
}
