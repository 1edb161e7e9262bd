use querysheet_common::{SqlValue, UnsupportedValueType};
use querysheet_io::CellWriter;

use crate::error::EngineError;

/// Rectangular, type-preserving query result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultMatrix {
    columns: usize,
    rows: Vec<Vec<SqlValue>>,
}

impl ResultMatrix {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Width is taken from the first row; every other row must match it.
    pub fn from_rows(rows: Vec<Vec<SqlValue>>) -> Result<Self, EngineError> {
        let mut matrix = Self::new(rows.first().map_or(0, Vec::len));
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    pub fn push_row(&mut self, row: Vec<SqlValue>) -> Result<(), EngineError> {
        if row.len() != self.columns {
            return Err(EngineError::RaggedRow {
                expected: self.columns,
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// No cells to place: zero rows or zero columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&SqlValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[SqlValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Write the value at `(row, col)` into `cell`.
    ///
    /// `NULL` writes nothing. Indices are not checked: callers pass positions
    /// inside the matrix.
    pub fn write<C: CellWriter + ?Sized>(
        &self,
        row: usize,
        col: usize,
        cell: &mut C,
    ) -> Result<(), UnsupportedValueType> {
        if let Some(value) = self.rows[row][col].to_cell_value()? {
            cell.write_value(&value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use querysheet_common::CellValue;
    use querysheet_io::MemoryCell;

    fn sample() -> ResultMatrix {
        ResultMatrix::from_rows(vec![
            vec![SqlValue::Int(1), SqlValue::Float(2.5), SqlValue::Boolean(true)],
            vec![
                SqlValue::Text("east".into()),
                SqlValue::Bytes(b"raw".to_vec()),
                SqlValue::Null,
            ],
        ])
        .unwrap()
    }

    #[test]
    fn reports_dimensions() {
        let m = sample();
        assert_eq!(m.row_count(), 2);
        assert_eq!(m.column_count(), 3);
        assert!(!m.is_empty());
        assert_eq!(m.get(1, 0), Some(&SqlValue::Text("east".into())));
        assert_eq!(m.get(2, 0), None);
        assert!(ResultMatrix::new(4).is_empty());
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = ResultMatrix::from_rows(vec![
            vec![SqlValue::Int(1), SqlValue::Int(2)],
            vec![SqlValue::Int(3)],
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::RaggedRow {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn writes_each_variant_with_its_type() {
        let m = sample();
        let expect = [
            (0, 0, CellValue::Int(1)),
            (0, 1, CellValue::Number(2.5)),
            (0, 2, CellValue::Boolean(true)),
            (1, 0, CellValue::Text("east".into())),
            (1, 1, CellValue::Text("raw".into())),
        ];
        for (i, j, want) in expect {
            let mut cell = MemoryCell::default();
            m.write(i, j, &mut cell).unwrap();
            assert_eq!(cell.value(), Some(&want), "cell ({i}, {j})");
        }
    }

    #[test]
    fn timestamp_becomes_datetime() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let m = ResultMatrix::from_rows(vec![vec![SqlValue::Timestamp(ts)]]).unwrap();
        let mut cell = MemoryCell::default();
        m.write(0, 0, &mut cell).unwrap();
        assert_eq!(cell.value(), Some(&CellValue::DateTime(ts)));
    }

    #[test]
    fn null_leaves_prior_value() {
        let m = sample();
        let mut cell = MemoryCell {
            value: Some(CellValue::Text("keep".into())),
        };
        m.write(1, 2, &mut cell).unwrap();
        assert_eq!(cell.value(), Some(&CellValue::Text("keep".into())));
    }

    #[test]
    fn unsupported_value_names_its_type() {
        let m = ResultMatrix::from_rows(vec![vec![SqlValue::unsupported("interval")]]).unwrap();
        let mut cell = MemoryCell::default();
        let err = m.write(0, 0, &mut cell).unwrap_err();
        assert_eq!(err.type_name(), "interval");
        assert_eq!(cell.value(), None);
    }
}
