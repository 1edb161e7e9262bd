use querysheet_common::SqlValue;
use tracing::debug;

use crate::error::{BoxError, EngineError};
use crate::matrix::ResultMatrix;

/// Forward-only cursor over a driver's result set.
pub trait RowCursor {
    type Error: Into<BoxError>;

    /// Column names, read once before the first row.
    fn column_names(&mut self) -> Result<Vec<String>, Self::Error>;

    /// Decode the next row into `slots`, one per column. `Ok(false)` at the end.
    fn next_row(&mut self, slots: &mut [SqlValue]) -> Result<bool, Self::Error>;
}

/// Column names plus the materialized rows of one query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub matrix: ResultMatrix,
}

impl QueryResult {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.matrix.row_count()
    }
}

/// Drain `cursor` into a [`QueryResult`], keeping rows in cursor order.
pub fn scan_rows<C: RowCursor>(cursor: &mut C) -> Result<QueryResult, EngineError> {
    let columns = cursor.column_names().map_err(|err| {
        let err: BoxError = err.into();
        EngineError::Query(err.to_string())
    })?;
    let width = columns.len();
    let mut matrix = ResultMatrix::new(width);

    loop {
        let mut slots = vec![SqlValue::Null; width];
        match cursor.next_row(&mut slots) {
            Ok(true) => matrix.push_row(slots)?,
            Ok(false) => break,
            Err(err) => {
                return Err(EngineError::Scan {
                    columns: width,
                    source: err.into(),
                });
            }
        }
    }

    debug!(rows = matrix.row_count(), columns = width, "scanned result");
    Ok(QueryResult { columns, matrix })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    pub struct CursorFailure(pub String);

    impl fmt::Display for CursorFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl std::error::Error for CursorFailure {}

    /// In-memory cursor that can fail on a chosen row.
    pub struct VecCursor {
        pub columns: Vec<String>,
        pub rows: std::vec::IntoIter<Vec<SqlValue>>,
        pub fail_at: Option<usize>,
        pub served: usize,
    }

    impl VecCursor {
        pub fn new(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
            Self {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: rows.into_iter(),
                fail_at: None,
                served: 0,
            }
        }
    }

    impl RowCursor for VecCursor {
        type Error = CursorFailure;

        fn column_names(&mut self) -> Result<Vec<String>, CursorFailure> {
            Ok(self.columns.clone())
        }

        fn next_row(&mut self, slots: &mut [SqlValue]) -> Result<bool, CursorFailure> {
            if self.fail_at == Some(self.served) {
                return Err(CursorFailure(format!("bad value in row {}", self.served)));
            }
            let Some(row) = self.rows.next() else {
                return Ok(false);
            };
            for (slot, value) in slots.iter_mut().zip(row) {
                *slot = value;
            }
            self.served += 1;
            Ok(true)
        }
    }

    #[test]
    fn keeps_cursor_order_and_width() {
        let mut cursor = VecCursor::new(
            &["id", "name"],
            vec![
                vec![SqlValue::Int(2), "b".into()],
                vec![SqlValue::Int(1), SqlValue::Null],
            ],
        );
        let result = scan_rows(&mut cursor).unwrap();
        assert_eq!(result.column_count(), 2);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.matrix.get(0, 0), Some(&SqlValue::Int(2)));
        assert_eq!(result.matrix.get(1, 1), Some(&SqlValue::Null));
    }

    #[test]
    fn empty_result_keeps_columns() {
        let mut cursor = VecCursor::new(&["a", "b", "c"], vec![]);
        let result = scan_rows(&mut cursor).unwrap();
        assert_eq!(result.column_count(), 3);
        assert!(result.matrix.is_empty());
    }

    #[test]
    fn scan_failure_reports_width_without_rows() {
        let mut cursor = VecCursor::new(
            &["a", "b"],
            vec![
                vec![SqlValue::Int(1), SqlValue::Int(2)],
                vec![SqlValue::Int(3), SqlValue::Int(4)],
            ],
        );
        cursor.fail_at = Some(1);
        match scan_rows(&mut cursor) {
            Err(EngineError::Scan { columns, source }) => {
                assert_eq!(columns, 2);
                assert_eq!(source.to_string(), "bad value in row 1");
            }
            other => panic!("expected scan error, got {other:?}"),
        }
    }
}
