use querysheet_common::{Orientation, ResolvedRange};
use querysheet_io::SheetWriter;

use crate::error::EngineError;
use crate::matrix::ResultMatrix;
use crate::resolve::non_positive;

/// Destination `(row, col)` of result value `(i, j)`.
///
/// Only meaningful for a range that passed [`check_fit`]; coordinates past
/// the range's extents are not checked here.
pub fn target_cell(range: &ResolvedRange, i: usize, j: usize) -> (u32, u32) {
    let (i, j) = (i as u32, j as u32);
    match range.orientation {
        Orientation::Direct => (range.x1 + i, range.y1 + j),
        Orientation::Transposed => (range.x1 + j, range.y1 + i),
    }
}

/// Check that `range` spans exactly `matrix` in its recorded orientation.
pub fn check_fit(range: &ResolvedRange, matrix: &ResultMatrix) -> Result<(), EngineError> {
    if matrix.is_empty() {
        return Err(EngineError::EmptyResult);
    }
    let extent = |axis: &str, start: u32, end: u32| match end.checked_sub(start) {
        Some(len) if len > 0 => Ok(len),
        _ => Err(non_positive(axis, start, end)),
    };
    let width = extent("x", range.x1, range.x2)?;
    let height = extent("y", range.y1, range.y2)?;
    let (rows, columns) = (matrix.row_count(), matrix.column_count());
    let (w, h) = (width as usize, height as usize);
    let fits = match range.orientation {
        Orientation::Direct => w == rows && h == columns,
        Orientation::Transposed => w == columns && h == rows,
    };
    if !fits {
        return Err(EngineError::OrientationMismatch {
            width,
            height,
            rows,
            columns,
        });
    }
    Ok(())
}

/// Write `matrix` into `sheet` over `range`, row by row.
///
/// The range must match the matrix (see [`check_fit`]); nothing is written
/// otherwise. Stops at the first unsupported value; cells written before it
/// stay written. `NULL`s are skipped without touching the sheet. Returns the
/// number of cells written.
pub fn write_to_sheet<S: SheetWriter + ?Sized>(
    range: &ResolvedRange,
    matrix: &ResultMatrix,
    sheet: &mut S,
) -> Result<usize, EngineError> {
    check_fit(range, matrix)?;
    let mut written = 0;
    for (i, row) in matrix.rows().enumerate() {
        for (j, value) in row.iter().enumerate() {
            if value.is_null() {
                continue;
            }
            let (r, c) = target_cell(range, i, j);
            matrix
                .write(i, j, sheet.cell_mut(r, c))
                .map_err(|source| EngineError::UnsupportedValue {
                    row: i,
                    col: j,
                    source,
                })?;
            written += 1;
        }
    }
    Ok(written)
}
