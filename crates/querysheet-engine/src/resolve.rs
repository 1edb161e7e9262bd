//! Placement-range resolution.
//!
//! Resolution is two pure steps: extend an open far edge by the result's row
//! count, then pick the orientation whose extents match the result.
//!
//! | extents (`width` x `height`) | orientation |
//! |---|---|
//! | `rows` x `columns`           | direct      |
//! | `columns` x `rows`           | transposed  |
//! | anything else                | error       |
//!
//! Direct wins when both match (square results).

use querysheet_common::{Edge, Orientation, PlacementRange, ResolvedRange};
use tracing::debug;

use crate::error::EngineError;
use crate::matrix::ResultMatrix;

/// Concrete `(x2, y2)` for `range`, extending an open edge by `rows`.
pub fn extend_open_edge(range: &PlacementRange, rows: usize) -> Result<(u32, u32), EngineError> {
    let extend = |anchor: u32, axis: &str| {
        u32::try_from(rows)
            .ok()
            .and_then(|rows| anchor.checked_add(rows))
            .ok_or_else(|| {
                EngineError::InvalidRange(format!(
                    "{axis} = {anchor} + {rows} does not fit a coordinate"
                ))
            })
    };
    match (range.x2, range.y2) {
        (Edge::At(x2), Edge::At(y2)) => Ok((x2, y2)),
        (Edge::Open, Edge::At(y2)) => Ok((extend(range.x1, "x2")?, y2)),
        (Edge::At(x2), Edge::Open) => Ok((x2, extend(range.y1, "y2")?)),
        (Edge::Open, Edge::Open) => Err(EngineError::InvalidRange(
            "x2 and y2 are both open".to_string(),
        )),
    }
}

/// Orientation for a `width` x `height` rectangle holding `rows` x `columns`.
pub fn orientation(width: u32, height: u32, rows: usize, columns: usize) -> Option<Orientation> {
    let (w, h) = (width as usize, height as usize);
    if w == rows && h == columns {
        Some(Orientation::Direct)
    } else if w == columns && h == rows {
        Some(Orientation::Transposed)
    } else {
        None
    }
}

/// Resolve `range` against a non-empty `matrix`.
pub fn resolve(range: &PlacementRange, matrix: &ResultMatrix) -> Result<ResolvedRange, EngineError> {
    if matrix.is_empty() {
        return Err(EngineError::EmptyResult);
    }
    let (rows, columns) = (matrix.row_count(), matrix.column_count());
    let (x2, y2) = extend_open_edge(range, rows)?;

    let width = x2
        .checked_sub(range.x1)
        .filter(|w| *w > 0)
        .ok_or_else(|| non_positive("x", range.x1, x2))?;
    let height = y2
        .checked_sub(range.y1)
        .filter(|h| *h > 0)
        .ok_or_else(|| non_positive("y", range.y1, y2))?;

    let orientation =
        orientation(width, height, rows, columns).ok_or(EngineError::OrientationMismatch {
            width,
            height,
            rows,
            columns,
        })?;

    let resolved = ResolvedRange {
        x1: range.x1,
        x2,
        y1: range.y1,
        y2,
        orientation,
    };
    debug!(range = %range, resolved = %resolved, "resolved placement range");
    Ok(resolved)
}

pub(crate) fn non_positive(axis: &str, start: u32, end: u32) -> EngineError {
    EngineError::InvalidRange(format!(
        "non-positive extent: {axis}2 ({end}) must be greater than {axis}1 ({start})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use querysheet_common::SqlValue;

    fn two_by_three() -> ResultMatrix {
        ResultMatrix::from_rows(vec![
            vec![1.into(), 2.into(), 3.into()],
            vec![4.into(), 5.into(), 6.into()],
        ])
        .unwrap()
    }

    #[test]
    fn matching_rows_by_columns_is_direct() {
        let r = resolve(&PlacementRange::fixed(0, 0, 2, 3), &two_by_three()).unwrap();
        assert_eq!(r.orientation, Orientation::Direct);
        assert_eq!((r.x1, r.x2, r.y1, r.y2), (0, 2, 0, 3));
    }

    #[test]
    fn swapped_extents_are_transposed() {
        let r = resolve(&PlacementRange::fixed(0, 0, 3, 2), &two_by_three()).unwrap();
        assert_eq!(r.orientation, Orientation::Transposed);
    }

    #[test]
    fn open_x2_extends_by_row_count() {
        let r = resolve(&PlacementRange::new(0, 0, Edge::Open, 3), &two_by_three()).unwrap();
        assert_eq!(r.x2, 2);
        assert_eq!(r.orientation, Orientation::Direct);
    }

    #[test]
    fn open_y2_extends_by_row_count() {
        let r = resolve(&PlacementRange::new(4, 1, 7, Edge::Open), &two_by_three()).unwrap();
        assert_eq!(r.y2, 3);
        assert_eq!(r.orientation, Orientation::Transposed);
    }

    #[test]
    fn open_edge_equals_concrete_edge() {
        let m = two_by_three();
        for (open, concrete) in [
            (PlacementRange::new(3, 5, Edge::Open, 8), PlacementRange::fixed(3, 5, 5, 8)),
            (PlacementRange::new(3, 5, 6, Edge::Open), PlacementRange::fixed(3, 5, 6, 7)),
        ] {
            assert_eq!(resolve(&open, &m).unwrap(), resolve(&concrete, &m).unwrap());
        }
    }

    #[test]
    fn square_results_prefer_direct() {
        let m = ResultMatrix::from_rows(vec![vec![1.into(), 2.into()], vec![3.into(), 4.into()]])
            .unwrap();
        let r = resolve(&PlacementRange::fixed(0, 0, 2, 2), &m).unwrap();
        assert_eq!(r.orientation, Orientation::Direct);
    }

    #[test]
    fn mismatch_reports_extents() {
        let err = resolve(&PlacementRange::fixed(0, 0, 4, 4), &two_by_three()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::OrientationMismatch {
                width: 4,
                height: 4,
                rows: 2,
                columns: 3
            }
        ));
        assert_eq!(
            err.to_string(),
            "range is 4x4 but a 2x3 result needs 2x3 or 3x2"
        );
    }

    #[test]
    fn invalid_descriptors() {
        let m = two_by_three();
        assert!(matches!(
            resolve(&PlacementRange::new(0, 0, Edge::Open, Edge::Open), &m),
            Err(EngineError::InvalidRange(_))
        ));
        assert!(matches!(
            resolve(&PlacementRange::fixed(3, 0, 1, 3), &m),
            Err(EngineError::InvalidRange(_))
        ));
        assert!(matches!(
            resolve(&PlacementRange::fixed(0, 2, 2, 2), &m),
            Err(EngineError::InvalidRange(_))
        ));
        assert!(matches!(
            resolve(&PlacementRange::new(u32::MAX, 0, Edge::Open, 3), &m),
            Err(EngineError::InvalidRange(_))
        ));
    }

    #[test]
    fn empty_results_are_rejected() {
        assert!(matches!(
            resolve(&PlacementRange::fixed(0, 0, 1, 1), &ResultMatrix::new(3)),
            Err(EngineError::EmptyResult)
        ));
        let no_columns = ResultMatrix::from_rows(vec![Vec::<SqlValue>::new()]).unwrap();
        assert!(matches!(
            resolve(&PlacementRange::fixed(0, 0, 1, 1), &no_columns),
            Err(EngineError::EmptyResult)
        ));
    }
}
