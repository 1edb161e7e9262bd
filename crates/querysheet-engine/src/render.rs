use querysheet_common::{PlacementRange, ResolvedRange};
use querysheet_io::SheetWriter;
use tracing::{debug, info_span};

use crate::driver::DriverRegistry;
use crate::error::EngineError;
use crate::resolve::resolve;
use crate::scan::QueryResult;
use crate::writer::write_to_sheet;

/// One query and where its result goes.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    pub driver: &'a str,
    pub connection: &'a str,
    pub sql: &'a str,
    pub range: PlacementRange,
}

/// What a successful render placed on the sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSummary {
    pub columns: Vec<String>,
    pub rows: usize,
    pub range: ResolvedRange,
    pub cells_written: usize,
}

impl RenderSummary {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Run `request` and write its result into `sheet`.
pub fn render_query<S: SheetWriter + ?Sized>(
    registry: &DriverRegistry,
    request: &RenderRequest<'_>,
    sheet: &mut S,
) -> Result<RenderSummary, EngineError> {
    let span = info_span!(
        "render_query",
        driver = request.driver,
        query = request.sql,
        sheet = sheet.name()
    );
    let _enter = span.enter();

    let result = registry.execute(request.driver, request.connection, request.sql)?;
    place_result(result, &request.range, sheet)
}

/// Resolve `range` against an already materialized result and write it.
pub fn place_result<S: SheetWriter + ?Sized>(
    result: QueryResult,
    range: &PlacementRange,
    sheet: &mut S,
) -> Result<RenderSummary, EngineError> {
    let resolved = resolve(range, &result.matrix)?;
    let cells_written = write_to_sheet(&resolved, &result.matrix, sheet)?;
    debug!(cells = cells_written, "wrote result");
    Ok(RenderSummary {
        rows: result.row_count(),
        columns: result.columns,
        range: resolved,
        cells_written,
    })
}
