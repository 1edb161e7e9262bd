use querysheet_io::WorkbookWriter;
use querysheet_spec::{QuerySpec, ReportManifest};
use tracing::{info, info_span, warn};

use crate::driver::DriverRegistry;
use crate::error::EngineError;
use crate::render::{RenderRequest, RenderSummary, render_query};

/// Progress after each query, then once more at 100% when the report is done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub message: String,
}

impl ReportProgress {
    fn new(completed: usize, total: usize, message: impl Into<String>) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (completed * 100 / total).min(100) as u8
        };
        Self {
            completed,
            total,
            percent,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct QueryOutcome {
    pub query: String,
    pub sheet: String,
    pub result: Result<RenderSummary, EngineError>,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub struct ReportSummary {
    pub report: String,
    pub outcomes: Vec<QueryOutcome>,
}

impl ReportSummary {
    /// True when every query rendered.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(QueryOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &QueryOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn cells_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|s| s.cells_written)
            .sum()
    }
}

type ProgressFn<'a> = Box<dyn FnMut(&ReportProgress) + 'a>;

/// Renders every query of a manifest into one workbook.
///
/// A failing query is recorded in its [`QueryOutcome`] and the remaining
/// queries still run.
pub struct ReportRunner<'a> {
    registry: &'a DriverRegistry,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> ReportRunner<'a> {
    pub fn new(registry: &'a DriverRegistry) -> Self {
        Self {
            registry,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: impl FnMut(&ReportProgress) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Validate `manifest`, then render its queries in order into `workbook`.
    ///
    /// Only an invalid manifest fails the whole run.
    pub fn run<W: WorkbookWriter>(
        &mut self,
        manifest: &ReportManifest,
        workbook: &mut W,
    ) -> Result<ReportSummary, EngineError> {
        manifest.validate()?;
        let span = info_span!("report", report = %manifest.report.id);
        let _enter = span.enter();

        let total = manifest.queries.len();
        let mut outcomes = Vec::with_capacity(total);
        for (idx, query) in manifest.queries.iter().enumerate() {
            let result = self.render_one(manifest, query, workbook);
            let message = match &result {
                Ok(summary) => {
                    info!(
                        query = %query.id,
                        cells = summary.cells_written,
                        range = %summary.range,
                        "query rendered"
                    );
                    format!("query `{}` rendered", query.id)
                }
                Err(err) => {
                    warn!(query = %query.id, error = %err, "query failed; continuing");
                    format!("query `{}` failed: {err}", query.id)
                }
            };
            outcomes.push(QueryOutcome {
                query: query.id.clone(),
                sheet: query.sheet.clone(),
                result,
            });
            self.report(ReportProgress::new(idx + 1, total, message));
        }

        self.report(ReportProgress::new(total, total, "report generated"));
        Ok(ReportSummary {
            report: manifest.report.id.clone(),
            outcomes,
        })
    }

    fn render_one<W: WorkbookWriter>(
        &self,
        manifest: &ReportManifest,
        query: &QuerySpec,
        workbook: &mut W,
    ) -> Result<RenderSummary, EngineError> {
        let connection = manifest.connection(&query.connection).ok_or_else(|| {
            EngineError::Connection(format!("unknown connection `{}`", query.connection))
        })?;
        let span = info_span!("query", query = %query.id, driver = %connection.driver);
        let _enter = span.enter();

        let sheet = workbook.sheet_mut(&query.sheet)?;
        let request = RenderRequest {
            driver: &connection.driver,
            connection: &connection.connection_string,
            sql: &query.sql,
            range: query.range,
        };
        render_query(self.registry, &request, sheet)
    }

    fn report(&mut self, progress: ReportProgress) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&progress);
        }
    }
}
