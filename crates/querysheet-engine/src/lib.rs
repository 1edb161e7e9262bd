//! Renders SQL query results into spreadsheet ranges.
//!
//! A query runs through a [`Driver`] picked from a [`DriverRegistry`], its rows
//! are scanned into a typed [`ResultMatrix`], the target [`PlacementRange`] is
//! resolved against the result's shape (possibly transposing it) and every
//! value is written into a [`SheetWriter`].
//!
//! ```no_run
//! use querysheet_engine::{DriverRegistry, RenderRequest, render_query};
//! use querysheet_engine::io::{UmyaWorkbook, WorkbookWriter};
//! use querysheet_engine::common::{Edge, PlacementRange};
//!
//! let registry = DriverRegistry::with_defaults();
//! let mut book = UmyaWorkbook::new();
//! let request = RenderRequest {
//!     driver: "sqlite",
//!     connection: "sqlite://sales.db",
//!     sql: "SELECT region, total FROM sales",
//!     range: PlacementRange::new(1, 0, Edge::Open, 2),
//! };
//! render_query(&registry, &request, book.sheet_mut("Summary")?)?;
//! book.save_to_path("report.xlsx".as_ref())?;
//! # Ok::<(), querysheet_engine::EngineError>(())
//! ```

pub mod driver;
pub mod error;
pub mod matrix;
pub mod render;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod writer;

pub use querysheet_common as common;
pub use querysheet_io as io;
pub use querysheet_spec as spec;

pub use driver::{Driver, DriverRegistry};
pub use error::EngineError;
pub use matrix::ResultMatrix;
pub use querysheet_common::{Edge, Orientation, PlacementRange, ResolvedRange, SqlValue};
pub use querysheet_io::SheetWriter;
pub use render::{RenderRequest, RenderSummary, place_result, render_query};
pub use report::{QueryOutcome, ReportProgress, ReportRunner, ReportSummary};
pub use resolve::resolve;
pub use scan::{QueryResult, RowCursor, scan_rows};
pub use writer::{check_fit, write_to_sheet};
