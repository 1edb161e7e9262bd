//! Destination side of querysheet.
//!
//! The engine writes through three small traits: a [`WorkbookWriter`] hands
//! out sheets by name, a [`SheetWriter`] hands out cells by zero-based
//! `(row, col)`, and a [`CellWriter`] accepts one typed value. Backends:
//!
//! - [`MemoryWorkbook`]: plain maps, used by tests and dry runs.
//! - `UmyaWorkbook` (feature `umya`): `.xlsx` files via `umya-spreadsheet`.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{MemoryCell, MemorySheet, MemoryWorkbook};
#[cfg(feature = "umya")]
pub use backends::{DATETIME_FORMAT, MAX_EXACT_INT, UmyaWorkbook};
pub use error::IoError;
pub use traits::{CellWriter, SaveDestination, SheetWriter, WorkbookWriter};

// Re-export for convenience
pub use querysheet_common::CellValue;
