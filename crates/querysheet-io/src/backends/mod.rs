pub mod memory;

pub use memory::{MemoryCell, MemorySheet, MemoryWorkbook};

#[cfg(feature = "umya")]
pub mod umya;

#[cfg(feature = "umya")]
pub use umya::{DATETIME_FORMAT, MAX_EXACT_INT, UmyaWorkbook};
