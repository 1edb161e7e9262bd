use querysheet_common::UnsupportedValueType;
use querysheet_io::IoError;
use querysheet_spec::ValidationError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown driver `{0}`")]
    UnknownDriver(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    /// A row failed to decode. No rows are kept.
    #[error("scan failed ({columns} column(s)): {source}")]
    Scan { columns: usize, source: BoxError },

    #[error("row has {found} value(s), expected {expected}")]
    RaggedRow { expected: usize, found: usize },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("empty result: nothing to place")]
    EmptyResult,

    #[error(
        "range is {width}x{height} but a {rows}x{columns} result needs {rows}x{columns} or {columns}x{rows}"
    )]
    OrientationMismatch {
        width: u32,
        height: u32,
        rows: usize,
        columns: usize,
    },

    /// Raised while writing; cells written before it stay written.
    #[error("value at result row {row}, column {col}: {source}")]
    UnsupportedValue {
        row: usize,
        col: usize,
        source: UnsupportedValueType,
    },

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Manifest(#[from] ValidationError),
}

impl EngineError {
    pub(crate) fn connection(err: impl std::fmt::Display) -> Self {
        EngineError::Connection(err.to_string())
    }

    pub(crate) fn query(err: impl std::fmt::Display) -> Self {
        EngineError::Query(err.to_string())
    }
}
