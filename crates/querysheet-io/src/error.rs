use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("sheet `{sheet}` could not be created: {reason}")]
    SheetCreate { sheet: String, reason: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "umya")]
impl From<umya_spreadsheet::XlsxError> for IoError {
    fn from(err: umya_spreadsheet::XlsxError) -> Self {
        IoError::Backend(err.to_string())
    }
}
