use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocError {
    #[error("Invalid DOCX file")]
    InvalidDocument,

    #[error("file_too_large")]
    FileTooLarge,

    #[error("Failed to compile replacement pattern: {0}")]
    PatternError(String),

    #[error("Failed to write document: {0}")]
    WriteError(String),
}
