//! Structured error types for xlcollate.

/// All errors that can occur while decoding, consolidating, or encoding workbooks.
#[derive(Debug, thiserror::Error)]
pub enum CollateError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Input bytes are structurally not a workbook (missing or malformed parts).
    #[error("Not a valid workbook: {0}")]
    Decode(String),

    /// Serialization of a finished workbook failed.
    #[error("Workbook serialization failed: {0}")]
    Encode(String),

    /// Rejected layout budget (non-positive or non-finite).
    #[error("Invalid layout configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollateError>;
